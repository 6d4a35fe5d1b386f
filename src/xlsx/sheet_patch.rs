use crate::common::errors::AppError;
use crate::xlsx::cell_ref::{lenient_column_index, CellRef};
use crate::xlsx::change_set::{ChangeRequest, Issue};
use crate::xlsx::shared_strings::SharedStrings;
use xmltree::{Element, EmitterConfig, XMLNode};

#[derive(Debug)]
pub struct PatchOutcome {
    pub xml: Vec<u8>,
    pub applied: usize,
    pub issues: Vec<Issue>,
}

// How a cell stores its value, taken from the "t" attribute. Everything that
// is not an inline or shared string reads back as the raw value text.
enum CellKind {
    InlineStr,
    SharedStr,
    Other,
}

impl CellKind {
    fn of(cell: &Element) -> Self {
        match SheetPatch::attr_by_local_name(cell, "t") {
            Some("inlineStr") => Self::InlineStr,
            Some("s") => Self::SharedStr,
            _ => Self::Other,
        }
    }
}

pub struct SheetPatch;

impl SheetPatch {
    // Applies one worksheet's grouped changes to its stored markup. Per-change
    // failures are collected as issues; only structural problems error out.
    pub fn apply(
        sheet_xml: &[u8],
        shared: &SharedStrings,
        changes: &[ChangeRequest],
    ) -> Result<PatchOutcome, AppError> {
        let mut root = Element::parse(sheet_xml)?;
        let sheet_data = Self::child_mut_by_local_name(&mut root, "sheetData").ok_or_else(
            || AppError::InvalidWorkbookFormat("missing sheetData element".to_string()),
        )?;

        let mut applied = 0usize;
        let mut issues = Vec::new();

        for change in changes {
            let address = change.source_address.trim();
            let cell_ref = match CellRef::parse(address) {
                Ok(cell_ref) => cell_ref,
                Err(err) => {
                    issues.push(Issue::for_change(change, address, err.to_string()));
                    continue;
                }
            };
            let canonical = cell_ref.to_a1();

            // Lookup only: the row/cell must not be created before the current
            // value has passed validation.
            let current_value = Self::current_cell_text(sheet_data, &cell_ref, &canonical, shared);

            let current = current_value.trim();
            if current != change.before_name.trim() && current != change.after_name.trim() {
                issues.push(Issue::for_change(
                    change,
                    address,
                    format!(
                        "Cell value mismatch. expected=\"{}\" actual=\"{}\"",
                        change.before_name, current_value
                    ),
                ));
                continue;
            }

            let row_el = Self::ensure_row_mut(sheet_data, cell_ref.row())?;
            let cell_el = Self::ensure_cell_mut(row_el, &cell_ref)?;
            Self::write_inline_string(cell_el, &change.after_name);
            applied += 1;
        }

        let mut xml = Vec::new();
        root.write_with_config(
            &mut xml,
            EmitterConfig::new()
                .perform_indent(false)
                .write_document_declaration(true),
        )?;
        Ok(PatchOutcome {
            xml,
            applied,
            issues,
        })
    }

    fn current_cell_text(
        sheet_data: &Element,
        cell_ref: &CellRef,
        canonical: &str,
        shared: &SharedStrings,
    ) -> String {
        let Some(row_el) = Self::find_row_index(sheet_data, cell_ref.row())
            .and_then(|idx| sheet_data.children[idx].as_element())
        else {
            return String::new();
        };
        let Some(cell_el) = Self::find_cell_index(row_el, canonical)
            .and_then(|idx| row_el.children[idx].as_element())
        else {
            return String::new();
        };
        Self::extract_cell_text(cell_el, shared)
    }

    fn extract_cell_text(cell: &Element, shared: &SharedStrings) -> String {
        match CellKind::of(cell) {
            CellKind::InlineStr => {
                let mut out = String::new();
                Self::collect_text_runs(cell, &mut out);
                out
            }
            CellKind::SharedStr => match Self::value_text(cell) {
                Some(raw) => shared.resolve_index(&raw),
                None => String::new(),
            },
            CellKind::Other => Self::value_text(cell).unwrap_or_default(),
        }
    }

    // Concatenates every "t" descendant in document order; inline strings may
    // be split into multiple formatting runs.
    fn collect_text_runs(element: &Element, out: &mut String) {
        for child in &element.children {
            if let XMLNode::Element(e) = child {
                if Self::is_local_name(&e.name, "t") {
                    if let Some(text) = e.get_text() {
                        out.push_str(&text);
                    }
                } else {
                    Self::collect_text_runs(e, out);
                }
            }
        }
    }

    fn value_text(cell: &Element) -> Option<String> {
        for child in &cell.children {
            if let XMLNode::Element(e) = child {
                if Self::is_local_name(&e.name, "v") {
                    return Some(e.get_text().map(|t| t.into_owned()).unwrap_or_default());
                }
            }
        }
        None
    }

    // Destructive rewrite: the cell becomes an inline string no matter what it
    // held before. Non-value attributes (address, style) survive.
    fn write_inline_string(cell: &mut Element, value: &str) {
        cell.children.clear();
        cell.attributes
            .insert("t".to_string(), "inlineStr".to_string());

        let mut inline = Self::make_child_element(cell, "is");
        let mut text = Self::make_child_element(cell, "t");
        if value.starts_with(' ') || value.ends_with(' ') {
            text.attributes
                .insert("xml:space".to_string(), "preserve".to_string());
        }
        text.children.push(XMLNode::Text(value.to_string()));
        inline.children.push(XMLNode::Element(text));
        cell.children.push(XMLNode::Element(inline));
    }

    fn ensure_row_mut(sheet_data: &mut Element, row: u64) -> Result<&mut Element, AppError> {
        let idx = match Self::find_row_index(sheet_data, row) {
            Some(idx) => idx,
            None => Self::insert_row_sorted(sheet_data, row),
        };
        match sheet_data.children.get_mut(idx) {
            Some(XMLNode::Element(el)) => Ok(el),
            _ => Err(AppError::XmlParseError(
                "row node is not an element".to_string(),
            )),
        }
    }

    fn ensure_cell_mut<'a>(
        row_el: &'a mut Element,
        cell_ref: &CellRef,
    ) -> Result<&'a mut Element, AppError> {
        let canonical = cell_ref.to_a1();
        let idx = match Self::find_cell_index(row_el, &canonical) {
            Some(idx) => idx,
            None => Self::insert_cell_sorted(row_el, cell_ref),
        };
        match row_el.children.get_mut(idx) {
            Some(XMLNode::Element(el)) => Ok(el),
            _ => Err(AppError::XmlParseError(
                "cell node is not an element".to_string(),
            )),
        }
    }

    fn find_row_index(sheet_data: &Element, row: u64) -> Option<usize> {
        let target = row.to_string();
        sheet_data.children.iter().position(|node| {
            matches!(
                node,
                XMLNode::Element(e) if Self::is_local_name(&e.name, "row")
                    && Self::attr_by_local_name(e, "r") == Some(target.as_str())
            )
        })
    }

    // New rows keep sheetData sorted: the row lands immediately before the
    // first sibling with a greater number, or after the last row otherwise.
    fn insert_row_sorted(sheet_data: &mut Element, row: u64) -> usize {
        let mut new_row = Self::make_child_element(sheet_data, "row");
        new_row.attributes.insert("r".to_string(), row.to_string());

        let mut insert_at = None;
        let mut after_last_row = None;
        for (idx, node) in sheet_data.children.iter().enumerate() {
            let XMLNode::Element(e) = node else { continue };
            if !Self::is_local_name(&e.name, "row") {
                continue;
            }
            let existing: u64 = Self::attr_by_local_name(e, "r")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            if existing > row {
                insert_at = Some(idx);
                break;
            }
            after_last_row = Some(idx + 1);
        }

        let position =
            insert_at.unwrap_or_else(|| after_last_row.unwrap_or(sheet_data.children.len()));
        sheet_data
            .children
            .insert(position, XMLNode::Element(new_row));
        position
    }

    fn find_cell_index(row_el: &Element, canonical: &str) -> Option<usize> {
        row_el.children.iter().position(|node| {
            matches!(
                node,
                XMLNode::Element(e) if Self::is_local_name(&e.name, "c")
                    && Self::attr_by_local_name(e, "r") == Some(canonical)
            )
        })
    }

    // Same sorted-insert contract as rows, compared by column index. Existing
    // malformed addresses sort as column 0 so insertion never fails on them.
    fn insert_cell_sorted(row_el: &mut Element, cell_ref: &CellRef) -> usize {
        let mut new_cell = Self::make_child_element(row_el, "c");
        new_cell.attributes.insert("r".to_string(), cell_ref.to_a1());
        let col_idx = cell_ref.column_index();

        let mut insert_at = None;
        let mut after_last_cell = None;
        for (idx, node) in row_el.children.iter().enumerate() {
            let XMLNode::Element(e) = node else { continue };
            if !Self::is_local_name(&e.name, "c") {
                continue;
            }
            let existing = Self::attr_by_local_name(e, "r")
                .map(lenient_column_index)
                .unwrap_or(0);
            if existing > col_idx {
                insert_at = Some(idx);
                break;
            }
            after_last_cell = Some(idx + 1);
        }

        let position =
            insert_at.unwrap_or_else(|| after_last_cell.unwrap_or(row_el.children.len()));
        row_el.children.insert(position, XMLNode::Element(new_cell));
        position
    }

    // New elements inherit the parent's namespace binding so the serializer
    // reuses the document's existing declarations.
    fn make_child_element(parent: &Element, name: &str) -> Element {
        let mut el = Element::new(name);
        el.prefix = parent.prefix.clone();
        el.namespace = parent.namespace.clone();
        el
    }

    fn child_mut_by_local_name<'a>(
        element: &'a mut Element,
        local_name: &str,
    ) -> Option<&'a mut Element> {
        for child in &mut element.children {
            if let XMLNode::Element(e) = child {
                if Self::is_local_name(&e.name, local_name) {
                    return Some(e);
                }
            }
        }
        None
    }

    fn attr_by_local_name<'a>(element: &'a Element, local_name: &str) -> Option<&'a str> {
        element
            .attributes
            .iter()
            .find(|(key, _)| Self::is_local_name(key, local_name))
            .map(|(_, value)| value.as_str())
    }

    fn is_local_name(full_name: &str, local_name: &str) -> bool {
        full_name == local_name || full_name.rsplit(':').next() == Some(local_name)
    }
}
