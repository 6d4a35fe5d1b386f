use crate::common::errors::AppError;
use crate::xlsx::is_local_name_bytes;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

const WORKBOOK_ENTRY: &str = "xl/workbook.xml";
const WORKBOOK_RELS_ENTRY: &str = "xl/_rels/workbook.xml.rels";

// Maps logical sheet names to worksheet entry paths, in workbook order.
#[derive(Debug, Clone, Default)]
pub struct SheetMap {
    entries: Vec<(String, String)>,
}

impl SheetMap {
    pub fn read<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Self, AppError> {
        let mut workbook_xml = String::new();
        archive
            .by_name(WORKBOOK_ENTRY)?
            .read_to_string(&mut workbook_xml)?;

        let mut rels_xml = String::new();
        archive
            .by_name(WORKBOOK_RELS_ENTRY)?
            .read_to_string(&mut rels_xml)?;

        Self::parse(&workbook_xml, &rels_xml)
    }

    pub fn parse(workbook_xml: &str, rels_xml: &str) -> Result<Self, AppError> {
        let rel_targets = Self::parse_relationships(rels_xml)?;

        let mut reader = Reader::from_str(workbook_xml);
        reader.config_mut().trim_text(false);

        let mut entries = Vec::new();
        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e)
                    if is_local_name_bytes(e.name().as_ref(), b"sheet") =>
                {
                    let name = Self::attr_value(&e, b"name", reader.decoder())?;
                    let rel_id = Self::attr_value(&e, b"id", reader.decoder())?;
                    let (Some(name), Some(rel_id)) = (name, rel_id) else {
                        continue;
                    };
                    let Some(target) = rel_targets
                        .iter()
                        .find(|(id, _)| *id == rel_id)
                        .map(|(_, target)| target)
                    else {
                        continue;
                    };
                    entries.push((name, Self::normalize_target(target)));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self { entries })
    }

    pub fn resolve(&self, sheet_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, path)| path.as_str())
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    fn parse_relationships(rels_xml: &str) -> Result<Vec<(String, String)>, AppError> {
        let mut reader = Reader::from_str(rels_xml);
        reader.config_mut().trim_text(false);

        let mut targets = Vec::new();
        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e)
                    if is_local_name_bytes(e.name().as_ref(), b"Relationship") =>
                {
                    let id = Self::attr_value(&e, b"Id", reader.decoder())?;
                    let target = Self::attr_value(&e, b"Target", reader.decoder())?;
                    if let (Some(id), Some(target)) = (id, target) {
                        targets.push((id, target));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(targets)
    }

    // Relationship targets are relative to xl/ unless they are rooted; the
    // stored entry names never carry a leading slash.
    fn normalize_target(target: &str) -> String {
        if let Some(rooted) = target.strip_prefix('/') {
            return rooted.to_string();
        }
        let mut parts: Vec<&str> = vec!["xl"];
        for segment in target.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                other => parts.push(other),
            }
        }
        parts.join("/")
    }

    fn attr_value(
        e: &BytesStart<'_>,
        local_name: &[u8],
        decoder: quick_xml::encoding::Decoder,
    ) -> Result<Option<String>, AppError> {
        for attr in e.attributes().flatten() {
            if is_local_name_bytes(attr.key.as_ref(), local_name) {
                let value = attr
                    .decode_and_unescape_value(decoder)
                    .map_err(|x| AppError::XmlParseError(x.to_string()))?;
                return Ok(Some(value.to_string()));
            }
        }
        Ok(None)
    }
}
