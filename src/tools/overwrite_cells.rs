use crate::common::errors::AppError;
use crate::common::fs::FsUtil;
use crate::xlsx::change_set::{ChangePayload, ChangeRequest, Issue, PatchReport};
use crate::xlsx::shared_strings::SharedStrings;
use crate::xlsx::sheet_map::SheetMap;
use crate::xlsx::sheet_patch::SheetPatch;
use crate::xlsx::workbook_file::WorkbookFile;
use tracing::info;

const REASON_SHEET_NOT_FOUND: &str = "Worksheet not found in workbook";
const REASON_ENTRY_NOT_FOUND: &str = "Worksheet xml entry not found in workbook zip";

// Applies a change payload against one workbook: changes are grouped by
// resolved worksheet entry, each targeted worksheet is parsed and patched
// once, and only the touched entries are replaced in the archive.
pub fn run(workbook_path: &str, payload: ChangePayload) -> Result<PatchReport, AppError> {
    let path = FsUtil::resolve_workbook_path(workbook_path)?;
    if !path.exists() {
        return Err(AppError::FileNotFound(path.display().to_string()));
    }

    let mut archive = WorkbookFile::open(&path)?;
    let shared = SharedStrings::read(&mut archive)?;
    let sheet_map = SheetMap::read(&mut archive)?;

    let mut issues = Vec::new();
    let mut groups: Vec<(String, Vec<ChangeRequest>)> = Vec::new();
    for change in payload.changes {
        let Some(entry_path) = sheet_map.resolve(&change.sheet_name) else {
            issues.push(Issue::for_change(
                &change,
                &change.source_address,
                REASON_SHEET_NOT_FOUND.to_string(),
            ));
            continue;
        };
        match groups.iter_mut().find(|(path, _)| path.as_str() == entry_path) {
            Some((_, group)) => group.push(change),
            None => groups.push((entry_path.to_string(), vec![change])),
        }
    }

    let mut replacements: Vec<(String, Vec<u8>)> = Vec::new();
    let mut applied_count = 0usize;
    for (entry_path, group) in &groups {
        let Some(sheet_xml) = WorkbookFile::read_entry(&mut archive, entry_path)? else {
            for change in group {
                issues.push(Issue::for_change(
                    change,
                    &change.source_address,
                    REASON_ENTRY_NOT_FOUND.to_string(),
                ));
            }
            continue;
        };

        let outcome = SheetPatch::apply(&sheet_xml, &shared, group)?;
        applied_count += outcome.applied;
        issues.extend(outcome.issues);
        replacements.push((entry_path.clone(), outcome.xml));
    }

    // The read handle must be released before the rewrite opens its own.
    drop(archive);

    if !replacements.is_empty() {
        WorkbookFile::rewrite_with_replacements(&path, &replacements)?;
    }

    info!(
        applied = applied_count,
        issues = issues.len(),
        "cell overwrite complete"
    );
    Ok(PatchReport {
        applied_count,
        issues,
    })
}
