use crate::common::errors::AppError;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub struct WorkbookFile;

impl WorkbookFile {
    pub fn open(path: &Path) -> Result<ZipArchive<File>, AppError> {
        let file = File::open(path)?;
        Ok(ZipArchive::new(file)?)
    }

    // Absent entries are a per-change condition for worksheets, so they are
    // reported as None rather than an error.
    pub fn read_entry(
        archive: &mut ZipArchive<File>,
        name: &str,
    ) -> Result<Option<Vec<u8>>, AppError> {
        match archive.by_name(name) {
            Ok(mut entry) => {
                let mut bytes = Vec::new();
                entry.read_to_end(&mut bytes)?;
                Ok(Some(bytes))
            }
            Err(ZipError::FileNotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    // Rewrites the archive next to the original and renames it into place.
    // Unchanged entries are raw-copied (no recompression), so their bytes,
    // compression method, timestamps and flags survive untouched; replaced
    // entries reuse the original entry's compression and timestamp. The temp
    // file is removed on every failure path, leaving the original intact.
    pub fn rewrite_with_replacements(
        path: &Path,
        replacements: &[(String, Vec<u8>)],
    ) -> Result<(), AppError> {
        let replaced: HashMap<&str, &[u8]> = replacements
            .iter()
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
            .collect();

        let src = File::open(path)?;
        let mut archive = ZipArchive::new(src)?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let tmp = NamedTempFile::new_in(dir)?;
        let mut writer = ZipWriter::new(tmp);
        writer.set_raw_comment(archive.comment().to_vec().into());

        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i)?;
            match replaced.get(entry.name()).copied() {
                Some(bytes) => {
                    let name = entry.name().to_string();
                    let mut options = SimpleFileOptions::default()
                        .compression_method(entry.compression())
                        .last_modified_time(entry.last_modified().unwrap_or_default());
                    if let Some(mode) = entry.unix_mode() {
                        options = options.unix_permissions(mode);
                    }
                    drop(entry);
                    writer.start_file(name, options)?;
                    writer.write_all(bytes)?;
                }
                None => writer.raw_copy_file(entry)?,
            }
        }

        let tmp = writer.finish()?;
        tmp.as_file().sync_all()?;
        tmp.persist(path)
            .map_err(|e| AppError::IoError(e.to_string()))?;

        debug!(
            replaced = replacements.len(),
            path = %path.display(),
            "rewrote workbook archive"
        );
        Ok(())
    }
}
