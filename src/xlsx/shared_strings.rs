use crate::common::errors::AppError;
use crate::xlsx::is_local_name_bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::result::ZipError;
use zip::ZipArchive;

const SHARED_STRINGS_ENTRY: &str = "xl/sharedStrings.xml";

// Read-only string pool; cells typed "s" hold an index into it.
#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    entries: Vec<String>,
}

impl SharedStrings {
    pub fn from_entries(entries: Vec<String>) -> Self {
        Self { entries }
    }

    pub fn read<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Self, AppError> {
        let mut content = String::new();
        match archive.by_name(SHARED_STRINGS_ENTRY) {
            Ok(mut entry) => {
                entry.read_to_string(&mut content)?;
            }
            // Workbooks without any shared strings simply omit the entry.
            Err(ZipError::FileNotFound) => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        }
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, AppError> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(false);

        let mut entries = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_text = false;

        loop {
            match reader.read_event()? {
                Event::Start(e) if is_local_name_bytes(e.name().as_ref(), b"si") => {
                    in_si = true;
                    current.clear();
                }
                Event::End(e) if is_local_name_bytes(e.name().as_ref(), b"si") => {
                    entries.push(std::mem::take(&mut current));
                    in_si = false;
                    in_text = false;
                }
                Event::Empty(e) if is_local_name_bytes(e.name().as_ref(), b"si") => {
                    entries.push(String::new());
                }
                Event::Start(e) if in_si && is_local_name_bytes(e.name().as_ref(), b"t") => {
                    in_text = true;
                }
                Event::End(e) if is_local_name_bytes(e.name().as_ref(), b"t") => {
                    in_text = false;
                }
                Event::Text(text) if in_text => {
                    let t = text
                        .unescape()
                        .map_err(|x| AppError::XmlParseError(x.to_string()))?;
                    current.push_str(&t);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self { entries })
    }

    // Resolves a raw cell value as a shared-string index; indices that do not
    // parse or fall outside the table come back as the raw text itself.
    pub fn resolve_index(&self, raw: &str) -> String {
        match raw.trim().parse::<usize>() {
            Ok(idx) if idx < self.entries.len() => self.entries[idx].clone(),
            _ => raw.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
