use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("invalid workbook format: {0}")]
    InvalidWorkbookFormat(String),
    #[error("invalid cell address: {0}")]
    InvalidCellAddress(String),
    #[error("xml parse error: {0}")]
    XmlParseError(String),
    #[error("zip error: {0}")]
    ZipError(String),
    #[error("io error: {0}")]
    IoError(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::IoError(value.to_string())
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(value: zip::result::ZipError) -> Self {
        Self::ZipError(value.to_string())
    }
}

impl From<quick_xml::Error> for AppError {
    fn from(value: quick_xml::Error) -> Self {
        Self::XmlParseError(value.to_string())
    }
}

impl From<xmltree::ParseError> for AppError {
    fn from(value: xmltree::ParseError) -> Self {
        Self::XmlParseError(value.to_string())
    }
}

impl From<xmltree::Error> for AppError {
    fn from(value: xmltree::Error) -> Self {
        Self::XmlParseError(value.to_string())
    }
}
