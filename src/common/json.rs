use crate::common::errors::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub struct JsonUtil;

impl JsonUtil {
    pub fn read_file<T: DeserializeOwned>(path: &str) -> Result<T, AppError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::InvalidInput(format!("invalid json in {path}: {e}")))
    }

    pub fn render<T: Serialize>(value: &T) -> Result<String, AppError> {
        serde_json::to_string(value).map_err(|e| AppError::InvalidInput(e.to_string()))
    }
}
