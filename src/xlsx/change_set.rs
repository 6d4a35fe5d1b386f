use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeTarget {
    Table,
    Column,
}

impl Default for ChangeTarget {
    fn default() -> Self {
        Self::Column
    }
}

impl<'de> Deserialize<'de> for ChangeTarget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Anything other than an explicit "table" falls back to "column".
        let raw = String::deserialize(deserializer)?;
        Ok(if raw == "table" {
            ChangeTarget::Table
        } else {
            ChangeTarget::Column
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangeRequest {
    pub sheet_name: String,
    pub source_address: String,
    pub before_name: String,
    pub after_name: String,
    pub table_index: i64,
    pub column_index: Option<i64>,
    pub target: ChangeTarget,
}

impl Default for ChangeRequest {
    fn default() -> Self {
        Self {
            sheet_name: String::new(),
            source_address: String::new(),
            before_name: String::new(),
            after_name: String::new(),
            table_index: -1,
            column_index: None,
            target: ChangeTarget::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangePayload {
    #[serde(default)]
    pub changes: Vec<ChangeRequest>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub sheet_name: String,
    pub source_address: String,
    pub reason: String,
    pub table_index: i64,
    pub column_index: Option<i64>,
    pub target: ChangeTarget,
}

impl Issue {
    // The address is passed separately because the applicator reports the
    // trimmed form while up-front rejections echo the request verbatim.
    pub fn for_change(change: &ChangeRequest, source_address: &str, reason: String) -> Self {
        Self {
            sheet_name: change.sheet_name.clone(),
            source_address: source_address.to_string(),
            reason,
            table_index: change.table_index,
            column_index: change.column_index,
            target: change.target,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchReport {
    pub applied_count: usize,
    pub issues: Vec<Issue>,
}
