use crate::errors::{DocLinkError, DocLinkResult, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// What a create does when a document with the same key already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwriteMode {
    /// Fail with a unique constraint violation.
    #[default]
    Conflict,
    /// Keep the stored document and report its metadata.
    Ignore,
    /// Discard the stored attributes and store the incoming document.
    Replace,
    /// Merge the incoming attributes into the stored document.
    Update,
}

impl OverwriteMode {
    /// Returns the wire name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            OverwriteMode::Conflict => "conflict",
            OverwriteMode::Ignore => "ignore",
            OverwriteMode::Replace => "replace",
            OverwriteMode::Update => "update",
        }
    }
}

impl Display for OverwriteMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OverwriteMode {
    type Err = DocLinkError;

    fn from_str(s: &str) -> DocLinkResult<Self> {
        match s {
            "conflict" => Ok(OverwriteMode::Conflict),
            "ignore" => Ok(OverwriteMode::Ignore),
            "replace" => Ok(OverwriteMode::Replace),
            "update" => Ok(OverwriteMode::Update),
            _ => {
                log::error!("Unknown overwrite mode {}", s);
                Err(DocLinkError::new(
                    &format!("Unknown overwrite mode {}", s),
                    ErrorKind::Invalid,
                ))
            }
        }
    }
}
