mod bulk_test;
mod document_test;
mod overwrite_test;
mod precondition_test;

use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use serde::{Deserialize, Serialize};

/// User record used across the collection tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_key", skip_serializing_if = "Option::is_none", default)]
    pub key: Option<String>,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none", default)]
    pub rev: Option<String>,
    pub name: String,
    pub email: String,
    pub age: u32,
}

impl User {
    pub fn generate() -> Self {
        User {
            key: None,
            rev: None,
            name: Name().fake(),
            email: SafeEmail().fake(),
            age: (18..90).fake(),
        }
    }

    pub fn with_key(key: &str) -> Self {
        User {
            key: Some(key.to_string()),
            ..User::generate()
        }
    }
}
