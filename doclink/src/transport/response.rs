use std::collections::BTreeMap;

use serde::Deserialize;

use crate::common::{ATTR_ERROR_MESSAGE, ATTR_ERROR_NUM};
use crate::errors::DocLinkError;

/// One response from the server: status, headers and an opaque body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "errorNum", default)]
    error_num: Option<u32>,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Response {
            status,
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether a header carries the value `true`.
    pub fn header_flag(&self, name: &str) -> bool {
        self.header(name).map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false)
    }

    /// Converts an error response into a [DocLinkError].
    ///
    /// Error bodies look like `{"error": true, "code": 404, "errorNum": 1202,
    /// "errorMessage": "document not found"}`; a body that cannot be read that way
    /// still yields an error classified by status alone.
    pub fn to_error(&self) -> DocLinkError {
        match serde_json::from_slice::<ErrorBody>(&self.body) {
            Ok(body) => {
                let message = body
                    .error_message
                    .unwrap_or_else(|| format!("request failed with status {}", self.status));
                DocLinkError::server(self.status, body.error_num, &message)
            }
            Err(_) => DocLinkError::server(
                self.status,
                None,
                &format!("request failed with status {}", self.status),
            ),
        }
    }
}

/// Builds the error body the server sends with a failed request.
pub fn error_body(status: u16, error_num: u32, message: &str) -> Vec<u8> {
    let body = serde_json::json!({
        "error": true,
        "code": status,
        (ATTR_ERROR_NUM): error_num,
        (ATTR_ERROR_MESSAGE): message,
    });
    body.to_string().into_bytes()
}
