use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// HTTP method of a [Request].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        };
        write!(f, "{}", name)
    }
}

/// One request to the server.
///
/// A request addresses a database and an API path, carries query parameters and
/// headers, and an optional body already encoded by the document codec. Header
/// names are stored lowercase.
///
/// # Examples
///
/// ```rust,ignore
/// let request = Request::new(Method::Get, "_system", "/_api/document/users/alice")
///     .with_header(HEADER_IF_NONE_MATCH, "_hK9tE--");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    database: String,
    path: String,
    query: Vec<(String, String)>,
    headers: BTreeMap<String, String>,
    body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, database: &str, path: &str) -> Self {
        Request {
            method,
            database: database.to_string(),
            path: path.to_string(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Adds a query parameter only when a value is present.
    pub fn with_optional_query(self, name: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.with_query(name, value),
            None => self,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Adds a header only when a value is present.
    pub fn with_optional_header(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.with_header(name, value),
            None => self,
        }
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the non-empty segments of the path.
    pub fn path_segments(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns the last value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns a boolean query parameter, or `default` if it is absent.
    pub fn query_flag(&self, name: &str, default: bool) -> bool {
        match self.query_param(name) {
            Some(value) => value == "true",
            None => default,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

impl Display for Request {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} /_db/{}{}", self.method, self.database, self.path)?;
        if !self.query.is_empty() {
            let query = itertools::join(self.query.iter().map(|(k, v)| format!("{}={}", k, v)), "&");
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}
