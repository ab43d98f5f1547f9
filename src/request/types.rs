use std::collections::HashMap;

use crate::errors::WeftError;
use crate::request::parser::{parse_form_body, parse_json_body, parse_query_string};
use crate::routing::HttpMethod;

/// Transport-independent request representation. Each listener builds one
/// of these off the wire and hands it to `Server::process`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HashMap::new(),
            query_params: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query_params = parse_query_string(query);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decode the body as JSON.
    pub fn json_body(&self) -> Result<serde_json::Value, WeftError> {
        parse_json_body(&self.body)
    }

    /// Decode the body as a urlencoded form.
    pub fn form_params(&self) -> Result<HashMap<String, String>, WeftError> {
        parse_form_body(&self.body)
    }
}
