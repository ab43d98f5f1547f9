use std::collections::HashMap;

use crate::errors::WeftError;
use crate::request::types::HttpRequest;
use crate::routing::parse_http_method;

pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| {
            let mut parts = pair.split('=');
            match (parts.next(), parts.next()) {
                (Some(key), Some(value)) if !key.is_empty() => Some((
                    urlencoding::decode(key).ok()?.into_owned(),
                    urlencoding::decode(value).ok()?.into_owned(),
                )),
                _ => None,
            }
        })
        .collect()
}

pub fn parse_json_body(data: &[u8]) -> Result<serde_json::Value, WeftError> {
    serde_json::from_slice(data)
        .map_err(|e| WeftError::configuration(format!("invalid JSON body: {e}")))
}

pub fn parse_form_body(data: &[u8]) -> Result<HashMap<String, String>, WeftError> {
    let body = std::str::from_utf8(data)
        .map_err(|e| WeftError::configuration(format!("invalid UTF-8 in form body: {e}")))?;
    Ok(parse_query_string(body))
}

/// Build a request from a CGI-style parameter block, the shape both the
/// SCGI and FastCGI transports deliver. `REQUEST_METHOD` and a path
/// (`REQUEST_URI` or `PATH_INFO`) are mandatory; `HTTP_*` entries become
/// headers with underscores folded back to dashes.
pub fn request_from_cgi_params(
    params: &HashMap<String, String>,
    body: Vec<u8>,
) -> Result<HttpRequest, WeftError> {
    let method = params
        .get("REQUEST_METHOD")
        .ok_or_else(|| WeftError::configuration("CGI params missing REQUEST_METHOD"))?;

    let raw_uri = params
        .get("REQUEST_URI")
        .or_else(|| params.get("PATH_INFO"))
        .ok_or_else(|| WeftError::configuration("CGI params missing REQUEST_URI/PATH_INFO"))?;

    let (path, uri_query) = match raw_uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (raw_uri.as_str(), None),
    };
    let query = params
        .get("QUERY_STRING")
        .map(|q| q.as_str())
        .filter(|q| !q.is_empty())
        .or(uri_query)
        .unwrap_or("");

    let mut headers = HashMap::new();
    for (name, value) in params {
        if let Some(stripped) = name.strip_prefix("HTTP_") {
            headers.insert(cgi_header_name(stripped), value.clone());
        }
    }
    if let Some(content_type) = params.get("CONTENT_TYPE") {
        headers.insert("Content-Type".to_string(), content_type.clone());
    }
    if let Some(content_length) = params.get("CONTENT_LENGTH") {
        headers.insert("Content-Length".to_string(), content_length.clone());
    }

    Ok(HttpRequest {
        method: parse_http_method(method),
        path: path.to_string(),
        headers,
        query_params: parse_query_string(query),
        body,
    })
}

fn cgi_header_name(upper: &str) -> String {
    upper
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::HttpMethod;

    #[test]
    fn test_parse_query_string_simple() {
        let result = parse_query_string("key1=value1&key2=value2");
        assert_eq!(result.get("key1"), Some(&"value1".to_string()));
        assert_eq!(result.get("key2"), Some(&"value2".to_string()));
    }

    #[test]
    fn test_parse_query_string_encoded() {
        let result = parse_query_string("name=John%20Doe&city=New%20York");
        assert_eq!(result.get("name"), Some(&"John Doe".to_string()));
        assert_eq!(result.get("city"), Some(&"New York".to_string()));
    }

    #[test]
    fn test_parse_query_string_empty() {
        assert!(parse_query_string("").is_empty());
    }

    #[test]
    fn test_parse_json_body_valid() {
        let result = parse_json_body(br#"{"name": "test", "value": 42}"#).unwrap();
        assert_eq!(result["name"], "test");
        assert_eq!(result["value"], 42);
    }

    #[test]
    fn test_parse_json_body_invalid() {
        assert!(parse_json_body(br#"{"name": "test", invalid}"#).is_err());
    }

    #[test]
    fn test_request_from_cgi_params() {
        let mut params = HashMap::new();
        params.insert("REQUEST_METHOD".to_string(), "post".to_string());
        params.insert("REQUEST_URI".to_string(), "/users/7?trace=1".to_string());
        params.insert("HTTP_USER_AGENT".to_string(), "probe".to_string());
        params.insert("CONTENT_TYPE".to_string(), "text/plain".to_string());

        let request = request_from_cgi_params(&params, b"payload".to_vec()).unwrap();
        assert_eq!(request.method, HttpMethod::POST);
        assert_eq!(request.path, "/users/7");
        assert_eq!(request.query_params.get("trace"), Some(&"1".to_string()));
        assert_eq!(request.header("user-agent"), Some("probe"));
        assert_eq!(request.header("content-type"), Some("text/plain"));
        assert_eq!(request.body, b"payload");
    }

    #[test]
    fn test_request_from_cgi_params_requires_method() {
        let params = HashMap::new();
        assert!(request_from_cgi_params(&params, Vec::new()).is_err());
    }
}
