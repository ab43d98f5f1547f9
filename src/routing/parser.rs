use regex::Regex;

use crate::errors::WeftError;
use crate::handler::Handler;
use crate::routing::types::{HttpMethod, Route};

/// Compile a route pattern and pair it with its handler.
///
/// Patterns are regular expressions over the request path, with one piece
/// of sugar: a path segment of the form `:name` becomes the named group
/// `(?P<name>[^/]+)`. Plain literals pass through unchanged, as do
/// hand-written groups such as `(.*)`. The whole pattern is anchored.
///
/// Compilation failures and capture/handler arity mismatches are both
/// reported here, at registration, so a malformed route can never reach
/// the serving state silently.
pub fn compile_route(
    pattern: &str,
    method: HttpMethod,
    handler: Handler,
) -> Result<Route, WeftError> {
    let expanded = expand_capture_segments(pattern)?;
    let matcher = Regex::new(&format!("^{expanded}$")).map_err(|e| {
        WeftError::configuration(format!("invalid route pattern {pattern:?}: {e}"))
    })?;

    let capture_count = matcher.captures_len() - 1;
    let declared = handler.capture_arity();
    if declared != capture_count {
        return Err(WeftError::configuration(format!(
            "route {pattern:?} has {capture_count} capture(s) but its handler binds {declared}"
        )));
    }

    let mut param_names = Vec::with_capacity(capture_count);
    let mut positional = 0usize;
    for name in matcher.capture_names().skip(1) {
        match name {
            Some(name) => param_names.push(name.to_string()),
            None => {
                param_names.push(positional.to_string());
                positional += 1;
            }
        }
    }

    Ok(Route {
        pattern: pattern.to_string(),
        method,
        handler,
        matcher,
        param_names,
    })
}

fn expand_capture_segments(pattern: &str) -> Result<String, WeftError> {
    let mut segments = Vec::new();
    for segment in pattern.split('/') {
        match segment.strip_prefix(':') {
            Some(name) => {
                if name.is_empty()
                    || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                    || name.starts_with(|c: char| c.is_ascii_digit())
                {
                    return Err(WeftError::configuration(format!(
                        "invalid capture name {name:?} in pattern {pattern:?}"
                    )));
                }
                segments.push(format!("(?P<{name}>[^/]+)"));
            }
            None => segments.push(segment.to_string()),
        }
    }
    Ok(segments.join("/"))
}

/// Parse a method string case-insensitively. Unrecognized verbs are kept
/// as custom methods rather than rejected.
pub fn parse_http_method(method: &str) -> HttpMethod {
    match method.to_uppercase().as_str() {
        "GET" => HttpMethod::GET,
        "POST" => HttpMethod::POST,
        "PUT" => HttpMethod::PUT,
        "DELETE" => HttpMethod::DELETE,
        "PATCH" => HttpMethod::PATCH,
        "HEAD" => HttpMethod::HEAD,
        "OPTIONS" => HttpMethod::OPTIONS,
        "TRACE" => HttpMethod::TRACE,
        other => HttpMethod::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;

    #[test]
    fn test_compile_literal_pattern() {
        let route = compile_route("/about", HttpMethod::GET, Handler::no_args(|| "ok")).unwrap();
        assert!(route.matcher.is_match("/about"));
        assert!(!route.matcher.is_match("/about/us"));
        assert!(route.param_names.is_empty());
    }

    #[test]
    fn test_compile_named_segment() {
        let route = compile_route(
            "/users/:id",
            HttpMethod::GET,
            Handler::with_captures(1, |caps: &[String]| caps[0].clone()),
        )
        .unwrap();
        assert_eq!(route.param_names, vec!["id".to_string()]);
        let caps = route.matcher.captures("/users/42").unwrap();
        assert_eq!(caps.name("id").unwrap().as_str(), "42");
        assert!(!route.matcher.is_match("/users/42/posts"));
    }

    #[test]
    fn test_compile_raw_regex_groups() {
        let route = compile_route(
            "/files/(.*)",
            HttpMethod::GET,
            Handler::with_captures(1, |caps: &[String]| caps[0].clone()),
        )
        .unwrap();
        assert_eq!(route.param_names, vec!["0".to_string()]);
        assert!(route.matcher.is_match("/files/a/b/c.txt"));
    }

    #[test]
    fn test_compile_rejects_malformed_regex() {
        let err = compile_route("/bad/(unclosed", HttpMethod::GET, Handler::no_args(|| ""))
            .unwrap_err();
        assert!(matches!(err, WeftError::Configuration { .. }));
    }

    #[test]
    fn test_compile_rejects_arity_mismatch() {
        let err = compile_route("/users/:id", HttpMethod::GET, Handler::no_args(|| ""))
            .unwrap_err();
        assert!(matches!(err, WeftError::Configuration { .. }));
    }

    #[test]
    fn test_compile_rejects_bad_capture_name() {
        let err = compile_route("/users/:1id", HttpMethod::GET, Handler::no_args(|| ""))
            .unwrap_err();
        assert!(matches!(err, WeftError::Configuration { .. }));
    }

    #[test]
    fn test_parse_http_method_case_insensitive() {
        assert_eq!(parse_http_method("get"), HttpMethod::GET);
        assert_eq!(parse_http_method("Post"), HttpMethod::POST);
        assert_eq!(
            parse_http_method("purge"),
            HttpMethod::Other("PURGE".to_string())
        );
    }
}
