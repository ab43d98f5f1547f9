use std::collections::HashMap;
use std::fmt;

use crate::handler::Handler;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
    TRACE,
    /// Custom verb; stored upper-cased so comparison stays case-insensitive.
    Other(String),
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::TRACE => "TRACE",
            HttpMethod::Other(name) => name,
        };
        f.write_str(name)
    }
}

pub struct Route {
    pub pattern: String,
    pub method: HttpMethod,
    pub handler: Handler,
    pub matcher: regex::Regex,
    /// One entry per capture group, in group order: the group name for
    /// `:name` segments and named groups, a stringified positional index
    /// for anonymous groups.
    pub param_names: Vec<String>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("method", &self.method)
            .field("matcher", &self.matcher)
            .field("param_names", &self.param_names)
            .finish_non_exhaustive()
    }
}

/// Result of scanning the route table for a path/method pair.
pub enum MatchOutcome {
    Found {
        index: usize,
        /// Captured substrings in group order, for positional binding.
        captures: Vec<String>,
        /// Captures keyed by name (or stringified index) for `Context::params`.
        params: HashMap<String, String>,
    },
    /// At least one pattern accepted the path, but none with this method.
    MethodMismatch { allowed: Vec<HttpMethod> },
    Miss,
}
