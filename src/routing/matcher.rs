use std::collections::HashMap;

use crate::routing::types::{HttpMethod, MatchOutcome, Route};

/// Ordered, append-only table of compiled routes. Registration order is
/// the only tie-break: the first pattern+method match wins.
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn get(&self, index: usize) -> &Route {
        &self.routes[index]
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn match_route(&self, path: &str, method: &HttpMethod) -> MatchOutcome {
        let mut allowed: Vec<HttpMethod> = Vec::new();

        for (index, route) in self.routes.iter().enumerate() {
            let Some(caps) = route.matcher.captures(path) else {
                continue;
            };
            if route.method != *method {
                if !allowed.contains(&route.method) {
                    allowed.push(route.method.clone());
                }
                continue;
            }

            let mut captures = Vec::with_capacity(route.param_names.len());
            let mut params = HashMap::new();
            for (group, name) in caps.iter().skip(1).zip(route.param_names.iter()) {
                let value = group.map(|m| m.as_str()).unwrap_or("").to_string();
                captures.push(value.clone());
                params.insert(name.clone(), value);
            }

            return MatchOutcome::Found {
                index,
                captures,
                params,
            };
        }

        if allowed.is_empty() {
            MatchOutcome::Miss
        } else {
            MatchOutcome::MethodMismatch { allowed }
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;
    use crate::routing::parser::compile_route;

    fn table(entries: &[(&str, HttpMethod)]) -> RouteTable {
        let mut table = RouteTable::new();
        for (pattern, method) in entries {
            let arity = pattern.matches(':').count() + pattern.matches('(').count();
            let handler = Handler::with_captures(arity, |_: &[String]| "");
            table.add_route(compile_route(pattern, method.clone(), handler).unwrap());
        }
        table
    }

    #[test]
    fn test_first_registered_match_wins() {
        let table = table(&[
            ("/(.*)", HttpMethod::GET),
            ("/specific", HttpMethod::GET),
        ]);
        match table.match_route("/specific", &HttpMethod::GET) {
            MatchOutcome::Found { index, .. } => assert_eq!(index, 0),
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn test_method_must_match() {
        let table = table(&[("/submit", HttpMethod::GET)]);
        match table.match_route("/submit", &HttpMethod::POST) {
            MatchOutcome::MethodMismatch { allowed } => {
                assert_eq!(allowed, vec![HttpMethod::GET]);
            }
            _ => panic!("expected a method mismatch"),
        }
    }

    #[test]
    fn test_miss_when_nothing_matches() {
        let table = table(&[("/submit", HttpMethod::GET)]);
        assert!(matches!(
            table.match_route("/other", &HttpMethod::GET),
            MatchOutcome::Miss
        ));
    }

    #[test]
    fn test_named_captures_land_in_params() {
        let table = table(&[("/users/:id", HttpMethod::GET)]);
        match table.match_route("/users/42", &HttpMethod::GET) {
            MatchOutcome::Found {
                captures, params, ..
            } => {
                assert_eq!(captures, vec!["42".to_string()]);
                assert_eq!(params.get("id"), Some(&"42".to_string()));
            }
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn test_positional_captures_use_stringified_index() {
        let table = table(&[("/files/(.*)", HttpMethod::GET)]);
        match table.match_route("/files/a/b.txt", &HttpMethod::GET) {
            MatchOutcome::Found { params, .. } => {
                assert_eq!(params.get("0"), Some(&"a/b.txt".to_string()));
            }
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn test_later_method_still_matches_same_pattern() {
        let table = table(&[
            ("/resource", HttpMethod::GET),
            ("/resource", HttpMethod::POST),
        ]);
        match table.match_route("/resource", &HttpMethod::POST) {
            MatchOutcome::Found { index, .. } => assert_eq!(index, 1),
            _ => panic!("expected a match"),
        }
    }
}
