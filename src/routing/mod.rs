pub mod matcher;
pub mod parser;
pub mod types;

pub use matcher::RouteTable;
pub use parser::{compile_route, parse_http_method};
pub use types::{HttpMethod, MatchOutcome, Route};
