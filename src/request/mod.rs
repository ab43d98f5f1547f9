pub mod parser;
pub mod types;

pub use parser::{parse_form_body, parse_json_body, parse_query_string, request_from_cgi_params};
pub use types::HttpRequest;
