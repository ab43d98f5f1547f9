pub mod serializer;
pub mod types;
pub mod writer;

pub use serializer::serialize_cgi_response;
pub use types::{reason_phrase, HttpResponse};
pub use writer::{ResponseWriter, WriteState};
