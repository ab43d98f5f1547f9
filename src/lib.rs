//! # weft
//!
//! A minimal web-serving framework: requests arrive over one of four
//! transport bindings (HTTP, TLS-wrapped HTTP, SCGI, FastCGI), are
//! matched against an ordered route table, and are answered through a
//! per-request [`Context`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use weft::{Handler, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), weft::WeftError> {
//!     weft::init_logging(true);
//!     let server = Arc::new(Server::new(ServerConfig::default()));
//!     server.get("/hello/:name", Handler::with_captures(1, |caps: &[String]| {
//!         format!("hello, {}", caps[0])
//!     }))?;
//!     server.run("127.0.0.1:9999").await
//! }
//! ```

pub mod context;
pub mod errors;
pub mod handler;
pub mod logging;
pub mod mime;
pub mod request;
pub mod response;
pub mod routing;
pub mod server;
pub mod static_dirs;

pub use context::Context;
pub use errors::WeftError;
pub use handler::{Handler, ReturnValue};
pub use logging::init_logging;
pub use request::HttpRequest;
pub use response::HttpResponse;
pub use routing::HttpMethod;
pub use server::{Server, ServerConfig};
pub use static_dirs::static_dirs;
