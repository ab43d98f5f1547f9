use std::collections::HashMap;

use crate::mime;
use crate::request::HttpRequest;
use crate::response::writer::{ResponseWriter, WriteState};
use crate::response::HttpResponse;
use crate::routing::HttpMethod;
use crate::server::Server;

/// Per-request state and the only response-writing surface handlers see.
/// Created fresh inside `Server::process` right before routing, never
/// shared between requests, and consumed when the response is finalized.
pub struct Context<'a> {
    request: &'a HttpRequest,
    server: &'a Server,
    /// Captures extracted by the router: named captures under their name,
    /// anonymous groups under their stringified positional index.
    pub params: HashMap<String, String>,
    writer: ResponseWriter,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        request: &'a HttpRequest,
        server: &'a Server,
        params: HashMap<String, String>,
    ) -> Self {
        Self {
            request,
            server,
            params,
            writer: ResponseWriter::new(),
        }
    }

    pub fn request(&self) -> &HttpRequest {
        self.request
    }

    pub fn server(&self) -> &Server {
        self.server
    }

    pub fn method(&self) -> &HttpMethod {
        &self.request.method
    }

    pub fn path(&self) -> &str {
        &self.request.path
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|v| v.as_str())
    }

    /// Set a response header; `unique` replaces, otherwise appends.
    pub fn set_header(&mut self, name: &str, value: &str, unique: bool) {
        self.writer.set_header(name, value, unique);
    }

    /// Add a `Set-Cookie` header. `max_age` is in seconds.
    pub fn set_cookie(&mut self, name: &str, value: &str, max_age: u64) {
        let cookie = format!("{name}={value}; Max-Age={max_age}");
        self.set_header("Set-Cookie", &cookie, false);
    }

    /// Resolve `value` to a MIME type and set `Content-Type` accordingly.
    /// A value containing `/` is used verbatim; anything else is treated
    /// as a file-extension alias (leading `.` optional) and looked up in
    /// the extension table. Returns the resolved type, or `None` when the
    /// extension is unknown (in which case no header is set).
    pub fn content_type(&mut self, value: &str) -> Option<String> {
        if value.contains('/') {
            self.set_header("Content-Type", value, true);
            return Some(value.to_string());
        }
        let ext = value.strip_prefix('.').unwrap_or(value);
        let resolved = mime::by_extension(ext)?;
        self.set_header("Content-Type", resolved, true);
        Some(resolved.to_string())
    }

    /// Send `status` with an HTML body. Useful for 4xx/5xx replies; any
    /// value the handler returns afterwards is discarded.
    pub fn abort(&mut self, status: u16, body: &str) {
        self.set_header("Content-Type", "text/html; charset=utf-8", true);
        self.writer.write_status(status);
        self.writer.write(body.as_bytes());
        self.writer.close_body();
    }

    /// 3xx redirect with a human-readable fallback body for clients that
    /// do not follow `Location` on their own.
    pub fn redirect(&mut self, status: u16, url: &str) {
        self.set_header("Location", url, true);
        self.writer.write_status(status);
        self.writer.write(format!("Redirecting to: {url}").as_bytes());
        self.writer.close_body();
    }

    pub fn bad_request(&mut self) {
        self.writer.write_status(400);
    }

    pub fn not_modified(&mut self) {
        self.writer.write_status(304);
    }

    pub fn unauthorized(&mut self) {
        self.writer.write_status(401);
    }

    pub fn forbidden(&mut self) {
        self.writer.write_status(403);
    }

    pub fn not_found(&mut self, message: &str) {
        self.writer.write_status(404);
        self.writer.write(message.as_bytes());
        self.writer.close_body();
    }

    /// Write string content to the response body. Commits the 200 default
    /// if no status has been set yet.
    pub fn write_string(&mut self, content: &str) {
        self.writer.write(content.as_bytes());
    }

    /// Write raw bytes to the response body.
    pub fn write(&mut self, bytes: &[u8]) {
        self.writer.write(bytes);
    }

    /// Whether the handler has taken explicit control of the status line.
    pub(crate) fn response_started(&self) -> bool {
        self.writer.state() != WriteState::Unstarted
    }

    pub(crate) fn finish(self) -> HttpResponse {
        self.writer.finish()
    }
}
