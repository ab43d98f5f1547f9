use tracing::warn;

use crate::response::types::HttpResponse;

/// Where the response stands. Exactly one status line per request: the
/// first status write wins and later attempts are logged and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    Unstarted,
    HeadersSent,
    BodySent,
}

/// Buffered response writer implementing the per-request state machine
/// `Unstarted -> HeadersSent -> BodySent`. Transports serialize the
/// finished [`HttpResponse`]; nothing here touches the wire.
pub struct ResponseWriter {
    state: WriteState,
    status: Option<u16>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self {
            state: WriteState::Unstarted,
            status: None,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn state(&self) -> WriteState {
        self.state
    }

    /// Set a response header. `unique` replaces any existing values for
    /// `name`; otherwise the value is appended, supporting multi-valued
    /// headers such as repeated `Set-Cookie`. Legal only before the
    /// status line is committed.
    pub fn set_header(&mut self, name: &str, value: &str, unique: bool) {
        if self.state != WriteState::Unstarted {
            warn!(header = name, "header set after headers were sent; ignored");
            return;
        }
        if unique {
            self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        }
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Commit the status line. A second attempt is a programming error:
    /// it is logged and suppressed, never re-sent.
    pub fn write_status(&mut self, status: u16) {
        if self.state != WriteState::Unstarted {
            warn!(
                status,
                committed = self.status,
                "status line already sent; duplicate write suppressed"
            );
            return;
        }
        self.status = Some(status);
        self.state = WriteState::HeadersSent;
    }

    /// Append body bytes. A body write without a committed status commits
    /// the 200 default first.
    pub fn write(&mut self, bytes: &[u8]) {
        if self.state == WriteState::Unstarted {
            self.status = Some(200);
            self.state = WriteState::HeadersSent;
        }
        self.body.extend_from_slice(bytes);
    }

    /// Mark the response terminal: status, headers and body are all down.
    pub fn close_body(&mut self) {
        if self.state == WriteState::Unstarted {
            self.status = Some(200);
        }
        self.state = WriteState::BodySent;
    }

    /// Finalize into a transport-ready response, defaulting the status to
    /// 200 if nothing was ever committed.
    pub fn finish(self) -> HttpResponse {
        HttpResponse {
            status_code: self.status.unwrap_or(200),
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}
