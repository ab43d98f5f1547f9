pub mod fcgi;
pub mod http;
pub mod scgi;
pub mod tls;

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error, info};

use crate::context::Context;
use crate::errors::WeftError;
use crate::handler::{invoke, Handler, ReturnValue};
use crate::request::HttpRequest;
use crate::response::HttpResponse;
use crate::routing::{compile_route, parse_http_method, HttpMethod, MatchOutcome, RouteTable};

/// Process-wide options, set once at startup and read-only while serving.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Catch handler panics at the dispatch boundary and answer 500
    /// instead of letting the request's task die loudly.
    pub recover_panic: bool,
    /// ANSI colors in log output. Cosmetic only.
    pub color_output: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            recover_panic: true,
            color_output: true,
        }
    }
}

type RawHandler = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

/// The framework's hub: owns the route table and configuration, and
/// exposes the transport entry points. Applications construct one
/// explicitly and share it behind an [`Arc`]; there is no process-wide
/// singleton.
///
/// The route table sits behind a readers-writer lock: registration takes
/// the write lock, matching the read lock. The expected pattern is to
/// register everything before calling a `run_*` entry point, after which
/// dispatch is read-only and contention-free.
pub struct Server {
    config: ServerConfig,
    routes: RwLock<RouteTable>,
    raw_handlers: RwLock<HashMap<(String, HttpMethod), RawHandler>>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            routes: RwLock::new(RouteTable::new()),
            raw_handlers: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Compile `pattern` and append the route. Fails loudly on a
    /// malformed pattern or a handler whose arity does not fit the
    /// pattern's captures — never at match time.
    pub fn add_route(
        &self,
        pattern: &str,
        method: HttpMethod,
        handler: Handler,
    ) -> Result<(), WeftError> {
        let route = compile_route(pattern, method, handler)?;
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add_route(route);
        Ok(())
    }

    pub fn get(&self, pattern: &str, handler: Handler) -> Result<(), WeftError> {
        self.add_route(pattern, HttpMethod::GET, handler)
    }

    pub fn post(&self, pattern: &str, handler: Handler) -> Result<(), WeftError> {
        self.add_route(pattern, HttpMethod::POST, handler)
    }

    pub fn put(&self, pattern: &str, handler: Handler) -> Result<(), WeftError> {
        self.add_route(pattern, HttpMethod::PUT, handler)
    }

    pub fn delete(&self, pattern: &str, handler: Handler) -> Result<(), WeftError> {
        self.add_route(pattern, HttpMethod::DELETE, handler)
    }

    /// Register under an arbitrary verb, parsed case-insensitively.
    pub fn match_method(
        &self,
        method: &str,
        pattern: &str,
        handler: Handler,
    ) -> Result<(), WeftError> {
        self.add_route(pattern, parse_http_method(method), handler)
    }

    /// Thin adapter over `add_route` for websocket endpoints: the route
    /// registers under GET and the upgrade handshake is the transport
    /// collaborator's concern.
    pub fn websocket(&self, pattern: &str, handler: Handler) -> Result<(), WeftError> {
        self.add_route(pattern, HttpMethod::GET, handler)
    }

    /// Register a transport-level handler for an exact path, bypassing
    /// the router. Consulted by the HTTP and TLS listeners only; the
    /// SCGI and FastCGI transports always go through `process`.
    pub fn handle<F>(&self, path: &str, method: &str, raw: F)
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        self.raw_handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                (path.to_string(), parse_http_method(method)),
                Box::new(raw),
            );
    }

    /// Look up and invoke a raw handler for this request, if one is
    /// registered for its exact path and method.
    pub fn raw_response(&self, request: &HttpRequest) -> Option<HttpResponse> {
        let raw = self
            .raw_handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        raw.get(&(request.path.clone(), request.method.clone()))
            .map(|handler| handler(request))
    }

    /// The single chokepoint every transport funnels into: build a
    /// Context, match a route, invoke the handler, finalize the
    /// response. Handler panics are converted into 500s here when
    /// `recover_panic` is set, so the serving loop never dies with a
    /// request.
    pub fn process(&self, request: &HttpRequest) -> HttpResponse {
        let response = self.dispatch(request);
        info!(
            method = %request.method,
            path = %request.path,
            status = response.status_code,
        );
        response
    }

    fn dispatch(&self, request: &HttpRequest) -> HttpResponse {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        match routes.match_route(&request.path, &request.method) {
            MatchOutcome::Found {
                index,
                captures,
                params,
            } => {
                let route = routes.get(index);
                let mut ctx = Context::new(request, self, params);
                let outcome = if self.config.recover_panic {
                    catch_unwind(AssertUnwindSafe(|| {
                        invoke(&route.handler, &mut ctx, &captures)
                    }))
                } else {
                    Ok(invoke(&route.handler, &mut ctx, &captures))
                };
                match outcome {
                    Ok(value) => {
                        apply_return(&mut ctx, value);
                        ctx.finish()
                    }
                    Err(panic) => {
                        let failure = WeftError::HandlerFailure {
                            pattern: route.pattern.clone(),
                            message: panic_message(&panic).to_string(),
                        };
                        error!(
                            error = %failure,
                            path = %request.path,
                            captures = ?captures,
                            "handler panicked; responding 500"
                        );
                        html_error(500, "Server Error")
                    }
                }
            }
            MatchOutcome::MethodMismatch { allowed } => {
                let allow = allowed
                    .iter()
                    .map(|m| m.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut response = html_error(405, "Method Not Allowed");
                response.headers.push(("Allow".to_string(), allow));
                response
            }
            MatchOutcome::Miss => {
                let miss = WeftError::NoMatch {
                    method: request.method.to_string(),
                    path: request.path.clone(),
                };
                debug!(error = %miss);
                html_error(404, "Page not found")
            }
        }
    }

    /// Serve plain HTTP on `addr` (e.g. `"127.0.0.1:8080"`).
    pub async fn run(self: Arc<Self>, addr: &str) -> Result<(), WeftError> {
        http::serve(self, addr).await
    }

    /// Serve TLS-wrapped HTTP using the given PEM certificate chain and
    /// private key.
    pub async fn run_tls(
        self: Arc<Self>,
        addr: &str,
        cert_path: &Path,
        key_path: &Path,
    ) -> Result<(), WeftError> {
        tls::serve(self, addr, cert_path, key_path).await
    }

    /// Serve SCGI on `addr`, typically behind a fronting web server.
    pub async fn run_scgi(self: Arc<Self>, addr: &str) -> Result<(), WeftError> {
        scgi::serve(self, addr).await
    }

    /// Serve FastCGI (responder role) on `addr`.
    pub async fn run_fcgi(self: Arc<Self>, addr: &str) -> Result<(), WeftError> {
        fcgi::serve(self, addr).await
    }
}

/// Write the handler's returned value to the body, unless the handler
/// already took control of the response through the Context — in that
/// case the return value is discarded rather than duplicating a write.
fn apply_return(ctx: &mut Context<'_>, value: ReturnValue) {
    if ctx.response_started() {
        return;
    }
    match value {
        ReturnValue::None => {}
        ReturnValue::Text(text) => ctx.write_string(&text),
        ReturnValue::Bytes(bytes) => ctx.write(&bytes),
    }
}

fn html_error(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status_code: status,
        headers: vec![(
            "Content-Type".to_string(),
            "text/html; charset=utf-8".to_string(),
        )],
        body: body.as_bytes().to_vec(),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
