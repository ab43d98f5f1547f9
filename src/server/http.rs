use std::collections::HashMap;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::errors::WeftError;
use crate::request::{parse_query_string, HttpRequest};
use crate::response::HttpResponse;
use crate::routing::parse_http_method;
use crate::server::Server;

/// Plain-HTTP listener. One tokio task per accepted connection; every
/// request funnels into `Server::process` after the raw-handler check.
pub async fn serve(server: Arc<Server>, addr: &str) -> Result<(), WeftError> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr, "http listener started");
    let builder = Builder::new(TokioExecutor::new());

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "accept failed");
                continue;
            }
        };
        let server = server.clone();
        let builder = builder.clone();
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| handle_request(req, server.clone()));
            if let Err(err) = builder.serve_connection(io, service).await {
                error!(%peer, error = %err, "connection error");
            }
        });
    }
}

pub(crate) async fn handle_request(
    req: Request<Incoming>,
    server: Arc<Server>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let request = read_request(req).await?;
    let response = server
        .raw_response(&request)
        .unwrap_or_else(|| server.process(&request));
    Ok(to_hyper(response))
}

async fn read_request(req: Request<Incoming>) -> Result<HttpRequest, hyper::Error> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await?.to_bytes();

    let mut headers = HashMap::new();
    for (name, value) in parts.headers.iter() {
        if let Ok(value) = value.to_str() {
            headers.insert(name.as_str().to_string(), value.to_string());
        }
    }

    Ok(HttpRequest {
        method: parse_http_method(parts.method.as_str()),
        path: parts.uri.path().to_string(),
        headers,
        query_params: parse_query_string(parts.uri.query().unwrap_or("")),
        body: body.to_vec(),
    })
}

fn to_hyper(response: HttpResponse) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(response.status_code);
    for (name, value) in &response.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
        .body(Full::from(response.body))
        .unwrap_or_else(|e| {
            error!(error = %e, "failed to build response; degrading to bare 500");
            Response::builder()
                .status(500)
                .body(Full::from(Bytes::new()))
                .unwrap()
        })
}
