use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use tokio::net::TcpListener;
use tokio_rustls::rustls::ServerConfig as RustlsServerConfig;
use tokio_rustls::TlsAcceptor;
use tracing::{error, info};

use crate::errors::WeftError;
use crate::server::{http, Server};

/// TLS-wrapped HTTP listener: the same connection service as the plain
/// listener, behind a rustls handshake.
pub async fn serve(
    server: Arc<Server>,
    addr: &str,
    cert_path: &Path,
    key_path: &Path,
) -> Result<(), WeftError> {
    let tls_config = load_tls_config(cert_path, key_path)?;
    let acceptor = TlsAcceptor::from(Arc::new(tls_config));
    let listener = TcpListener::bind(addr).await?;
    info!(addr, "https listener started");
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
        let acceptor = acceptor.clone();
        tokio::spawn(async move {
            let tls_stream = match acceptor.accept(stream).await {
                Ok(tls_stream) => tls_stream,
                Err(err) => {
                    error!(%peer, error = %err, "tls handshake failed");
                    return;
                }
            };
            let io = TokioIo::new(tls_stream);
            let service = service_fn(move |req| http::handle_request(req, server.clone()));
            if let Err(err) = builder.serve_connection(io, service).await {
                error!(%peer, error = %err, "connection error");
            }
        });
    }
}

fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsServerConfig, WeftError> {
    let certs = rustls_pemfile::certs(&mut BufReader::new(File::open(cert_path)?))
        .collect::<Result<Vec<_>, _>>()?;
    let key = rustls_pemfile::private_key(&mut BufReader::new(File::open(key_path)?))?
        .ok_or_else(|| {
            WeftError::configuration(format!("no private key found in {}", key_path.display()))
        })?;

    RustlsServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| WeftError::configuration(format!("invalid TLS certificate/key: {e}")))
}
