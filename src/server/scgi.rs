use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info};

use crate::errors::WeftError;
use crate::request::request_from_cgi_params;
use crate::response::serialize_cgi_response;
use crate::server::Server;

/// Upper bound on the netstring header block a fronting server may send.
const MAX_HEADER_BLOCK: usize = 1 << 20;

/// SCGI listener. The fronting web server sends one request per
/// connection: a netstring-framed header block followed by the body.
/// Raw `handle` registrations are not consulted here; everything goes
/// through `Server::process`.
pub async fn serve(server: Arc<Server>, addr: &str) -> Result<(), WeftError> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr, "scgi listener started");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "accept failed");
                continue;
            }
        };
        let server = server.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(server, stream).await {
                error!(%peer, error = %err, "scgi request failed");
            }
        });
    }
}

async fn handle_connection(server: Arc<Server>, mut stream: TcpStream) -> Result<(), WeftError> {
    let params = read_header_netstring(&mut stream).await?;

    let content_length: usize = params
        .get("CONTENT_LENGTH")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; content_length];
    stream.read_exact(&mut body).await?;

    let request = request_from_cgi_params(&params, body)?;
    let response = server.process(&request);

    stream.write_all(&serialize_cgi_response(&response)).await?;
    stream.shutdown().await?;
    Ok(())
}

async fn read_header_netstring(
    stream: &mut TcpStream,
) -> Result<HashMap<String, String>, WeftError> {
    let mut len = 0usize;
    loop {
        let byte = stream.read_u8().await?;
        match byte {
            b'0'..=b'9' => {
                len = len * 10 + (byte - b'0') as usize;
                if len > MAX_HEADER_BLOCK {
                    return Err(WeftError::configuration("scgi header block too large"));
                }
            }
            b':' => break,
            _ => {
                return Err(WeftError::configuration(
                    "malformed scgi netstring length",
                ))
            }
        }
    }

    let mut block = vec![0u8; len];
    stream.read_exact(&mut block).await?;
    if stream.read_u8().await? != b',' {
        return Err(WeftError::configuration("scgi netstring missing terminator"));
    }

    parse_header_block(&block)
}

/// Decode the NUL-separated `name\0value\0...` pairs of an SCGI header
/// block.
fn parse_header_block(block: &[u8]) -> Result<HashMap<String, String>, WeftError> {
    let mut params = HashMap::new();
    let mut fields = block.split(|b| *b == 0);
    while let (Some(name), Some(value)) = (fields.next(), fields.next()) {
        if name.is_empty() {
            break;
        }
        let name = std::str::from_utf8(name)
            .map_err(|_| WeftError::configuration("non-UTF-8 scgi header name"))?;
        let value = String::from_utf8_lossy(value).into_owned();
        params.insert(name.to_string(), value);
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_block() {
        let block = b"REQUEST_METHOD\0GET\0REQUEST_URI\0/hello\0CONTENT_LENGTH\00\0";
        let params = parse_header_block(block).unwrap();
        assert_eq!(params.get("REQUEST_METHOD"), Some(&"GET".to_string()));
        assert_eq!(params.get("REQUEST_URI"), Some(&"/hello".to_string()));
        assert_eq!(params.get("CONTENT_LENGTH"), Some(&"0".to_string()));
    }

    #[test]
    fn test_parse_header_block_empty() {
        assert!(parse_header_block(b"").unwrap().is_empty());
    }
}
