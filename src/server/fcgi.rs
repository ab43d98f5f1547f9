use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use crate::errors::WeftError;
use crate::request::request_from_cgi_params;
use crate::response::serialize_cgi_response;
use crate::server::Server;

const FCGI_BEGIN_REQUEST: u8 = 1;
const FCGI_ABORT_REQUEST: u8 = 2;
const FCGI_END_REQUEST: u8 = 3;
const FCGI_PARAMS: u8 = 4;
const FCGI_STDIN: u8 = 5;
const FCGI_STDOUT: u8 = 6;

const FCGI_KEEP_CONN: u8 = 1;
const FCGI_REQUEST_COMPLETE: u8 = 0;

/// FastCGI listener, responder role only. Raw `handle` registrations are
/// not consulted here; everything goes through `Server::process`.
pub async fn serve(server: Arc<Server>, addr: &str) -> Result<(), WeftError> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr, "fcgi listener started");

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
                error!(%peer, error = %err, "fcgi connection failed");
            }
        });
    }
}

struct Record {
    rtype: u8,
    request_id: u16,
    content: Vec<u8>,
}

async fn handle_connection(server: Arc<Server>, mut stream: TcpStream) -> Result<(), WeftError> {
    loop {
        // A clean EOF between requests is the peer closing the channel.
        let begin = match read_record(&mut stream).await {
            Ok(record) => record,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if begin.rtype != FCGI_BEGIN_REQUEST {
            warn!(rtype = begin.rtype, "expected BEGIN_REQUEST; dropping record");
            continue;
        }
        let request_id = begin.request_id;
        let keep_connection = begin
            .content
            .get(2)
            .map(|flags| flags & FCGI_KEEP_CONN != 0)
            .unwrap_or(false);

        let mut param_bytes = Vec::new();
        let mut stdin = Vec::new();
        let mut aborted = false;
        loop {
            let record = read_record(&mut stream).await?;
            match record.rtype {
                FCGI_PARAMS if !record.content.is_empty() => {
                    param_bytes.extend_from_slice(&record.content);
                }
                FCGI_PARAMS => {}
                FCGI_STDIN if !record.content.is_empty() => {
                    stdin.extend_from_slice(&record.content);
                }
                FCGI_STDIN => break,
                FCGI_ABORT_REQUEST => {
                    aborted = true;
                    break;
                }
                other => {
                    warn!(rtype = other, "unexpected fcgi record; dropping");
                }
            }
        }

        if !aborted {
            let params = decode_pairs(&param_bytes)?;
            let request = request_from_cgi_params(&params, stdin)?;
            let response = server.process(&request);
            let payload = serialize_cgi_response(&response);
            for chunk in payload.chunks(u16::MAX as usize) {
                write_record(&mut stream, FCGI_STDOUT, request_id, chunk).await?;
            }
            write_record(&mut stream, FCGI_STDOUT, request_id, &[]).await?;
        }
        write_end_request(&mut stream, request_id).await?;
        stream.flush().await?;

        if !keep_connection {
            stream.shutdown().await?;
            return Ok(());
        }
    }
}

async fn read_record<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Record> {
    let mut header = [0u8; 8];
    reader.read_exact(&mut header).await?;
    let content_length = u16::from_be_bytes([header[4], header[5]]) as usize;
    let padding_length = header[6] as usize;

    let mut content = vec![0u8; content_length];
    reader.read_exact(&mut content).await?;
    let mut padding = vec![0u8; padding_length];
    reader.read_exact(&mut padding).await?;

    Ok(Record {
        rtype: header[1],
        request_id: u16::from_be_bytes([header[2], header[3]]),
        content,
    })
}

async fn write_record<W: AsyncWrite + Unpin>(
    writer: &mut W,
    rtype: u8,
    request_id: u16,
    content: &[u8],
) -> io::Result<()> {
    let id = request_id.to_be_bytes();
    let len = (content.len() as u16).to_be_bytes();
    let header = [1, rtype, id[0], id[1], len[0], len[1], 0, 0];
    writer.write_all(&header).await?;
    writer.write_all(content).await
}

async fn write_end_request<W: AsyncWrite + Unpin>(
    writer: &mut W,
    request_id: u16,
) -> io::Result<()> {
    let body = [0, 0, 0, 0, FCGI_REQUEST_COMPLETE, 0, 0, 0];
    write_record(writer, FCGI_END_REQUEST, request_id, &body).await
}

/// Decode FastCGI name-value pairs: each length is one byte, or four
/// bytes with the high bit set on the first.
fn decode_pairs(data: &[u8]) -> Result<HashMap<String, String>, WeftError> {
    let mut params = HashMap::new();
    let mut i = 0usize;
    while i < data.len() {
        let (name_len, used) = decode_length(data, i)?;
        i += used;
        let (value_len, used) = decode_length(data, i)?;
        i += used;
        if i + name_len + value_len > data.len() {
            return Err(WeftError::configuration("truncated fcgi name-value pair"));
        }
        let name = String::from_utf8_lossy(&data[i..i + name_len]).into_owned();
        i += name_len;
        let value = String::from_utf8_lossy(&data[i..i + value_len]).into_owned();
        i += value_len;
        params.insert(name, value);
    }
    Ok(params)
}

fn decode_length(data: &[u8], i: usize) -> Result<(usize, usize), WeftError> {
    let first = *data
        .get(i)
        .ok_or_else(|| WeftError::configuration("truncated fcgi length"))?;
    if first & 0x80 == 0 {
        return Ok((first as usize, 1));
    }
    if i + 4 > data.len() {
        return Err(WeftError::configuration("truncated fcgi length"));
    }
    let len = ((first as usize & 0x7f) << 24)
        | ((data[i + 1] as usize) << 16)
        | ((data[i + 2] as usize) << 8)
        | (data[i + 3] as usize);
    Ok((len, 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pairs_short_lengths() {
        let mut data = Vec::new();
        data.push(14u8);
        data.push(3u8);
        data.extend_from_slice(b"REQUEST_METHOD");
        data.extend_from_slice(b"GET");
        let params = decode_pairs(&data).unwrap();
        assert_eq!(params.get("REQUEST_METHOD"), Some(&"GET".to_string()));
    }

    #[test]
    fn test_decode_pairs_long_value_length() {
        let value = vec![b'x'; 300];
        let mut data = Vec::new();
        data.push(1u8);
        data.extend_from_slice(&(300u32 | 0x8000_0000).to_be_bytes());
        data.push(b'K');
        data.extend_from_slice(&value);
        let params = decode_pairs(&data).unwrap();
        assert_eq!(params.get("K").map(|v| v.len()), Some(300));
    }

    #[test]
    fn test_decode_pairs_truncated() {
        assert!(decode_pairs(&[5u8, 1u8, b'a']).is_err());
    }
}
