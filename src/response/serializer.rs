use crate::response::types::{reason_phrase, HttpResponse};

/// Serialize a response in CGI style (`Status:` line instead of an HTTP
/// status line), the framing shared by the SCGI and FastCGI transports.
pub fn serialize_cgi_response(response: &HttpResponse) -> Vec<u8> {
    let mut out = Vec::with_capacity(response.body.len() + 128);
    out.extend_from_slice(
        format!(
            "Status: {} {}\r\n",
            response.status_code,
            reason_phrase(response.status_code)
        )
        .as_bytes(),
    );
    for (name, value) in &response.headers {
        out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&response.body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cgi_serialization_shape() {
        let response = HttpResponse {
            status_code: 404,
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
            body: b"missing".to_vec(),
        };
        let bytes = serialize_cgi_response(&response);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("Status: 404 Not Found\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.ends_with("\r\n\r\nmissing"));
    }
}
