//! Header extraction and admission control for the HTTP dispatcher (§4.7).

use http::{HeaderMap, HeaderValue};

pub const SESSION_HEADER: &str = "mcp-session-id";
pub const PROTOCOL_VERSION_HEADER: &str = "mcp-protocol-version";

pub fn extract_session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

pub fn extract_protocol_version(headers: &HeaderMap) -> Option<String> {
    headers
        .get(PROTOCOL_VERSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

pub fn accepts_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/event-stream"))
        .unwrap_or(false)
}

/// DNS-rebinding defense (§4.7): only loopback `Host`/`Origin` values are
/// admitted. A request with neither header present is treated as local
/// (covers direct, non-browser clients such as CLI tools and curl).
pub fn is_local_origin(headers: &HeaderMap) -> bool {
    let origin = headers.get(http::header::ORIGIN);
    let host = headers.get(http::header::HOST);

    match (origin, host) {
        (Some(origin), _) => is_local_authority(origin),
        (None, Some(host)) => is_local_authority(host),
        (None, None) => true,
    }
}

fn is_local_authority(value: &HeaderValue) -> bool {
    let Ok(text) = value.to_str() else {
        return false;
    };
    let authority = text
        .trim_start_matches("http://")
        .trim_start_matches("https://");
    let host = authority.split(':').next().unwrap_or(authority);
    matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (k, v) in pairs {
            headers.insert(
                http::HeaderName::from_bytes(k.as_bytes()).unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        headers
    }

    #[test]
    fn loopback_origin_is_local() {
        let headers = headers_with(&[("origin", "http://127.0.0.1:8080")]);
        assert!(is_local_origin(&headers));
    }

    #[test]
    fn remote_origin_is_rejected() {
        let headers = headers_with(&[("origin", "http://evil.example.com")]);
        assert!(!is_local_origin(&headers));
    }

    #[test]
    fn absent_origin_and_host_is_local() {
        assert!(is_local_origin(&HeaderMap::new()));
    }

    #[test]
    fn session_id_round_trips_through_header() {
        let headers = headers_with(&[("mcp-session-id", "abc-123")]);
        assert_eq!(extract_session_id(&headers).as_deref(), Some("abc-123"));
    }
}
