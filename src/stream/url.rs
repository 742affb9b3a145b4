//! Stream endpoint URL normalization

use crate::error::{MonitorError, Result};

/// Path every stream endpoint is served under
pub const STREAM_PATH_SUFFIX: &str = "/stream";

/// Normalize a configured endpoint into a websocket URL.
///
/// `http` becomes `ws` and `https` becomes `wss`, one trailing `/` is
/// stripped, and the path is made to end in [`STREAM_PATH_SUFFIX`].
pub fn normalize_stream_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let (scheme, rest) = raw
        .split_once("://")
        .ok_or_else(|| MonitorError::InvalidUrl(format!("missing scheme: {raw}")))?;

    let scheme = match scheme.to_ascii_lowercase().as_str() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => {
            return Err(MonitorError::InvalidUrl(format!(
                "unsupported scheme '{other}' in {raw}"
            )))
        }
    };

    let rest = rest.strip_suffix('/').unwrap_or(rest);
    if rest.is_empty() {
        return Err(MonitorError::InvalidUrl(format!("missing host: {raw}")));
    }

    let mut url = format!("{scheme}://{rest}");
    if !url.ends_with(STREAM_PATH_SUFFIX) {
        url.push_str(STREAM_PATH_SUFFIX);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint_unchanged() {
        assert_eq!(
            normalize_stream_url("ws://127.0.0.1:8080/stream").unwrap(),
            "ws://127.0.0.1:8080/stream"
        );
    }

    #[test]
    fn test_http_schemes_coerced() {
        assert_eq!(
            normalize_stream_url("http://feed.local:8080").unwrap(),
            "ws://feed.local:8080/stream"
        );
        assert_eq!(
            normalize_stream_url("https://feed.example.com/").unwrap(),
            "wss://feed.example.com/stream"
        );
        assert_eq!(
            normalize_stream_url("HTTPS://feed.example.com/stream").unwrap(),
            "wss://feed.example.com/stream"
        );
    }

    #[test]
    fn test_single_trailing_separator_stripped() {
        assert_eq!(
            normalize_stream_url("wss://feed.example.com/stream/").unwrap(),
            "wss://feed.example.com/stream"
        );
        assert_eq!(
            normalize_stream_url("ws://host/api").unwrap(),
            "ws://host/api/stream"
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = normalize_stream_url("https://host:9443/").unwrap();
        assert_eq!(normalize_stream_url(&once).unwrap(), once);
    }

    #[test]
    fn test_invalid_urls_rejected() {
        assert!(matches!(
            normalize_stream_url("ftp://host"),
            Err(MonitorError::InvalidUrl(_))
        ));
        assert!(matches!(
            normalize_stream_url("127.0.0.1:8080"),
            Err(MonitorError::InvalidUrl(_))
        ));
        assert!(matches!(
            normalize_stream_url("ws://"),
            Err(MonitorError::InvalidUrl(_))
        ));
    }
}
