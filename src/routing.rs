//! Upstream URL normalization shared by the ApiExposure handler and
//! admission rule validation (§4.6, §8 boundary behaviors).

use url::Url;

use crate::errors::{Error, Result};
use crate::model::kinds::gateway::Upstream;

/// Parses an absolute `http(s)` URL into `{scheme, host, port, path}`,
/// defaulting the port per scheme and the path to `/` when absent.
///
/// ```
/// use rover_engine::routing::parse_upstream_url;
/// let u = parse_upstream_url("https://h").unwrap();
/// assert_eq!((u.scheme.as_str(), u.host.as_str(), u.port, u.path.as_str()), ("https", "h", 443, "/"));
/// let u = parse_upstream_url("http://h").unwrap();
/// assert_eq!(u.port, 80);
/// let u = parse_upstream_url("https://h:8443/p").unwrap();
/// assert_eq!((u.port, u.path.as_str()), (8443, "/p"));
/// ```
pub fn parse_upstream_url(raw: &str) -> Result<Upstream> {
    let url = Url::parse(raw).map_err(|e| Error::Fatal(format!("invalid upstream url {raw:?}: {e}")))?;
    let scheme = url.scheme().to_string();
    let port = url
        .port()
        .or_else(|| match scheme.as_str() {
            "https" => Some(443),
            "http" => Some(80),
            _ => None,
        })
        .ok_or_else(|| Error::Fatal(format!("upstream url {raw:?} has no resolvable port")))?;
    let host = url.host_str().ok_or_else(|| Error::Fatal(format!("upstream url {raw:?} has no host")))?.to_string();
    let path = if url.path().is_empty() { "/".to_string() } else { url.path().to_string() };
    Ok(Upstream { scheme, host, port, path, weight: None })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_port_by_scheme() {
        assert_eq!(parse_upstream_url("https://h").unwrap().port, 443);
        assert_eq!(parse_upstream_url("http://h").unwrap().port, 80);
    }

    #[test]
    fn keeps_explicit_port_and_path() {
        let u = parse_upstream_url("https://h:8443/p").unwrap();
        assert_eq!(u.port, 8443);
        assert_eq!(u.path, "/p");
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(parse_upstream_url("ftp://h").is_err());
    }
}
