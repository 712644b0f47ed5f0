//! Client IP resolution for the trusted-subnet check.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Resolves the client IP with header precedence
/// `X-Real-IP` > `X-Forwarded-For` > socket peer.
///
/// Only the first entry of a comma-separated `X-Forwarded-For` list is
/// considered. Returns `None` when no candidate parses as an IP address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    if let Some(ip) = header_ip(headers, "x-real-ip") {
        return Some(ip);
    }
    if let Some(ip) = header_ip(headers, "x-forwarded-for") {
        return Some(ip);
    }
    peer.map(|addr| addr.ip())
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::try_from(*name).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_real_ip_takes_precedence() {
        let headers = headers(&[("x-real-ip", "10.0.0.1"), ("x-forwarded-for", "10.0.0.2")]);
        let peer: SocketAddr = "192.168.1.1:1234".parse().unwrap();

        assert_eq!(
            client_ip(&headers, Some(peer)),
            Some("10.0.0.1".parse().unwrap())
        );
    }

    #[test]
    fn test_forwarded_for_first_entry() {
        let headers = headers(&[("x-forwarded-for", "10.0.0.2, 172.16.0.1")]);

        assert_eq!(
            client_ip(&headers, None),
            Some("10.0.0.2".parse().unwrap())
        );
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let peer: SocketAddr = "192.168.1.1:1234".parse().unwrap();

        assert_eq!(
            client_ip(&HeaderMap::new(), Some(peer)),
            Some("192.168.1.1".parse().unwrap())
        );
    }

    #[test]
    fn test_unparseable_headers_yield_none() {
        let headers = headers(&[("x-real-ip", "not-an-ip")]);

        assert_eq!(client_ip(&headers, None), None);
    }
}
