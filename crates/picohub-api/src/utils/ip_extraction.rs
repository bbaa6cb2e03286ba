//! Client address resolution for per-client admission control
//!
//! The rate limiter keys on the caller's IP. Behind reverse proxies the socket
//! peer is the proxy, so the `X-Forwarded-For` chain is consulted, trusting
//! only the last `trusted_proxy_count` hops.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Resolve the client address from forwarding headers, falling back to the
/// socket peer. `None` when nothing yields a valid address.
pub fn client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> Option<IpAddr> {
    header_str(headers, "x-forwarded-for")
        .and_then(|chain| from_forwarded_for(chain, trusted_proxy_count))
        .or_else(|| header_str(headers, "x-real-ip").and_then(|ip| ip.trim().parse().ok()))
        .or_else(|| socket_addr.map(SocketAddr::ip))
}

/// Rate limiting key for the caller: `ip:<addr>`, or `ip:unknown` when the
/// address cannot be resolved.
pub fn client_key(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    match client_ip(headers, socket_addr, trusted_proxy_count) {
        Some(ip) => format!("ip:{}", ip),
        None => "ip:unknown".to_string(),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Chain order is `client, proxy1, proxy2, ...`. With N trusted proxies the
/// client sits just before the last N entries. With none trusted, or a chain
/// too short to contain the trusted hops, the closest entry is used.
fn from_forwarded_for(chain: &str, trusted_proxy_count: usize) -> Option<IpAddr> {
    let hops: Vec<&str> = chain
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let pos = if trusted_proxy_count == 0 || hops.len() <= trusted_proxy_count {
        hops.len().checked_sub(1)?
    } else {
        hops.len() - trusted_proxy_count - 1
    };

    hops.get(pos)?.parse().ok()
}
