//! Client IP extraction for rate limiting and logging.
//!
//! This module handles extracting the real client IP address from incoming
//! connections, including support for reverse proxy headers.

use axum::http::HeaderMap;
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

/// Extract the client IP address from headers and connection info.
///
/// M-702: Prevent rate-limit bypass by trusting x-forwarded-for only from known proxies.
/// M-737: Parse from right-to-left to prevent spoofing in multi-proxy chains.
///
/// In multi-proxy scenarios:
///   - Client connects to Proxy 1 -> Proxy 2 -> Server
///   - X-Forwarded-For: "client-ip, proxy1-ip"
///   - Attacker can prepend fake IPs to the header before hitting Proxy 1
///   - By parsing right-to-left and skipping trusted proxies, we find the actual client
pub fn extract_client_ip(
    headers: &HeaderMap,
    addr: SocketAddr,
    trusted_proxy_ips: &HashSet<IpAddr>,
) -> String {
    let peer_ip = addr.ip();

    if trusted_proxy_ips.contains(&peer_ip) {
        if let Some(forwarded) = headers.get("x-forwarded-for") {
            if let Ok(forwarded_str) = forwarded.to_str() {
                // Parse right-to-left: skip trusted proxies, return first untrusted IP
                for ip_str in forwarded_str.rsplit(',') {
                    let ip = ip_str.trim();
                    if let Ok(parsed) = ip.parse::<IpAddr>() {
                        // Skip IPs that are also trusted proxies (they added earlier hops)
                        if !trusted_proxy_ips.contains(&parsed) {
                            return parsed.to_string();
                        }
                    }
                }
                // All IPs in XFF are trusted proxies - shouldn't happen normally
                // Fall through to return peer_ip
            }
        }
    }

    peer_ip.to_string()
}
