use std::{net::IpAddr, str::FromStr};

use actix_web::HttpRequest;
use log::{debug, trace};
use regex::Regex;

/// Resolve the caller's IP address, in decreasing order of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
///
/// The header sources must be opt-in: both are trivially spoofable unless a trusted reverse proxy sets them.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    x_forwarded_for_ip(req, use_x_forwarded_for)
        .or_else(|| forwarded_ip(req, use_forwarded))
        .or_else(|| peer_ip(req))
}

fn x_forwarded_for_ip(req: &HttpRequest, enabled: bool) -> Option<IpAddr> {
    if !enabled {
        return None;
    }
    let ip = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| IpAddr::from_str(s.trim()).ok());
    if let Some(ip) = ip {
        debug!("Using X-Forwarded-For header for remote address: {ip}");
    }
    ip
}

fn forwarded_ip(req: &HttpRequest, enabled: bool) -> Option<IpAddr> {
    if !enabled {
        return None;
    }
    let re = Regex::new(r#"for=(?P<ip>[^;,\s]+)"#).ok()?;
    let ip = req
        .headers()
        .get("Forwarded")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| re.captures(v))
        .and_then(|caps| caps.name("ip"))
        .and_then(|m| IpAddr::from_str(m.as_str().trim_matches('"')).ok());
    if let Some(ip) = ip {
        debug!("Using Forwarded header for remote address: {ip}");
    }
    ip
}

fn peer_ip(req: &HttpRequest) -> Option<IpAddr> {
    let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
    trace!("Using Peer address for remote address: {:?}", peer_addr);
    peer_addr.and_then(|s| IpAddr::from_str(&s).ok())
}
