//! Client address and user agent of a request, recorded on activity logs.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use portal_events::RequestContext;

/// Build the [`RequestContext`] for a request.
///
/// The address is the first `X-Forwarded-For` entry when present, then
/// `X-Real-IP`, then the peer address of the connection.
pub fn request_context(parts: &Parts) -> RequestContext {
    RequestContext {
        ip_address: client_ip(parts),
        user_agent: header_str(parts, USER_AGENT.as_str()).map(str::to_string),
    }
}

fn client_ip(parts: &Parts) -> Option<String> {
    header_str(parts, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .or_else(|| header_str(parts, "x-real-ip"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}
