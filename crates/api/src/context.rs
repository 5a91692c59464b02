use std::net::SocketAddr;

use axum::{
    extract::ConnectInfo,
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use erpguard_auth::SourceContext;

/// Derive the audit source of a request.
///
/// The client address is the first `X-Forwarded-For` hop when present, else
/// the peer address. Either part may be absent.
pub fn source_from_parts(headers: &HeaderMap, peer: Option<SocketAddr>) -> SourceContext {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let ip_address = forwarded.or_else(|| peer.map(|addr| addr.ip().to_string()));
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    SourceContext::new(ip_address, user_agent)
}

/// Attach a [`SourceContext`] to every request.
pub async fn source_context_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let source = source_from_parts(req.headers(), peer);
    req.extensions_mut().insert(source);
    next.run(req).await
}
