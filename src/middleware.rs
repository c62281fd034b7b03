use crate::error::Error;
use crate::limiter::RateLimiter;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::{IpAddr, SocketAddr};
use tracing::{debug, error};

/// Admission-control stage. Runs ahead of every handler: resolves the
/// caller's address, charges one token against its bucket, and either
/// forwards the request untouched or short-circuits with 429.
///
/// When no address can be determined the stage fails closed with 500
/// instead of guessing an identity, since charging the wrong bucket would
/// silently corrupt another client's quota. No bucket is touched on that
/// path.
pub async fn admission_control(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let Some(ip) = client_ip(&request) else {
        error!(
            target: "gatekeeper::middleware",
            uri = %request.uri(),
            "unable to determine client address, rejecting request"
        );
        return Error::IdentityExtraction.into_response();
    };

    if !limiter.check(ip) {
        debug!(
            target: "gatekeeper::middleware",
            client_ip = %ip,
            uri = %request.uri(),
            "rate limit exceeded"
        );
        return Error::RateLimited.into_response();
    }

    next.run(request).await
}

/// Resolve the caller's address: trusted proxy headers first, then the
/// connection's peer address. Header values must parse as an IP; garbage is
/// ignored rather than used as a bucket key.
fn client_ip(request: &Request) -> Option<IpAddr> {
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first) = forwarded_str.split(',').next() {
                if let Ok(ip) = first.trim().parse() {
                    return Some(ip);
                }
            }
        }
    }

    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            if let Ok(ip) = ip_str.trim().parse() {
                return Some(ip);
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}
