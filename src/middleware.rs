//! HTTP access-log middleware for axum.
//!
//! ```no_run
//! use std::sync::Arc;
//! use axum::{middleware::from_fn_with_state, routing::get, Router};
//! use ctxlog::{middleware::{access_log, AccessLog}, Logger, LoggerConfig};
//!
//! let logger = Arc::new(Logger::builder(LoggerConfig::default()).build());
//! let app: Router = Router::new()
//!     .route("/users/{id}", get(|| async { "ok" }))
//!     .layer(from_fn_with_state(AccessLog::new(logger, ["/healthz"]), access_log));
//! ```
//!
//! The request-scoped [`LogContext`] is read from the request extensions.
//! A handler that learns more (an authenticated user id, say) can return
//! an updated `LogContext` as a response extension; it takes precedence.

use crate::context::LogContext;
use crate::pipeline::Logger;
use crate::record::HttpRecord;
use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, REFERER, USER_AGENT};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const TRUE_CLIENT_IP: HeaderName = HeaderName::from_static("true-client-ip");

/// What happens to a request whose path is on the exclusion list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExcludePolicy {
    /// Answer `200 OK` with an empty body without calling the handler.
    #[default]
    SkipHandler,
    /// Call the handler as usual and only skip the access log.
    ServeUnlogged,
}

/// Middleware state: the logger plus the exact paths never logged.
#[derive(Clone, Debug)]
pub struct AccessLog {
    logger: Arc<Logger>,
    excludes: Arc<HashSet<String>>,
    policy: ExcludePolicy,
}

impl AccessLog {
    pub fn new<I, S>(logger: Arc<Logger>, excludes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            logger,
            excludes: Arc::new(excludes.into_iter().map(Into::into).collect()),
            policy: ExcludePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ExcludePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Exact match against the escaped request path.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excludes.contains(path)
    }
}

/// Client address: first entry of `X-Forwarded-For`, else the IP of the
/// connection's remote address. Empty when neither is known.
pub fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    match forwarded {
        Some(ip) => ip.to_string(),
        None => remote.map(|addr| addr.ip().to_string()).unwrap_or_default(),
    }
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Times the wrapped handler and writes one access-log record per request.
///
/// Use with [`axum::middleware::from_fn_with_state`].
pub async fn access_log(State(access): State<AccessLog>, mut req: Request, next: Next) -> Response {
    if access.is_excluded(req.uri().path()) {
        return match access.policy {
            ExcludePolicy::SkipHandler => StatusCode::OK.into_response(),
            ExcludePolicy::ServeUnlogged => next.run(req).await,
        };
    }

    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let remote_ip = client_ip(req.headers(), remote);
    if let Ok(value) = HeaderValue::from_str(&remote_ip) {
        req.headers_mut().append(X_FORWARDED_FOR, value.clone());
        req.headers_mut().append(TRUE_CLIENT_IP, value);
    }

    let mut record = HttpRecord {
        method: req.method().to_string(),
        url: req.uri().to_string(),
        remote_ip,
        route: req
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_default(),
        user_agent: header_str(req.headers(), USER_AGENT),
        referer: header_str(req.headers(), REFERER),
        protocol: Some(format!("{:?}", req.version())),
        ..HttpRecord::default()
    };
    let request_ctx = req.extensions().get::<LogContext>().cloned();

    let start = Instant::now();
    let response = next.run(req).await;
    record.latency = start.elapsed();
    record.status = response.status().as_u16();

    let ctx = response
        .extensions()
        .get::<LogContext>()
        .cloned()
        .or(request_ctx)
        .unwrap_or_default();
    access.logger.http(&ctx, &record);

    response
}
