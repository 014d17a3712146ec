//! Administrative trust gate.
//!
//! Every privileged HTTP request passes the same ordered checks before
//! any handler touches the store: route admission, IP allow-list, rate
//! limit, signature freshness, role. The first failing check
//! short-circuits; nothing is retained across requests except the
//! rate-limit counters.

pub use rate_limit::RateLimiter;
pub use signature::{capability_query, sign, verify};

pub mod rate_limit;
pub mod signature;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::state::{Role, ServiceConfig};

/// Administrative routes the gate will admit. Anything else is a 404,
/// indistinguishable from a path that never existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    ContestsCsv,
    AuditReport,
    MetricsReport,
    AlertsReport,
    MetricsCsv,
    Action,
    Health,
}

impl Route {
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/" | "/dashboard" => Some(Self::Dashboard),
            "/contests.csv" => Some(Self::ContestsCsv),
            "/reports/audit.json" => Some(Self::AuditReport),
            "/reports/metrics.json" => Some(Self::MetricsReport),
            "/reports/alerts.json" => Some(Self::AlertsReport),
            "/metrics.csv" => Some(Self::MetricsCsv),
            "/action" => Some(Self::Action),
            "/healthz" => Some(Self::Health),
            _ => None,
        }
    }

    /// Stable key for per-route rate-limit buckets.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::ContestsCsv => "contests_csv",
            Self::AuditReport => "audit_report",
            Self::MetricsReport => "metrics_report",
            Self::AlertsReport => "alerts_report",
            Self::MetricsCsv => "metrics_csv",
            Self::Action => "action",
            Self::Health => "health",
        }
    }
}

/// Normalized inbound request, produced by the HTTP shim. The gate never
/// sees raw framework types.
#[derive(Debug, Clone)]
pub struct AdminRequest {
    pub path: String,
    pub remote_addr: IpAddr,
    /// Declared body size, if the request carries one.
    pub content_length: Option<u64>,
    pub uid: Option<String>,
    pub ts: Option<String>,
    pub sig: Option<String>,
}

/// Terminal rejection states, one per check. Carries exactly enough for
/// the caller to map to an HTTP status without leaking secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denied {
    UnknownRoute,
    PayloadTooLarge,
    IpNotAllowed,
    RateLimited { retry_after: Duration },
    BadSignature,
    InsufficientRole,
}

impl Denied {
    pub fn status(&self) -> u16 {
        match self {
            Self::UnknownRoute => 404,
            Self::PayloadTooLarge => 413,
            Self::IpNotAllowed | Self::InsufficientRole => 403,
            Self::RateLimited { .. } => 429,
            Self::BadSignature => 401,
        }
    }
}

/// A request that cleared the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Liveness probe; no identity attached.
    Open { route: Route },
    Admin {
        route: Route,
        user_id: String,
        role: Role,
    },
}

pub struct AdminGate {
    cfg: Arc<ServiceConfig>,
    limiter: RateLimiter,
}

impl AdminGate {
    pub fn new(cfg: Arc<ServiceConfig>) -> Self {
        let limiter = RateLimiter::new(cfg.rate_limit_max, cfg.rate_window);
        Self { cfg, limiter }
    }

    /// Runs a request through the gate.
    ///
    /// Check order, each a hard gate with its own terminal rejection:
    /// 1. Route admission: unknown paths are not-found, not unauthorized.
    ///    The liveness route is admitted without identity. A declared body
    ///    above the configured cap on the action route is rejected before
    ///    anything is buffered.
    /// 2. IP allow-list: client address normalized (IPv4-mapped IPv6
    ///    collapsed) then matched; an empty list allows everyone.
    /// 3. Rate limit: fixed window per `(client, route)`.
    /// 4. Signature and freshness: recomputed HMAC compared in constant
    ///    time, timestamp bounded by the token TTL in both directions.
    /// 5. Role: the authenticated user must sit at moderator or above.
    pub async fn authenticate(
        &self,
        request: &AdminRequest,
        now: DateTime<Utc>,
    ) -> Result<Admission, Denied> {
        let route = Route::from_path(&request.path).ok_or(Denied::UnknownRoute)?;
        if route == Route::Health {
            return Ok(Admission::Open { route });
        }
        if route == Route::Action {
            if let Some(length) = request.content_length {
                if length > self.cfg.max_body_bytes {
                    return Err(Denied::PayloadTooLarge);
                }
            }
        }

        let client = normalize_client_addr(request.remote_addr);
        if !self.cfg.ip_allowlist.is_empty() && !self.cfg.ip_allowlist.contains(&client) {
            return Err(Denied::IpNotAllowed);
        }

        self.limiter
            .check(client, route.key(), now)
            .await
            .map_err(|retry_after| Denied::RateLimited { retry_after })?;

        let (uid, ts, sig) = match (&request.uid, &request.ts, &request.sig) {
            (Some(uid), Some(ts), Some(sig)) => (uid, ts, sig),
            _ => return Err(Denied::BadSignature),
        };
        if !verify(&self.cfg.secret, uid, ts, sig, now, self.cfg.token_ttl) {
            return Err(Denied::BadSignature);
        }

        if !self.cfg.is_privileged(uid) {
            return Err(Denied::InsufficientRole);
        }

        Ok(Admission::Admin {
            route,
            user_id: uid.clone(),
            role: self.cfg.role_of(uid),
        })
    }
}

/// Collapses IPv4-mapped IPv6 addresses so allow-list entries written as
/// plain IPv4 match clients arriving over dual-stack sockets.
pub fn normalize_client_addr(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    }
}
