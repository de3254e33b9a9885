//! Governor-based per-client rate limiting for the credential endpoints.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::ApiError;
use crate::config::AuthRateLimitConfig;

pub type KeyedLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// Shared limiter, `None` when rate limiting is disabled.
pub type SharedLimiter = Option<Arc<KeyedLimiter>>;

/// Burst of `max_requests`, refilled evenly across `window_seconds`.
#[must_use]
pub fn create_limiter(config: &AuthRateLimitConfig) -> SharedLimiter {
    if !config.enabled {
        return None;
    }

    let burst = NonZeroU32::new(config.max_requests)?;
    let period = Duration::from_secs(config.window_seconds) / burst.get();
    let quota = Quota::with_period(period)?.allow_burst(burst);

    Some(Arc::new(RateLimiter::keyed(quota)))
}

/// Peer address from the connection; unspecified when served without
/// connect info (e.g. in-process tests).
fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ConnectInfo(addr)| {
            addr.ip()
        })
}

/// Returns 429 once a client exceeds its allowance.
pub async fn rate_limit_middleware(
    State(limiter): State<SharedLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(limiter) = limiter {
        let ip = client_ip(&req);
        if limiter.check_key(&ip).is_err() {
            warn!(client_ip = %ip, path = %req.uri().path(), "Auth rate limit exceeded");
            return ApiError::rate_limited("Too many requests, please try again later")
                .into_response();
        }
    }

    next.run(req).await
}

/// Drops per-client state that has fully replenished.
pub fn spawn_pruner(limiter: SharedLimiter) {
    let Some(limiter) = limiter else {
        return;
    };
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            limiter.retain_recent();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_reject() {
        let limiter = create_limiter(&AuthRateLimitConfig {
            enabled: true,
            max_requests: 3,
            window_seconds: 900,
        })
        .unwrap();

        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        for _ in 0..3 {
            assert!(limiter.check_key(&ip).is_ok());
        }
        assert!(limiter.check_key(&ip).is_err());

        let other: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limiter.check_key(&other).is_ok());
    }

    #[test]
    fn test_disabled() {
        let limiter = create_limiter(&AuthRateLimitConfig {
            enabled: false,
            ..AuthRateLimitConfig::default()
        });
        assert!(limiter.is_none());
    }
}
