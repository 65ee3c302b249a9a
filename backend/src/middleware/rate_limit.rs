//! Per-client request rate limiting
//!
//! Each client IP gets a token bucket refilled at `requests_per_second` up to
//! `burst` tokens. Idle buckets are evicted by a background task owned by the
//! limiter, which stops when [`RateLimiter::shutdown`] is called.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
    last_seen: Instant,
}

/// Token-bucket limiter keyed by client IP
pub struct RateLimiter {
    rate: f64,
    burst: f64,
    idle_after: Duration,
    buckets: Mutex<HashMap<IpAddr, Bucket>>,
    shutdown: tokio::sync::Notify,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            rate: config.requests_per_second.max(0.0),
            burst: f64::from(config.burst.max(1)),
            idle_after: Duration::from_secs(config.idle_eviction_secs),
            buckets: Mutex::new(HashMap::new()),
            shutdown: tokio::sync::Notify::new(),
        }
    }

    /// Take one token for `ip`, returning false when the bucket is empty
    pub fn check(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now())
    }

    pub fn check_at(&self, ip: IpAddr, now: Instant) -> bool {
        let Ok(mut buckets) = self.buckets.lock() else {
            // Fail open on a poisoned table
            return true;
        };

        let bucket = buckets.entry(ip).or_insert(Bucket {
            tokens: self.burst,
            refilled_at: now,
            last_seen: now,
        });

        let elapsed = now.saturating_duration_since(bucket.refilled_at).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate).min(self.burst);
        bucket.refilled_at = now;
        bucket.last_seen = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Drop buckets not seen for longer than the idle window. Returns how
    /// many were removed.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let Ok(mut buckets) = self.buckets.lock() else {
            return 0;
        };
        let before = buckets.len();
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_seen) <= self.idle_after);
        before - buckets.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().map(|b| b.len()).unwrap_or(0)
    }

    /// Spawn the eviction task. It runs until [`RateLimiter::shutdown`].
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::clone(self);
        let period = limiter.idle_after.max(Duration::from_secs(1));

        tokio::spawn(async move {
            tracing::debug!(period_secs = period.as_secs(), "Rate limiter eviction task started");

            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = limiter.shutdown.notified() => {
                        tracing::debug!("Rate limiter eviction task stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        let evicted = limiter.evict_idle(Instant::now());
                        if evicted > 0 {
                            tracing::debug!(evicted, "Evicted idle rate limit buckets");
                        }
                    }
                }
            }
        })
    }

    /// Signal the eviction task to stop
    pub fn shutdown(&self) {
        // notify_one keeps the permit if the task is not yet waiting
        self.shutdown.notify_one();
    }
}

/// Rejects requests from clients that exhausted their bucket
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.check(addr.ip()) {
        tracing::debug!(client = %addr.ip(), "Rate limit exceeded");
        return AppError::RateLimited.into_response();
    }

    next.run(request).await
}
