// src/rate_limit.rs
use crate::errors::ServerError;
use astra::Request;
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::fmt;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::warn;

/// Above this many tracked keys, idle ones are dropped on the next check.
const SWEEP_THRESHOLD: usize = 4096;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Per-key limiter shared by all worker threads: `limit` requests may burst,
/// after which one more is allowed every `window / limit`.
pub struct RequestLimiter {
    limiter: KeyedLimiter,
    clock: DefaultClock,
}

impl fmt::Debug for RequestLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLimiter")
            .field("keys", &self.limiter.len())
            .finish()
    }
}

impl RequestLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        let burst = NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(window / burst.get())
            .map(|q| q.allow_burst(burst))
            .unwrap_or_else(|| Quota::per_second(burst));
        Self {
            limiter: RateLimiter::keyed(quota),
            clock: DefaultClock::default(),
        }
    }

    /// Counts one request against `key`. Over the limit, returns
    /// `TooManyRequests` with the whole seconds until a retry can succeed.
    pub fn check(&self, key: &str) -> Result<(), ServerError> {
        if self.limiter.len() > SWEEP_THRESHOLD {
            self.limiter.retain_recent();
        }

        match self.limiter.check_key(&key.to_string()) {
            Ok(()) => Ok(()),
            Err(not_until) => {
                let wait = not_until.wait_time_from(self.clock.now());
                let retry_after_secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
                warn!(key, retry_after_secs, "rate limit exceeded");
                Err(ServerError::TooManyRequests {
                    retry_after_secs: retry_after_secs.max(1),
                })
            }
        }
    }
}

/// Identifies the caller by socket peer. The first `X-Forwarded-For` hop is
/// used instead only when `trust_forwarded_for` is set, since any client can
/// write that header.
pub fn client_id(req: &Request, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> String {
    let forwarded = trust_forwarded_for
        .then(|| {
            req.headers()
                .get("X-Forwarded-For")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
        .flatten();

    forwarded
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Limiter key for one operation performed by one client.
pub fn limit_key(operation: &str, client: &str) -> String {
    format!("{operation}:{client}")
}
