//! Admission-control rate limiting
//!
//! One `RateLimiter` per protected endpoint class. Each key (client address)
//! gets a counter that resets once its window has elapsed. All state sits
//! behind a single `tokio::sync::Mutex`; the critical section performs no I/O.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::Duration;

use picohub_core::RateLimitPolicy;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
struct RateWindow {
    count: u32,
    reset_at: Instant,
}

impl RateWindow {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.reset_at
    }
}

/// Outcome of a single admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

struct Inner {
    policy: RateLimitPolicy,
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl Inner {
    async fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_key, window| !window.is_expired(now));
        before - windows.len()
    }
}

struct Sweeper {
    cancel_token: CancellationToken,
    handle: StdMutex<Option<JoinHandle<()>>>,
}

/// Per-key fixed-window request counter
pub struct RateLimiter {
    inner: Arc<Inner>,
    sweeper: Option<Sweeper>,
}

impl RateLimiter {
    /// Create a limiter without background eviction. Expired windows are
    /// still replaced lazily on the next request for their key.
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                policy,
                windows: Mutex::new(HashMap::new()),
            }),
            sweeper: None,
        }
    }

    /// Create a limiter plus a background task that evicts expired windows
    /// every `policy.window`. Must be called from within a tokio runtime.
    ///
    /// The task stops when the limiter is dropped or `shutdown` is awaited.
    pub fn with_sweeper(policy: RateLimitPolicy) -> Self {
        let mut limiter = Self::new(policy);
        let cancel_token = CancellationToken::new();
        let handle = Self::create_sweep_task(
            Arc::downgrade(&limiter.inner),
            cancel_token.clone(),
            policy.window,
        );
        limiter.sweeper = Some(Sweeper {
            cancel_token,
            handle: StdMutex::new(Some(handle)),
        });
        limiter
    }

    fn create_sweep_task(
        inner: Weak<Inner>,
        cancel_token: CancellationToken,
        period: Duration,
    ) -> JoinHandle<()> {
        let mut interval = interval_at(Instant::now() + period, period);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        break;
                    }
                    _ = interval.tick() => {
                        let Some(inner) = inner.upgrade() else {
                            break;
                        };
                        let evicted = inner.sweep_expired().await;
                        if evicted > 0 {
                            tracing::debug!(
                                windows_evicted = evicted,
                                "Evicted expired rate limit windows"
                            );
                        }
                    }
                }
            }
            tracing::debug!("Rate limit sweeper stopped");
        })
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.inner.policy
    }

    /// Record one request for `key` and decide whether it may proceed.
    pub async fn check(&self, key: &str) -> RateDecision {
        let policy = self.inner.policy;
        let now = Instant::now();
        let mut windows = self.inner.windows.lock().await;

        match windows.get_mut(key) {
            Some(window) if !window.is_expired(now) => {
                window.count = window.count.saturating_add(1);
                if window.count <= policy.limit {
                    RateDecision::Allowed {
                        remaining: policy.limit - window.count,
                    }
                } else {
                    RateDecision::Limited {
                        retry_after: window.reset_at.saturating_duration_since(now),
                    }
                }
            }
            _ => {
                windows.insert(
                    key.to_string(),
                    RateWindow {
                        count: 1,
                        reset_at: now + policy.window,
                    },
                );
                RateDecision::Allowed {
                    remaining: policy.limit.saturating_sub(1),
                }
            }
        }
    }

    /// Record one request for `key`; true when it is admitted.
    pub async fn admit(&self, key: &str) -> bool {
        self.check(key).await.is_allowed()
    }

    /// Remove every expired window and return how many were dropped.
    pub async fn sweep_expired(&self) -> usize {
        self.inner.sweep_expired().await
    }

    /// Number of keys currently tracked, expired or not.
    pub async fn tracked_keys(&self) -> usize {
        self.inner.windows.lock().await.len()
    }

    /// Stop the background sweep and wait for it to finish.
    pub async fn shutdown(&self) {
        let Some(sweeper) = &self.sweeper else {
            return;
        };
        sweeper.cancel_token.cancel();
        let handle = match sweeper.handle.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Rate limit sweeper ended abnormally");
            }
        }
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.cancel_token.cancel();
        }
    }
}
