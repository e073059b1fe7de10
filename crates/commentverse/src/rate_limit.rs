use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderName, Request, Response, StatusCode};
use axum::response::IntoResponse;
use dashmap::DashMap;
use tower::{Layer, Service};
use tracing::{debug, warn};

const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

/// Token-bucket settings shared by every client.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub rate_per_sec: u32,
    pub burst: u32,
    /// Request header identifying the client. For comma-separated proxy
    /// chains such as `X-Forwarded-For` only the first entry is used.
    pub client_header: HeaderName,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate_per_sec: 5,
            burst: 10,
            client_header: HeaderName::from_static("x-forwarded-for"),
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter<S> {
    inner: S,
    state: SharedState,
    rate_per_sec: f64,
    burst: f64,
    client_header: HeaderName,
}

#[derive(Clone)]
struct SharedState {
    buckets: Arc<DashMap<String, Bucket>>,
    dropped_since_log: Arc<AtomicU64>,
    last_maintenance: Arc<Mutex<Instant>>,
}

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Clone)]
pub struct RateLimiterLayer {
    config: RateLimitConfig,
}

impl RateLimiterLayer {
    pub fn new(config: RateLimitConfig) -> Self {
        Self { config }
    }
}

impl<S> Layer<S> for RateLimiterLayer {
    type Service = RateLimiter<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimiter {
            inner,
            state: SharedState {
                buckets: Arc::new(DashMap::new()),
                dropped_since_log: Arc::new(AtomicU64::new(0)),
                last_maintenance: Arc::new(Mutex::new(Instant::now())),
            },
            rate_per_sec: f64::from(self.config.rate_per_sec.max(1)),
            burst: f64::from(self.config.burst.max(1)),
            client_header: self.config.client_header.clone(),
        }
    }
}

impl<S, ReqBody> Service<Request<ReqBody>> for RateLimiter<S>
where
    S: Service<Request<ReqBody>, Response = Response<Body>> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let now = Instant::now();
        let allowed = match client_id(&req, &self.client_header) {
            Some(client) => self.check_and_consume(&client, now),
            // Requests without the header are not limited.
            None => true,
        };
        if !allowed {
            self.state.dropped_since_log.fetch_add(1, Ordering::Relaxed);
        }
        self.maintain(now);

        if !allowed {
            return Box::pin(async move {
                Ok((StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response())
            });
        }

        let fut = self.inner.call(req);
        Box::pin(fut)
    }
}

fn client_id<B>(req: &Request<B>, header: &HeaderName) -> Option<String> {
    let raw = req.headers().get(header)?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

impl<S> RateLimiter<S> {
    fn check_and_consume(&self, client: &str, now: Instant) -> bool {
        let mut entry = self
            .state
            .buckets
            .entry(client.to_string())
            .or_insert(Bucket {
                tokens: self.burst,
                last_refill: now,
            });
        let elapsed = now
            .saturating_duration_since(entry.last_refill)
            .as_secs_f64();
        if elapsed > 0.0 {
            entry.tokens = (entry.tokens + elapsed * self.rate_per_sec).min(self.burst);
            entry.last_refill = now;
        }
        if entry.tokens >= 1.0 {
            entry.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time after which an untouched bucket has refilled completely.
    fn idle_after(&self) -> Duration {
        Duration::from_secs_f64(self.burst / self.rate_per_sec)
    }

    /// Once per interval: report drops and forget clients whose buckets are
    /// full again, since a fresh bucket is identical.
    fn maintain(&self, now: Instant) {
        let Ok(mut last) = self.state.last_maintenance.try_lock() else {
            return;
        };
        if now.saturating_duration_since(*last) < MAINTENANCE_INTERVAL {
            return;
        }
        *last = now;

        let dropped = self.state.dropped_since_log.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            warn!("rate limiter dropped {dropped} requests in the last minute");
        }
        let before = self.state.buckets.len();
        self.evict_idle(now);
        let evicted = before.saturating_sub(self.state.buckets.len());
        if evicted > 0 {
            debug!("evicted {evicted} idle rate-limit buckets");
        }
    }

    fn evict_idle(&self, now: Instant) {
        let idle = self.idle_after();
        self.state
            .buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < idle);
    }
}
