// src/services/rate_limit.rs
//! Fixed-window request limiter keyed by bearer token or client IP
//!
//! The OTP is only four digits. `/api/auth/*` is always limited per client
//! IP with the anonymous limit, whatever `Authorization` header is sent, and
//! the IP comes from the socket unless `trust_forwarded_headers` is set.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub authenticated_limit: u32,
    pub anonymous_limit: u32,
    pub per_ip_limit: u32,
    pub window_seconds: u32,
    pub whitelist_ips: Vec<String>,
    /// Read the client IP from `X-Forwarded-For`/`X-Real-IP`. Only safe
    /// behind a proxy that overwrites those headers.
    pub trust_forwarded_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            authenticated_limit: 100,
            anonymous_limit: 20,
            per_ip_limit: 50,
            window_seconds: 60,
            whitelist_ips: Vec::new(),
            trust_forwarded_headers: false,
        }
    }
}

impl RateLimitConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // RATE_LIMIT_ENABLED - set to "false" to disable rate limiting
        if let Ok(enabled) = env::var("RATE_LIMIT_ENABLED") {
            config.enabled = enabled.to_lowercase() != "false";
        }

        if let Some(val) = parse_limit("RATE_LIMIT_AUTHENTICATED") {
            config.authenticated_limit = val;
        }

        if let Some(val) = parse_limit("RATE_LIMIT_ANONYMOUS") {
            config.anonymous_limit = val;
        }

        if let Some(val) = parse_limit("RATE_LIMIT_PER_IP") {
            config.per_ip_limit = val;
        }

        if let Some(val) = parse_limit("RATE_LIMIT_WINDOW_SECONDS") {
            config.window_seconds = val;
        }

        // RATE_LIMIT_WHITELIST_IPS - comma-separated list of whitelisted IPs
        if let Ok(whitelist) = env::var("RATE_LIMIT_WHITELIST_IPS") {
            config.whitelist_ips = whitelist
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // RATE_LIMIT_TRUST_PROXY - set to "true" when running behind a reverse proxy
        if let Ok(trust) = env::var("RATE_LIMIT_TRUST_PROXY") {
            config.trust_forwarded_headers = trust.trim().eq_ignore_ascii_case("true");
        }

        config
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds as u64)
    }
}

fn parse_limit(key: &str) -> Option<u32> {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
}

#[derive(Debug, Clone)]
struct RateLimitState {
    count: u32,
    window_start: Instant,
}

impl RateLimitState {
    fn new() -> Self {
        Self {
            count: 1,
            window_start: Instant::now(),
        }
    }

    fn reset(&mut self) {
        self.count = 1;
        self.window_start = Instant::now();
    }

    fn is_expired(&self, window_duration: Duration) -> bool {
        self.window_start.elapsed() > window_duration
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    Limited { retry_after: u32 },
}

#[derive(Debug, Clone)]
pub struct RateLimitService {
    config: RateLimitConfig,
    rate_limiter: Arc<RwLock<HashMap<String, RateLimitState>>>,
}

impl RateLimitService {
    pub fn new(config: RateLimitConfig) -> Self {
        info!(
            enabled = config.enabled,
            authenticated_limit = config.authenticated_limit,
            anonymous_limit = config.anonymous_limit,
            per_ip_limit = config.per_ip_limit,
            window_seconds = config.window_seconds,
            whitelist_ips = ?config.whitelist_ips,
            "Initializing RateLimitService"
        );
        Self {
            config,
            rate_limiter: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn is_whitelisted(&self, ip: &str) -> bool {
        self.config.whitelist_ips.iter().any(|allowed| allowed == ip)
    }

    /// Check rate limit for a given identifier
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        ip_address: Option<&str>,
        is_authenticated: bool,
    ) -> RateLimitResult {
        if !self.config.enabled {
            return RateLimitResult::Allowed;
        }

        if let Some(ip) = ip_address {
            if self.is_whitelisted(ip) {
                return RateLimitResult::Allowed;
            }
        }

        let limit = if is_authenticated {
            self.config.authenticated_limit
        } else {
            self.config.anonymous_limit
        };
        let window = self.config.window();

        if let limited @ RateLimitResult::Limited { .. } =
            self.check_limit_for_key(identifier, limit, window).await
        {
            return limited;
        }

        if let Some(ip) = ip_address {
            let ip_key = format!("ip:{}", ip);
            if let limited @ RateLimitResult::Limited { .. } = self
                .check_limit_for_key(&ip_key, self.config.per_ip_limit, window)
                .await
            {
                return limited;
            }
        }

        RateLimitResult::Allowed
    }

    async fn check_limit_for_key(
        &self,
        key: &str,
        limit: u32,
        window_duration: Duration,
    ) -> RateLimitResult {
        let mut limiter = self.rate_limiter.write().await;

        let Some(state) = limiter.get_mut(key) else {
            limiter.insert(key.to_string(), RateLimitState::new());
            return RateLimitResult::Allowed;
        };

        if state.is_expired(window_duration) {
            state.reset();
            return RateLimitResult::Allowed;
        }

        if state.count >= limit {
            let elapsed = state.window_start.elapsed().as_secs() as u32;
            let retry_after = (window_duration.as_secs() as u32).saturating_sub(elapsed).max(1);
            return RateLimitResult::Limited { retry_after };
        }

        state.count += 1;
        RateLimitResult::Allowed
    }

    pub fn log_violation(&self, identifier: &str, ip_address: Option<&str>, endpoint: &str) {
        warn!(
            identifier = %identifier,
            ip_address = ?ip_address,
            endpoint = %endpoint,
            "Rate limit violation detected"
        );
    }

    /// Drop windows that have already expired
    pub async fn cleanup_expired(&self) {
        let window = self.config.window();
        let mut limiter = self.rate_limiter.write().await;
        let before = limiter.len();
        limiter.retain(|_, state| !state.is_expired(window));
        debug!(removed = before - limiter.len(), "Cleaned up expired rate limit entries");
    }

    /// Periodically evict expired windows so the map does not grow unbounded
    pub fn start_cleanup_task(service: Arc<RateLimitService>) {
        let every = service.config.window().max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                service.cleanup_expired().await;
            }
        });
    }
}
