// src/common/config.rs
//! Application configuration loaded from environment variables
//!
//! Every setting has a default so the server boots with nothing but a
//! `.env` file (or nothing at all) in development.

use chrono::Duration;
use std::env;
use tracing::warn;

const DEFAULT_JWT_SECRET: &str = "replace_with_strong_secret";
const DEFAULT_INSTITUTE: &str = "P. D. Patel Institute of Applied Science";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// How OTP emails leave the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTransport {
    /// AWS SES v2
    Ses,
    /// Write the message to the log instead of sending it
    Log,
}

impl MailTransport {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "ses" => Some(MailTransport::Ses),
            "log" => Some(MailTransport::Log),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct MailConfig {
    pub transport: MailTransport,
    pub ses_from_email: Option<String>,
    pub ses_region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: MailTransport::Log,
            ses_from_email: None,
            ses_region: "us-east-1".to_string(),
            aws_access_key_id: None,
            aws_secret_access_key: None,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub reset_db: bool,
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub otp_ttl: Duration,
    /// Only emails in this domain may sign up, when set
    pub allowed_email_domain: Option<String>,
    pub institute_name: String,
    pub cors_origins: Vec<String>,
    pub mail: MailConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://student_portal.db".to_string(),
            port: 5000,
            reset_db: false,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            session_ttl: Duration::hours(24),
            otp_ttl: Duration::minutes(5),
            allowed_email_domain: None,
            institute_name: DEFAULT_INSTITUTE.to_string(),
            cors_origins: split_list(DEFAULT_CORS_ORIGINS),
            mail: MailConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("DATABASE_URL") {
            config.database_url = url;
        }

        if let Some(port) = parse_var::<u16>("PORT") {
            config.port = port;
        }

        if let Ok(reset) = env::var("RESET_DB") {
            config.reset_db = reset.to_lowercase() == "true";
        }

        match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => config.jwt_secret = secret,
            _ => warn!("JWT_SECRET not set, using the development default"),
        }

        if let Some(hours) = parse_var::<i64>("SESSION_TTL_HOURS").filter(|h| *h > 0) {
            config.session_ttl = Duration::hours(hours);
        }

        if let Some(minutes) = parse_var::<i64>("OTP_TTL_MINUTES").filter(|m| *m > 0) {
            config.otp_ttl = Duration::minutes(minutes);
        }

        config.allowed_email_domain = env::var("ALLOWED_EMAIL_DOMAIN")
            .ok()
            .map(|d| d.trim().trim_start_matches('@').to_lowercase())
            .filter(|d| !d.is_empty());

        if let Ok(name) = env::var("INSTITUTE_NAME") {
            if !name.trim().is_empty() {
                config.institute_name = name;
            }
        }

        if let Ok(origins) = env::var("CORS_ORIGINS") {
            config.cors_origins = split_list(&origins);
        }

        if let Ok(transport) = env::var("MAIL_TRANSPORT") {
            match MailTransport::parse(&transport) {
                Some(t) => config.mail.transport = t,
                None => warn!(value = %transport, "Unknown MAIL_TRANSPORT, falling back to log"),
            }
        }
        config.mail.ses_from_email = non_empty_var("AWS_SES_FROM_EMAIL");
        if let Some(region) = non_empty_var("AWS_SES_REGION").or_else(|| non_empty_var("AWS_REGION")) {
            config.mail.ses_region = region;
        }
        config.mail.aws_access_key_id = non_empty_var("AWS_ACCESS_KEY_ID");
        config.mail.aws_secret_access_key = non_empty_var("AWS_SECRET_ACCESS_KEY");

        config
    }

    pub fn otp_ttl_minutes(&self) -> i64 {
        self.otp_ttl.num_minutes()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
