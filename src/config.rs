// src/config.rs
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Command-line / environment configuration for the leads server.
#[derive(Parser, Debug, Clone)]
#[command(name = "buyer-leads")]
#[command(about = "Buyer lead tracker: CRUD, CSV import/export and change history")]
#[command(version)]
pub struct Config {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000", env = "LEADS_ADDR")]
    pub addr: SocketAddr,

    /// SQLite database file
    #[arg(long, default_value = "leads.sqlite3", env = "LEADS_DATABASE")]
    pub database: String,

    /// Schema applied at startup
    #[arg(long, default_value = "sql/schema.sql", env = "LEADS_SCHEMA")]
    pub schema: String,

    /// Worker threads serving requests
    #[arg(long, default_value_t = 8, env = "LEADS_WORKERS")]
    pub workers: usize,

    /// Lead creations allowed per client per window
    #[arg(long, default_value_t = 5, env = "LEADS_CREATE_LIMIT")]
    pub create_limit: u32,

    /// Length of the creation rate-limit window, in seconds
    #[arg(long, default_value_t = 60, env = "LEADS_CREATE_WINDOW_SECS")]
    pub create_window_secs: u64,

    /// Trust the first X-Forwarded-For hop as the client address. Only
    /// enable behind a proxy that overwrites the header.
    #[arg(long, env = "LEADS_TRUST_FORWARDED_FOR")]
    pub trust_forwarded_for: bool,

    /// Session lifetime, in days
    #[arg(long, default_value_t = 7, env = "LEADS_SESSION_TTL_DAYS")]
    pub session_ttl_days: i64,

    /// Mark the session cookie `Secure` (HTTPS deployments)
    #[arg(long, env = "LEADS_SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Tracing filter, used when RUST_LOG is unset
    #[arg(long, default_value = "buyer_leads=info", env = "LEADS_LOG")]
    pub log_filter: String,
}

impl Config {
    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            create_limit: self.create_limit,
            create_window: Duration::from_secs(self.create_window_secs),
            trust_forwarded_for: self.trust_forwarded_for,
        }
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            ttl_secs: self.session_ttl_days * 24 * 60 * 60,
            secure_cookie: self.secure_cookies,
            ..SessionConfig::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per window on the create path.
    pub create_limit: u32,
    pub create_window: Duration,
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            create_limit: 5,
            create_window: Duration::from_secs(60),
            trust_forwarded_for: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session lifetime in seconds.
    pub ttl_secs: i64,
    pub cookie_name: String,
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 60 * 60 * 24 * 7, // 7 days
            cookie_name: "session".to_string(),
            secure_cookie: false,
        }
    }
}
