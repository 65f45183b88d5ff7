//! SMTP delivery behind a trait, so the dispatch loop can be exercised
//! without a live relay.

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::{ConfigError, OutreachError, SendError};

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Reply codes that mean the relay rejected our credentials. Retrying other
/// recipients after one of these would just repeat the same failure.
const AUTH_FAILURE_CODES: [&str; 3] = ["530", "534", "535"];

// ── Configuration ───────────────────────────────────────────────────

/// SMTP relay settings, built from environment variables.
///
/// The username doubles as the From address, which is what app-password
/// relays expect.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl SmtpConfig {
    /// Build config from environment variables.
    /// `SENDER_EMAIL` and `SMTP_APP_PASSWORD` are required; host and port
    /// default to the Gmail submission endpoint.
    pub fn from_env() -> Result<Self, ConfigError> {
        let username = crate::config::required_env("SENDER_EMAIL")?;
        let password = crate::config::required_env("SMTP_APP_PASSWORD")?;

        let host = std::env::var("SMTP_HOST").unwrap_or_else(|_| DEFAULT_SMTP_HOST.to_string());
        let port: u16 = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SMTP_PORT);

        Ok(Self {
            host,
            port,
            username,
            password,
        })
    }
}

// ── Transport ───────────────────────────────────────────────────────

/// One message submission.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), SendError>;
}

/// Production mailer: STARTTLS submission with credential login.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, OutreachError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| OutreachError::Relay {
                host: config.host.clone(),
                message: e.to_string(),
            })?
            .port(config.port)
            .credentials(creds)
            .build();
        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: Message) -> Result<(), SendError> {
        match self.transport.send(message).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let code = e.status().map(|status| status.to_string());
                if code.as_deref().is_some_and(is_auth_failure_code) {
                    Err(SendError::Auth(e.to_string()))
                } else {
                    Err(SendError::Other(e.to_string()))
                }
            }
        }
    }
}

fn is_auth_failure_code(code: &str) -> bool {
    AUTH_FAILURE_CODES.contains(&code)
}

// ── Tests ──────────────────────────────────────────────────────────────────
