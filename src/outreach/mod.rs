//! The outreach pipeline: derive secondary recipients from the harvested
//! CSV and send each one a templated message with the CV attached.
//!
//! Send failures are per-recipient and the loop moves on, with one
//! exception: an authentication rejection halts the run, because every
//! later send would fail the same way.

pub mod composer;
pub mod mailer;
pub mod recipients;

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use composer::MessageComposer;
pub use mailer::{Mailer, SmtpConfig, SmtpMailer};
pub use recipients::{Recipient, secondary_recipients};

use crate::config::{DEFAULT_BODY_TEMPLATE, DEFAULT_SUBJECT_TEMPLATE, env_or};
use crate::error::{Error, SendError};
use crate::pacing::{FixedDelay, Pacer};
use crate::store::read_contact_rows;

const DEFAULT_SEND_PAUSE: Duration = Duration::from_secs(10);

/// Settings for one dispatch run.
#[derive(Debug, Clone)]
pub struct OutreachConfig {
    pub csv_path: PathBuf,
    pub attachment_path: PathBuf,
    pub subject_template: String,
    pub body_template: String,
    pub send_pause: Duration,
}

impl OutreachConfig {
    /// Templates may be overridden via `OUTREACH_SUBJECT` and
    /// `OUTREACH_BODY`; everything else comes from the caller.
    pub fn from_env(csv_path: PathBuf, attachment_path: PathBuf) -> Self {
        Self {
            csv_path,
            attachment_path,
            subject_template: env_or("OUTREACH_SUBJECT", DEFAULT_SUBJECT_TEMPLATE),
            body_template: env_or("OUTREACH_BODY", DEFAULT_BODY_TEMPLATE),
            send_pause: DEFAULT_SEND_PAUSE,
        }
    }
}

/// What a dispatch run did, recipient by recipient.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub attempted: usize,
    pub sent: usize,
    pub skipped: usize,
    /// Set when the run halted on an authentication rejection; carries the
    /// relay's reason.
    pub auth_failure: Option<String>,
}

impl DispatchReport {
    pub fn halted(&self) -> bool {
        self.auth_failure.is_some()
    }
}

/// Sequential dispatch over the derived recipients.
pub struct OutreachPipeline {
    csv_path: PathBuf,
    composer: MessageComposer,
    mailer: Box<dyn Mailer>,
    pacer: Box<dyn Pacer>,
}

impl OutreachPipeline {
    /// Fails here, before any send, if the attachment cannot be read or the
    /// sender address does not parse.
    pub fn new(
        config: OutreachConfig,
        sender: &str,
        mailer: Box<dyn Mailer>,
    ) -> Result<Self, Error> {
        let composer = MessageComposer::new(
            sender,
            config.subject_template,
            config.body_template,
            &config.attachment_path,
        )?;
        Ok(Self {
            csv_path: config.csv_path,
            composer,
            mailer,
            pacer: Box::new(FixedDelay::new(config.send_pause)),
        })
    }

    /// Replaces the pacing policy between sends.
    pub fn with_pacer(mut self, pacer: Box<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub async fn run(&self) -> Result<DispatchReport, Error> {
        let rows = read_contact_rows(&self.csv_path)?;
        let recipients = secondary_recipients(&rows);
        let mut report = DispatchReport::default();
        if recipients.is_empty() {
            tracing::info!("No secondary addresses to contact");
            return Ok(report);
        }

        tracing::info!(recipients = recipients.len(), "Starting dispatch");
        for (index, recipient) in recipients.iter().enumerate() {
            if index > 0 {
                self.pacer.pause().await;
            }
            report.attempted += 1;
            tracing::info!(
                position = index + 1,
                total = recipients.len(),
                email = %recipient.email,
                clinic = %recipient.name,
                "Sending application"
            );
            let message = match self.composer.compose(recipient) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(email = %recipient.email, error = %e, "Skipping recipient");
                    report.skipped += 1;
                    continue;
                }
            };
            match self.mailer.send(message).await {
                Ok(()) => {
                    tracing::info!(email = %recipient.email, "Sent");
                    report.sent += 1;
                }
                Err(SendError::Auth(reason)) => {
                    tracing::error!(
                        error = %reason,
                        "Relay rejected our credentials, halting dispatch"
                    );
                    report.auth_failure = Some(reason);
                    break;
                }
                Err(SendError::Other(reason)) => {
                    tracing::warn!(
                        email = %recipient.email,
                        error = %reason,
                        "Send failed, moving to the next recipient"
                    );
                    report.skipped += 1;
                }
            }
        }
        Ok(report)
    }
}

/// Derives the recipients without sending anything, for `--dry-run`.
pub fn preview(csv_path: &Path) -> Result<Vec<Recipient>, Error> {
    let rows = read_contact_rows(csv_path)?;
    Ok(secondary_recipients(&rows))
}
