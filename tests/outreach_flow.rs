//! Dispatch runs against a scripted mailer, so the halt/skip state machine
//! is exercised without any relay.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lettre::Message;
use tempfile::TempDir;

use clinic_scout::error::{Error, OutreachError, SendError, StoreError};
use clinic_scout::outreach::{self, Mailer, OutreachConfig, OutreachPipeline};

/// Mailer that replays a script of outcomes and records every submission.
struct ScriptedMailer {
    script: Mutex<VecDeque<Result<(), SendError>>>,
    submissions: Arc<Mutex<Vec<String>>>,
}

impl ScriptedMailer {
    /// Returns the mailer and a live handle on its submission log.
    fn new(script: Vec<Result<(), SendError>>) -> (Self, Arc<Mutex<Vec<String>>>) {
        let submissions = Arc::new(Mutex::new(Vec::new()));
        let mailer = Self {
            script: Mutex::new(script.into()),
            submissions: Arc::clone(&submissions),
        };
        (mailer, submissions)
    }
}

#[async_trait]
impl Mailer for ScriptedMailer {
    async fn send(&self, message: Message) -> Result<(), SendError> {
        self.submissions
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(&message.formatted()).into_owned());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

/// Three rows: two contribute secondary addresses, one is a placeholder.
const FIXTURE_CSV: &str = "\
Name,Email
Dental Uno,\"primary@uno.es, second@uno.es\"
Dental Dos,Not found
Dental Tres,\"primary@tres.es, third@tres.es, fourth@tres.es\"
";

fn write_fixture(dir: &TempDir) -> (PathBuf, PathBuf) {
    let csv = dir.path().join("clinics.csv");
    std::fs::write(&csv, FIXTURE_CSV).unwrap();
    let cv = dir.path().join("CV.pdf");
    std::fs::write(&cv, b"%PDF-1.4 fake").unwrap();
    (csv, cv)
}

fn outreach_config(csv: PathBuf, cv: PathBuf) -> OutreachConfig {
    OutreachConfig {
        csv_path: csv,
        attachment_path: cv,
        subject_template: "Application for {clinic_name}".to_string(),
        body_template: "Hello {clinic_name} team\n".to_string(),
        send_pause: Duration::ZERO,
    }
}

fn pipeline_with(
    dir: &TempDir,
    script: Vec<Result<(), SendError>>,
) -> (OutreachPipeline, Arc<Mutex<Vec<String>>>) {
    let (csv, cv) = write_fixture(dir);
    let (mailer, submissions) = ScriptedMailer::new(script);
    let pipeline = OutreachPipeline::new(
        outreach_config(csv, cv),
        "sender@example.com",
        Box::new(mailer),
    )
    .unwrap();
    (pipeline, submissions)
}

// ── Happy path ───────────────────────────────────────────────────────

#[tokio::test]
async fn sends_one_message_per_secondary_address() {
    let dir = TempDir::new().unwrap();
    let (pipeline, submissions) = pipeline_with(&dir, vec![Ok(()), Ok(()), Ok(())]);

    let report = pipeline.run().await.unwrap();
    assert_eq!(report.attempted, 3);
    assert_eq!(report.sent, 3);
    assert_eq!(report.skipped, 0);
    assert!(!report.halted());

    let submissions = submissions.lock().unwrap();
    assert_eq!(submissions.len(), 3);
    assert!(submissions[0].contains("To: second@uno.es"));
    assert!(submissions[0].contains("Application for Dental Uno"));
    assert!(submissions[0].contains("CV.pdf"));
    assert!(submissions[1].contains("To: third@tres.es"));
    assert!(submissions[1].contains("Application for Dental Tres"));
    assert!(submissions[2].contains("To: fourth@tres.es"));
}

#[tokio::test]
async fn rows_without_secondary_addresses_produce_no_mail() {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("clinics.csv");
    std::fs::write(&csv, "Name,Email\nDental Uno,only@uno.es\nDental Dos,Not found\n").unwrap();
    let cv = dir.path().join("CV.pdf");
    std::fs::write(&cv, b"%PDF-1.4 fake").unwrap();

    let (mailer, submissions) = ScriptedMailer::new(vec![]);
    let pipeline = OutreachPipeline::new(
        outreach_config(csv, cv),
        "sender@example.com",
        Box::new(mailer),
    )
    .unwrap();

    let report = pipeline.run().await.unwrap();
    assert_eq!(report, Default::default());
    assert!(submissions.lock().unwrap().is_empty());
}

// ── Failure handling ─────────────────────────────────────────────────

#[tokio::test]
async fn auth_rejection_halts_before_the_next_recipient() {
    let dir = TempDir::new().unwrap();
    let (pipeline, submissions) = pipeline_with(
        &dir,
        vec![Err(SendError::Auth("535 5.7.8 bad credentials".to_string()))],
    );

    let report = pipeline.run().await.unwrap();
    assert_eq!(report.attempted, 1);
    assert_eq!(report.sent, 0);
    assert_eq!(report.skipped, 0);
    assert!(report.halted());
    assert!(report.auth_failure.unwrap().contains("535"));

    // Only the first submission ever reached the mailer.
    assert_eq!(submissions.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn auth_rejection_midway_keeps_earlier_sends() {
    let dir = TempDir::new().unwrap();
    let (pipeline, submissions) = pipeline_with(
        &dir,
        vec![Ok(()), Err(SendError::Auth("535 rejected".to_string()))],
    );

    let report = pipeline.run().await.unwrap();
    assert_eq!(report.attempted, 2);
    assert_eq!(report.sent, 1);
    assert!(report.halted());
    assert_eq!(submissions.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn transient_failure_skips_that_recipient_and_continues() {
    let dir = TempDir::new().unwrap();
    let (pipeline, submissions) = pipeline_with(
        &dir,
        vec![
            Err(SendError::Other("550 mailbox unavailable".to_string())),
            Ok(()),
            Ok(()),
        ],
    );

    let report = pipeline.run().await.unwrap();
    assert_eq!(report.attempted, 3);
    assert_eq!(report.sent, 2);
    assert_eq!(report.skipped, 1);
    assert!(!report.halted());
    assert_eq!(submissions.lock().unwrap().len(), 3);
}

// ── Pre-flight ───────────────────────────────────────────────────────

#[tokio::test]
async fn missing_attachment_fails_before_reading_the_csv() {
    let dir = TempDir::new().unwrap();
    let (csv, _) = write_fixture(&dir);
    let (mailer, submissions) = ScriptedMailer::new(vec![]);

    let err = OutreachPipeline::new(
        outreach_config(csv, dir.path().join("missing.pdf")),
        "sender@example.com",
        Box::new(mailer),
    )
    .err()
    .expect("construction should fail without the attachment");

    assert!(matches!(
        err,
        Error::Outreach(OutreachError::Attachment { .. })
    ));
    assert!(submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_csv_is_fatal() {
    let dir = TempDir::new().unwrap();
    let cv = dir.path().join("CV.pdf");
    std::fs::write(&cv, b"%PDF-1.4 fake").unwrap();
    let (mailer, _) = ScriptedMailer::new(vec![]);

    let pipeline = OutreachPipeline::new(
        outreach_config(dir.path().join("absent.csv"), cv),
        "sender@example.com",
        Box::new(mailer),
    )
    .unwrap();

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::NotFound { .. })));
}

#[tokio::test]
async fn csv_without_required_columns_is_fatal() {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("clinics.csv");
    std::fs::write(&csv, "Name,Address\nDental Uno,Calle Mayor 1\n").unwrap();
    let cv = dir.path().join("CV.pdf");
    std::fs::write(&cv, b"%PDF-1.4 fake").unwrap();
    let (mailer, _) = ScriptedMailer::new(vec![]);

    let pipeline = OutreachPipeline::new(
        outreach_config(csv, cv),
        "sender@example.com",
        Box::new(mailer),
    )
    .unwrap();

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Store(StoreError::MissingColumn("Email"))
    ));
}

// ── Dry run ──────────────────────────────────────────────────────────

#[test]
fn preview_lists_recipients_without_a_mailer() {
    let dir = TempDir::new().unwrap();
    let (csv, _) = write_fixture(&dir);

    let recipients = outreach::preview(&csv).unwrap();
    let emails: Vec<&str> = recipients.iter().map(|r| r.email.as_str()).collect();
    assert_eq!(emails, ["second@uno.es", "third@tres.es", "fourth@tres.es"]);
    assert_eq!(recipients[0].name, "Dental Uno");
}
