//! Builds the outreach messages: rendered templates plus the attachment.
//!
//! Everything that can fail for every recipient alike (missing attachment,
//! bad sender address) fails at construction, before anything is sent.

use std::path::Path;

use lettre::Message;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType};

use super::Recipient;
use crate::error::OutreachError;

/// Placeholder the templates may use for the clinic name.
pub const NAME_PLACEHOLDER: &str = "{clinic_name}";

#[derive(Debug)]
pub struct MessageComposer {
    sender: Mailbox,
    subject_template: String,
    body_template: String,
    attachment_name: String,
    attachment_type: ContentType,
    attachment: Vec<u8>,
}

impl MessageComposer {
    /// Loads the attachment and validates the sender address.
    pub fn new(
        sender: &str,
        subject_template: String,
        body_template: String,
        attachment_path: &Path,
    ) -> Result<Self, OutreachError> {
        let attachment =
            std::fs::read(attachment_path).map_err(|e| OutreachError::Attachment {
                path: attachment_path.to_path_buf(),
                source: e,
            })?;
        let sender: Mailbox = sender.parse().map_err(|e: lettre::address::AddressError| {
            OutreachError::InvalidSender {
                address: sender.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Self {
            sender,
            subject_template,
            body_template,
            attachment_name: attachment_file_name(attachment_path),
            attachment_type: content_type_for(attachment_path)?,
            attachment,
        })
    }

    /// Renders one message for `recipient`.
    pub fn compose(&self, recipient: &Recipient) -> Result<Message, OutreachError> {
        let to: Mailbox =
            recipient
                .email
                .parse()
                .map_err(|e: lettre::address::AddressError| OutreachError::InvalidRecipient {
                    address: recipient.email.clone(),
                    message: e.to_string(),
                })?;
        let body = render(&self.body_template, &recipient.name);
        let attachment = Attachment::new(self.attachment_name.clone())
            .body(self.attachment.clone(), self.attachment_type.clone());
        Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(render(&self.subject_template, &recipient.name))
            .multipart(
                MultiPart::mixed()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body),
                    )
                    .singlepart(attachment),
            )
            .map_err(|e| OutreachError::Compose(e.to_string()))
    }
}

fn render(template: &str, clinic_name: &str) -> String {
    template.replace(NAME_PLACEHOLDER, clinic_name)
}

fn attachment_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string())
}

fn content_type_for(path: &Path) -> Result<ContentType, OutreachError> {
    let mime = match path.extension().and_then(|ext| ext.to_str()) {
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    };
    ContentType::parse(mime).map_err(|e| OutreachError::Compose(e.to_string()))
}

// ── Tests ──────────────────────────────────────────────────────────────────
