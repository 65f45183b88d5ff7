//! Deriving the outreach audience from harvested rows.
//!
//! The first address of every row is assumed to have been contacted in an
//! earlier campaign, so only rows with more than one address contribute,
//! and only their later addresses.

use std::collections::HashSet;

use crate::store::{ContactRow, NOT_FOUND};

/// One message to send: a clinic name for the templates and the address to
/// deliver to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

/// Extracts the secondary addresses from the rows, in row order.
///
/// Rows whose e-mail cell is the not-found placeholder or holds a single
/// address are skipped. The rest are split on commas, trimmed, and every
/// address after the first becomes a recipient, except repeats of the
/// row's own first address: that one is the already-contacted primary.
/// Duplicate addresses keep their first occurrence, including its clinic
/// name.
pub fn secondary_recipients(rows: &[ContactRow]) -> Vec<Recipient> {
    let mut seen = HashSet::new();
    let mut recipients = Vec::new();
    for row in rows {
        if row.email.trim().eq_ignore_ascii_case(NOT_FOUND) {
            continue;
        }
        if !row.email.contains(',') {
            continue;
        }
        let name = row.name.trim().to_string();
        let mut entries = row.email.split(',').map(str::trim);
        let primary = entries.next().unwrap_or_default();
        for address in entries {
            if address.is_empty() || address == primary {
                continue;
            }
            if seen.insert(address.to_string()) {
                recipients.push(Recipient {
                    name: name.clone(),
                    email: address.to_string(),
                });
            }
        }
    }
    recipients
}

// ── Tests ──────────────────────────────────────────────────────────────────
