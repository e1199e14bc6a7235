//! Resolution of one merge window: timestamp parsing and ordering.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use logweave_core::{parse_line, ParsedRecord, RawRecord};
use tracing::{debug, warn};

use crate::render::Renderer;

/// Parse every record of a window and order the result by `logged_at`.
///
/// The sort is stable: records with equal timestamps keep their arrival
/// order. Lines without a parseable timestamp are logged and fall back to
/// the raw text and the time they were received. In follow mode every end of
/// stream also yields an exit notice.
pub fn resolve_window(records: Vec<RawRecord>, follow: bool) -> Vec<ParsedRecord> {
    let mut parsed = Vec::with_capacity(records.len());

    for record in records {
        match record {
            RawRecord::Data {
                service,
                text,
                received_at,
            } => {
                let (message, logged_at) = match parse_line(&text) {
                    Ok((message, logged_at)) => (message.to_string(), logged_at),
                    Err(err) => {
                        warn!(%service, line = %text, error = %err, "Failed to parse log line");
                        (text.clone(), received_at)
                    }
                };
                parsed.push(ParsedRecord::new(service, message, logged_at));
            }
            RawRecord::Terminal {
                service,
                trailing,
                received_at,
            } => {
                if let Some(text) = trailing.filter(|text| !text.is_empty()) {
                    // Partial lines are often cut before the timestamp ends.
                    let (message, logged_at) = parse_or_received(&text, received_at);
                    parsed.push(ParsedRecord::new(service.as_str(), message, logged_at));
                }
                if follow {
                    parsed.push(ParsedRecord::exit_notice(&service, received_at));
                }
            }
            RawRecord::Failure { service, error } => {
                debug!(%service, %error, "Dropping failure record from window");
            }
        }
    }

    parsed.sort_by_key(|record| record.logged_at);
    parsed
}

fn parse_or_received(text: &str, received_at: DateTime<Utc>) -> (String, DateTime<Utc>) {
    match parse_line(text) {
        Ok((message, logged_at)) => (message.to_string(), logged_at),
        Err(_) => (text.to_string(), received_at),
    }
}

/// Resolve the buffered window, render it and flush the writer.
///
/// `records` is left empty. Nothing is written for an empty window.
pub fn flush_window<W: Write>(
    records: &mut Vec<RawRecord>,
    follow: bool,
    renderer: &mut Renderer<W>,
) -> io::Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    for record in resolve_window(std::mem::take(records), follow) {
        renderer.render(&record)?;
    }
    renderer.flush()
}
