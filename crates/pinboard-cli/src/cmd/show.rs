use crate::cmd::context::Context;
use crate::cmd::{write_event_lines, write_event_rows};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use anyhow::{Context as _, Result};
use pinboard_core::{Event, PollOutcome};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct BoardReport {
    document_id: String,
    last_update: Option<String>,
    events: Vec<Event>,
}

/// Execute `pb show`: fetch the shared document once and list its events.
///
/// Works for viewers; no token is needed to read.
///
/// # Errors
///
/// Returns an error when no document is selected, or when the fetch or
/// decode fails.
pub fn run_show(ctx: &Context, output: OutputMode) -> Result<()> {
    let session = ctx.session();
    let Some(document_id) = session.document_id().map(str::to_string) else {
        anyhow::bail!(
            "No shared document selected. Pass --document, --join-url, or set PINBOARD_DOCUMENT."
        );
    };

    match session.refresh(|_, _| {}) {
        PollOutcome::Changed { .. } | PollOutcome::Unchanged => {}
        PollOutcome::Failed(err) => {
            return Err(err).with_context(|| format!("Failed to load document {document_id}"));
        }
        PollOutcome::Inert => anyhow::bail!("No shared document selected."),
    }

    let report = BoardReport {
        document_id,
        last_update: session.last_known_update(),
        events: session.pending_events().as_ref().clone(),
    };

    render_mode(
        output,
        &report,
        |r, w| write_event_rows(w, &r.events, 0),
        |r, w| {
            pretty_section(w, &format!("Board {} ({} events)", r.document_id, r.events.len()))?;
            if let Some(updated) = &r.last_update {
                pretty_kv(w, "Updated", updated)?;
            }
            if r.events.is_empty() {
                writeln!(w, "  (no events yet)")
            } else {
                write_event_lines(w, &r.events, 0)
            }
        },
    )
}
