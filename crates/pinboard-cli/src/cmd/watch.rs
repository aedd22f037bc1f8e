use crate::cmd::context::Context;
use crate::cmd::{write_event_lines, write_event_rows};
use crate::output::OutputMode;
use anyhow::{Context as _, Result};
use clap::Args;
use pinboard_core::{Event, PollOutcome};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Poll once, print the result, and exit.
    #[arg(long)]
    pub once: bool,

    /// Poll interval in milliseconds. Defaults to `poll.interval_ms`.
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
struct Notification<'a> {
    total: usize,
    previous: usize,
    new_events: &'a [Event],
}

/// Execute `pb watch`: poll the shared document and print each change.
///
/// Owner only. Without a document id one is created first so the owner
/// can hand out a join link straight away.
///
/// # Errors
///
/// Returns an error for sessions without a token, a failed document
/// creation, or a failure to start the poller.
pub fn run_watch(args: &WatchArgs, ctx: &Context, output: OutputMode) -> Result<()> {
    let session = Arc::new(ctx.session());
    if session.credential().is_none() {
        anyhow::bail!(
            "Polling needs a token; this is a {} session. Use `pb show` to read the board.",
            session.role()
        );
    }

    let document_id = session.ensure_document()?;
    info!(document_id = %document_id, "watching document");
    if !output.is_json() {
        eprintln!("Watching document {document_id}");
    }

    match session.poll_once(|events, previous| notify(output, events, previous)) {
        PollOutcome::Failed(err) if args.once => {
            return Err(err).with_context(|| format!("Failed to load document {document_id}"));
        }
        PollOutcome::Unchanged if args.once && !output.is_json() => {
            println!("No changes");
        }
        _ => {}
    }
    if args.once {
        return Ok(());
    }

    let interval = args
        .interval_ms
        .map_or_else(|| ctx.config.poll.interval(), |ms| Duration::from_millis(ms.max(1)));
    let poller = session
        .start_polling(interval, move |events, previous| notify(output, events, previous))
        .context("Failed to start the poller")?;

    // Runs until the process is interrupted.
    poller.join();
    Ok(())
}

fn notify(output: OutputMode, events: &[Event], previous: usize) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let _ = write_notification(&mut out, output, events, previous);
    let _ = out.flush();
}

fn write_notification(
    w: &mut dyn Write,
    output: OutputMode,
    events: &[Event],
    previous: usize,
) -> io::Result<()> {
    let new_events = events.get(previous..).unwrap_or_default();
    match output {
        OutputMode::Json => {
            let line = serde_json::to_string(&Notification {
                total: events.len(),
                previous,
                new_events,
            })
            .map_err(io::Error::other)?;
            writeln!(w, "{line}")
        }
        OutputMode::Text => write_event_rows(w, new_events, previous),
        OutputMode::Pretty => {
            if new_events.is_empty() {
                writeln!(w, "Board now has {} events (was {previous})", events.len())
            } else {
                writeln!(w, "{} new event(s):", new_events.len())?;
                write_event_lines(w, new_events, previous)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinboard_core::Color;

    fn event(title: &str) -> Event {
        Event {
            title: title.to_string(),
            description: String::new(),
            color: Color::Black,
            timestamp: "t".to_string(),
            id: title.to_string(),
        }
    }

    #[test]
    fn only_events_past_previous_count_are_new() {
        let events = [event("A"), event("B"), event("C")];
        let mut buf = Vec::new();
        write_notification(&mut buf, OutputMode::Json, &events, 2).expect("write");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(value["total"], 3);
        assert_eq!(value["new_events"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["new_events"][0]["title"], "C");
    }

    #[test]
    fn shrinking_board_reports_new_total() {
        let events = [event("A")];
        let mut buf = Vec::new();
        write_notification(&mut buf, OutputMode::Pretty, &events, 2).expect("write");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "Board now has 1 events (was 2)\n"
        );
    }
}
