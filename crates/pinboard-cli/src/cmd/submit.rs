use crate::cmd::context::Context;
use crate::output::{OutputMode, RETRY_PROMPT, render};
use anyhow::Result;
use clap::Args;
use pinboard_core::clock::{Clock, SystemClock};
use pinboard_core::{Color, Event, SubmitOutcome};
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Short title shown on the board.
    #[arg(long)]
    pub title: String,

    /// Optional longer description.
    #[arg(long, default_value = "")]
    pub description: String,

    /// Marker color (red, green, yellow, blue, purple, black, white).
    #[arg(long, default_value = "white")]
    pub color: Color,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Destination {
    Remote,
    Local,
    LocalAfterRemoteFailure,
}

#[derive(Debug, Serialize)]
struct SubmitReport {
    destination: Destination,
    event: Event,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_document: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stored_locally: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute `pb submit`.
///
/// Remote failures are not command failures: the event lands in the local
/// fallback list and a retry prompt is printed to stderr.
///
/// # Errors
///
/// Returns an error for an empty title or when the local write fails too.
pub fn run_submit(args: &SubmitArgs, ctx: &Context, output: OutputMode) -> Result<()> {
    let event = Event::new(&args.title, &args.description, args.color, SystemClock.now())?;
    let had_document = ctx.params.document_id.is_some();
    let session = ctx.session();

    let outcome = session.submit(event.clone())?;
    let report = match outcome {
        SubmitOutcome::Remote { document_id, total } => SubmitReport {
            destination: Destination::Remote,
            event,
            document_id: Some(document_id),
            created_document: Some(!had_document),
            total: Some(total),
            stored_locally: None,
            error: None,
        },
        SubmitOutcome::Local { stored } => SubmitReport {
            destination: Destination::Local,
            event,
            document_id: None,
            created_document: None,
            total: None,
            stored_locally: Some(stored),
            error: None,
        },
        SubmitOutcome::LocalAfterRemoteFailure { error, stored } => {
            eprintln!("{RETRY_PROMPT}");
            SubmitReport {
                destination: Destination::LocalAfterRemoteFailure,
                event,
                document_id: session.document_id().map(str::to_string),
                created_document: None,
                total: None,
                stored_locally: Some(stored),
                error: Some(format!("{}: {error}", error.code())),
            }
        }
    };

    render(output, &report, |r, w| match r.destination {
        Destination::Remote => {
            let id = r.document_id.as_deref().unwrap_or_default();
            writeln!(
                w,
                "✓ Sent \"{}\" to document {id} ({} events)",
                r.event.title,
                r.total.unwrap_or_default()
            )?;
            if r.created_document == Some(true) {
                writeln!(w, "  New document created. Share it with: pb join-url --document {id}")?;
            }
            Ok(())
        }
        Destination::Local => writeln!(
            w,
            "✓ Saved \"{}\" locally ({} pending); no token, so nothing was sent",
            r.event.title,
            r.stored_locally.unwrap_or_default()
        ),
        Destination::LocalAfterRemoteFailure => writeln!(
            w,
            "Saved \"{}\" locally ({} pending)",
            r.event.title,
            r.stored_locally.unwrap_or_default()
        ),
    })
}
