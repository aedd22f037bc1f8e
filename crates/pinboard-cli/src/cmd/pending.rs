use crate::cmd::context::Context;
use crate::cmd::{write_event_lines, write_event_rows};
use crate::output::{OutputMode, pretty_section, render, render_mode};
use anyhow::Result;
use clap::Args;
use pinboard_core::Event;
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct PendingArgs {
    /// Delete every locally stored event.
    #[arg(long)]
    pub clear: bool,
}

#[derive(Debug, Serialize)]
struct PendingReport {
    path: String,
    events: Vec<Event>,
}

#[derive(Debug, Serialize)]
struct ClearReport {
    path: String,
    cleared: usize,
}

/// Execute `pb pending`: list or clear events saved on this device.
///
/// # Errors
///
/// Returns an error if the local list cannot be read or rewritten.
pub fn run_pending(args: &PendingArgs, ctx: &Context, output: OutputMode) -> Result<()> {
    let fallback = ctx.fallback();
    let path = fallback.path().display().to_string();

    if args.clear {
        let report = ClearReport {
            cleared: fallback.clear()?,
            path,
        };
        return render(output, &report, |r, w| {
            writeln!(w, "✓ Cleared {} locally stored events", r.cleared)
        });
    }

    let report = PendingReport {
        events: fallback.load()?,
        path,
    };
    render_mode(
        output,
        &report,
        |r, w| write_event_rows(w, &r.events, 0),
        |r, w| {
            pretty_section(w, &format!("Stored on this device ({})", r.events.len()))?;
            if r.events.is_empty() {
                writeln!(w, "  (nothing pending)")
            } else {
                write_event_lines(w, &r.events, 0)
            }
        },
    )
}
