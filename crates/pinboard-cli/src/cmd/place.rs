use crate::cmd::context::Context;
use crate::output::OutputMode;
use anyhow::{Context as _, Result};
use clap::Args;
use pinboard_core::board::{Board, MapRenderer};
use pinboard_core::{PinboardError, Point, PollOutcome};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct PlaceArgs {
    /// Position of the pending event, as listed by `pb show`.
    pub index: usize,

    /// Latitude in degrees.
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in degrees.
    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,
}

#[derive(Debug, Serialize)]
struct PlacedReport<'a> {
    document_id: &'a str,
    point: &'a Point,
    remaining: usize,
}

/// Prints each rendered point as one line.
struct TerminalRenderer<W: Write> {
    out: W,
    drawn: usize,
}

impl<W: Write> MapRenderer for TerminalRenderer<W> {
    type Handle = usize;

    fn render_point(&mut self, point: &Point, index: usize) -> usize {
        let _ = writeln!(
            self.out,
            "✓ Placed [{index}] {} at {:.5}, {:.5} ({} {})",
            point.title,
            point.lat,
            point.lng,
            point.color,
            point.color.hex()
        );
        self.drawn += 1;
        self.drawn
    }

    fn remove_rendering(&mut self, _handle: usize) {}
}

/// Execute `pb place`: move a pending event onto the map.
///
/// The event is removed from the shared document first; the point is only
/// reported once that write succeeded.
///
/// # Errors
///
/// Returns an error for out-of-range coordinates, a session without a token,
/// an unknown index, or a failed fetch or write.
pub fn run_place(args: &PlaceArgs, ctx: &Context, output: OutputMode) -> Result<()> {
    if !(-90.0..=90.0).contains(&args.lat) || !(-180.0..=180.0).contains(&args.lng) {
        anyhow::bail!("Coordinates out of range: {}, {}", args.lat, args.lng);
    }

    let session = ctx.session();
    if session.credential().is_none() {
        return Err(PinboardError::NotWritable {
            role: session.role(),
        }
        .into());
    }
    let Some(document_id) = session.document_id().map(str::to_string) else {
        anyhow::bail!("No shared document selected. Pass --document or --join-url.");
    };

    if let PollOutcome::Failed(err) = session.poll_once(|_, _| {}) {
        return Err(err).with_context(|| format!("Failed to load document {document_id}"));
    }

    let point = session.place_event(args.index, args.lat, args.lng)?;
    let remaining = session.pending_events().len();

    if output.is_json() {
        let report = PlacedReport {
            document_id: &document_id,
            point: &point,
            remaining,
        };
        let stdout = io::stdout();
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    let mut board = Board::new(TerminalRenderer {
        out: io::stdout().lock(),
        drawn: 0,
    });
    board.add(point);
    drop(board);
    println!("  {remaining} events still pending");
    Ok(())
}
