use crate::cmd::context::Context;
use crate::output::{OutputMode, render};
use anyhow::{Context as _, Result};
use clap::Args;
use pinboard_core::role;
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct JoinUrlArgs {
    /// Participant page to link to. Defaults to `join.base_url` from config.
    #[arg(long, value_name = "URL")]
    pub base: Option<String>,

    /// Leave the token out, producing a read-only viewer link.
    #[arg(long)]
    pub viewer: bool,
}

#[derive(Debug, Serialize)]
struct JoinReport {
    url: String,
    includes_token: bool,
}

/// Execute `pb join-url`: print the link participants open to submit.
///
/// # Errors
///
/// Returns an error when no base URL or no document is available, or the
/// base URL is malformed.
pub fn run_join_url(args: &JoinUrlArgs, ctx: &Context, output: OutputMode) -> Result<()> {
    let Some(base) = args.base.as_deref().or(ctx.config.join.base_url.as_deref()) else {
        anyhow::bail!("No participant page configured. Pass --base or set join.base_url.");
    };
    let Some(document_id) = ctx.params.document_id.as_deref() else {
        anyhow::bail!("No document to share. Pass --document, or submit once as owner to create one.");
    };

    let credential = if args.viewer {
        None
    } else {
        ctx.params.credential.as_ref()
    };
    let url = role::join_url(base, Some(document_id), credential)
        .with_context(|| format!("Invalid base URL: {base}"))?;

    let report = JoinReport {
        url,
        includes_token: credential.is_some(),
    };
    render(output, &report, |r, w| {
        writeln!(w, "{}", r.url)?;
        if r.includes_token {
            writeln!(w, "  Anyone with this link can write to the board.")?;
        }
        Ok(())
    })
}
