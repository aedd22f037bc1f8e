use crate::cmd::context::Context;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use anyhow::Result;
use pinboard_core::Role;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct RoleReport {
    role: Role,
    document_id: Option<String>,
    has_token: bool,
    polls: bool,
    data_dir: String,
}

/// Execute `pb role`: report what this invocation is allowed to do.
///
/// # Errors
///
/// Returns an error if writing output fails.
pub fn run_role(ctx: &Context, output: OutputMode) -> Result<()> {
    let params = &ctx.params;
    let report = RoleReport {
        role: params.role(),
        document_id: params.document_id.clone(),
        has_token: params.credential.is_some(),
        polls: params.credential.is_some() && params.document_id.is_some(),
        data_dir: ctx.data_dir.display().to_string(),
    };

    render_mode(
        output,
        &report,
        |r, w| writeln!(w, "{}\t{}", r.role, r.document_id.as_deref().unwrap_or("-")),
        |r, w| {
            pretty_section(w, "Session")?;
            pretty_kv(w, "Role", r.role.as_str())?;
            pretty_kv(w, "Document", r.document_id.as_deref().unwrap_or("(none)"))?;
            pretty_kv(w, "Token", if r.has_token { "present" } else { "absent" })?;
            pretty_kv(w, "Polling", if r.polls { "on" } else { "off" })?;
            pretty_kv(w, "Local data", &r.data_dir)
        },
    )
}
