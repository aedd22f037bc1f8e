use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};
use std::io::Write;

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate the script for.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Print a completion script for `pb` to stdout.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_completions(shell, command, &mut out)?;
    out.flush()?;
    Ok(())
}

fn write_completions(
    shell: Shell,
    command: &mut clap::Command,
    out: &mut dyn Write,
) -> std::io::Result<()> {
    let bin = command.get_name().to_string();
    generate(shell, command, bin, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_names_every_subcommand() {
        let mut command = clap::Command::new("pb")
            .subcommand(clap::Command::new("submit"))
            .subcommand(clap::Command::new("watch"));
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut command, &mut buf).expect("generate");
        let script = String::from_utf8(buf).expect("utf8");
        assert!(script.contains("submit"));
        assert!(script.contains("watch"));
    }
}
