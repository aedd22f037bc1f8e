use crate::output::{OutputMode, render};
use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing `.pinboard/config.toml`.
    #[arg(long)]
    pub force: bool,

    /// Participant page that `pb join-url` links point at.
    #[arg(long, value_name = "URL")]
    pub join_base: Option<String>,
}

const CONFIG_TEMPLATE: &str = "[remote]\n\
    api_base = \"https://api.github.com\"\n\
    file_name = \"events.json\"\n\
    description = \"Pinboard events\"\n\
    public = true\n\
    # timeout_secs = 30\n\
    \n\
    [poll]\n\
    interval_ms = 3000\n\
    \n\
    [fallback]\n\
    # dir = \".pinboard/data\"\n";

#[derive(Debug, Serialize)]
struct InitReport {
    config: String,
}

/// Execute `pb init`: write a default `.pinboard/config.toml`.
///
/// # Errors
///
/// Returns an error if the config already exists and `--force` is not set,
/// or if any filesystem operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let dir = project_root.join(".pinboard");
    let config_path = dir.join("config.toml");

    if config_path.exists() && !args.force {
        anyhow::bail!(".pinboard/config.toml already exists. Use `pb init --force` to overwrite.");
    }

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut content = CONFIG_TEMPLATE.to_string();
    match &args.join_base {
        Some(base) => {
            content.push_str("\n[join]\n");
            content.push_str(&format!("base_url = {}\n", toml_string(base)));
        }
        None => content.push_str("\n[join]\n# base_url = \"https://example.org/mobile.html\"\n"),
    }

    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let report = InitReport {
        config: config_path.display().to_string(),
    };
    render(output, &report, |r, w| {
        writeln!(w, "✓ Wrote {}", r.config)?;
        writeln!(w)?;
        writeln!(w, "Next steps:")?;
        writeln!(w, "  export PINBOARD_TOKEN=ghp_...   # owner token with gist scope")?;
        writeln!(w, "  pb submit --title \"First suggestion\"")
    })
}

fn toml_string(raw: &str) -> String {
    let escaped = raw.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinboard_core::config::load_project_config;

    #[test]
    fn template_parses_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let args = InitArgs {
            force: false,
            join_base: Some("https://example.org/mobile.html".into()),
        };
        run_init(&args, OutputMode::Json, dir.path()).expect("init");

        let config = load_project_config(dir.path()).expect("parse");
        assert_eq!(config.remote.file_name, "events.json");
        assert_eq!(config.poll.interval_ms, 3000);
        assert_eq!(
            config.join.base_url.as_deref(),
            Some("https://example.org/mobile.html")
        );
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().expect("temp dir");
        let args = InitArgs {
            force: false,
            join_base: None,
        };
        run_init(&args, OutputMode::Json, dir.path()).expect("first init");
        assert!(run_init(&args, OutputMode::Json, dir.path()).is_err());

        let forced = InitArgs {
            force: true,
            join_base: None,
        };
        run_init(&forced, OutputMode::Json, dir.path()).expect("forced init");
    }

    #[test]
    fn toml_string_escapes_quotes() {
        assert_eq!(toml_string(r#"a"b"#), r#""a\"b""#);
    }
}
