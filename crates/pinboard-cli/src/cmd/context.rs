//! Connection flags and per-invocation session wiring.

use anyhow::{Context as _, Result};
use clap::Args;
use pinboard_core::clock::SystemClock;
use pinboard_core::config::{self, ProjectConfig};
use pinboard_core::fallback::FallbackStore;
use pinboard_core::remote::GistStore;
use pinboard_core::role::JoinLink;
use pinboard_core::{ConnectionParams, Session};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Global flags that select the shared document and the credential.
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Token with write access to the shared document.
    #[arg(long, global = true, env = "PINBOARD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Id of the shared document.
    #[arg(long, global = true, env = "PINBOARD_DOCUMENT")]
    pub document: Option<String>,

    /// Participant link carrying `gist` and `token` query parameters.
    #[arg(long, global = true, value_name = "URL")]
    pub join_url: Option<String>,

    /// Directory for events that could not be sent.
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

impl ConnectionArgs {
    /// Merge the join link (if any) with explicit flags; flags win.
    ///
    /// Raw values are merged first so the credential is validated once.
    ///
    /// # Errors
    ///
    /// Returns an error if `--join-url` is not a valid URL.
    pub fn params(&self) -> Result<ConnectionParams> {
        let link = match &self.join_url {
            Some(raw) => {
                JoinLink::parse(raw).with_context(|| format!("Invalid join link: {raw}"))?
            }
            None => JoinLink::default(),
        };

        let token = non_blank(self.token.as_deref()).or(link.token.as_deref());
        let document = non_blank(self.document.as_deref()).or(link.document_id.as_deref());
        Ok(ConnectionParams::new(token, document))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Everything a command needs: config, parameters, and where local state
/// lives.
#[derive(Debug)]
pub struct Context {
    pub project_root: PathBuf,
    pub config: ProjectConfig,
    pub params: ConnectionParams,
    pub data_dir: PathBuf,
}

impl Context {
    /// # Errors
    ///
    /// Fails on an unreadable config file or a malformed join link.
    pub fn load(args: &ConnectionArgs, project_root: &Path) -> Result<Self> {
        let config = config::load_project_config(project_root)?;
        let params = args.params()?;
        let data_dir = config::resolve_data_dir(
            args.data_dir.as_deref(),
            std::env::var_os("PINBOARD_DATA_DIR").map(PathBuf::from),
            &config.fallback,
            project_root,
        );

        Ok(Self {
            project_root: project_root.to_path_buf(),
            config,
            params,
            data_dir,
        })
    }

    pub fn fallback(&self) -> FallbackStore {
        FallbackStore::new(&self.data_dir)
    }

    /// Open a session against the configured Gist endpoint.
    pub fn session(&self) -> Session<GistStore> {
        Session::new(
            self.params.clone(),
            GistStore::new(self.config.remote.clone()),
            Arc::new(SystemClock),
            self.fallback(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinboard_core::Role;
    use pinboard_core::remote::Credential;
    use std::io;
    use std::sync::{Mutex, PoisonError};

    #[test]
    fn join_link_supplies_missing_flags() {
        let args = ConnectionArgs {
            join_url: Some("https://example.org/m.html?gist=abc&token=ghp_x".into()),
            ..ConnectionArgs::default()
        };
        let params = args.params().expect("params");
        assert_eq!(params.document_id.as_deref(), Some("abc"));
        assert_eq!(params.role(), Role::Owner);
    }

    #[test]
    fn explicit_flags_override_join_link() {
        let args = ConnectionArgs {
            document: Some("xyz".into()),
            join_url: Some("https://example.org/m.html?gist=abc".into()),
            ..ConnectionArgs::default()
        };
        let params = args.params().expect("params");
        assert_eq!(params.document_id.as_deref(), Some("xyz"));
        assert_eq!(params.role(), Role::Viewer);
    }

    #[test]
    fn blank_flag_falls_back_to_join_link() {
        let args = ConnectionArgs {
            token: Some("  ".into()),
            join_url: Some("https://example.org/m.html?gist=abc&token=ghp_x".into()),
            ..ConnectionArgs::default()
        };
        let params = args.params().expect("params");
        assert_eq!(
            params.credential.as_ref().map(Credential::expose),
            Some("ghp_x")
        );
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn unusual_link_token_is_reported_once() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let args = ConnectionArgs {
            join_url: Some("https://example.org/m.html?gist=abc&token=odd-token".into()),
            ..ConnectionArgs::default()
        };
        let params =
            tracing::subscriber::with_default(subscriber, || args.params()).expect("params");
        assert_eq!(params.role(), Role::Owner);

        let logs = String::from_utf8(
            captured
                .0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        )
        .expect("utf8");
        assert_eq!(logs.matches("token format looks unusual").count(), 1);
    }

    #[test]
    fn malformed_join_link_is_rejected() {
        let args = ConnectionArgs {
            join_url: Some("::nope".into()),
            ..ConnectionArgs::default()
        };
        assert!(args.params().is_err());
    }

    #[test]
    fn data_dir_flag_wins() {
        let dir = tempfile::tempdir().expect("temp dir");
        let args = ConnectionArgs {
            data_dir: Some(dir.path().join("state")),
            ..ConnectionArgs::default()
        };
        let ctx = Context::load(&args, dir.path()).expect("load");
        assert_eq!(ctx.data_dir, dir.path().join("state"));
        assert_eq!(ctx.params.role(), Role::LocalOnly);
    }
}
