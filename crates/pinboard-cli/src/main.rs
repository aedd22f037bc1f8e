#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use cmd::context::{ConnectionArgs, Context};
use output::{CliError, OutputMode};
use std::env;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "pb",
    author,
    version,
    about = "pinboard: collect map suggestions through a shared gist",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides PINBOARD_FORMAT).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Write a default project config",
        long_about = "Write .pinboard/config.toml with every setting at its default.",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    pb init\n\n    # Remember the participant page for join links\n    pb init --join-base https://example.org/mobile.html"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Show this session's role",
        long_about = "Report the role selected by the token and document id: owner, viewer, or local-only.",
        after_help = "EXAMPLES:\n    pb role\n    pb --join-url 'https://example.org/m.html?gist=abc' role --json"
    )]
    Role,

    #[command(
        next_help_heading = "Setup",
        about = "Print the participant link",
        long_about = "Build the link participants open, carrying the document id and (unless --viewer) the token.",
        after_help = "EXAMPLES:\n    pb --document abc join-url --base https://example.org/mobile.html"
    )]
    JoinUrl(cmd::join_url::JoinUrlArgs),

    #[command(
        next_help_heading = "Board",
        about = "Submit a suggestion",
        long_about = "Append one event to the shared document, or save it on this device when that is not possible.",
        after_help = "EXAMPLES:\n    pb submit --title \"Bench\" --color green\n    pb submit --title \"Tree\" --description \"near the gate\" --json"
    )]
    Submit(cmd::submit::SubmitArgs),

    #[command(
        next_help_heading = "Board",
        about = "List the shared document's events",
        long_about = "Fetch the shared document once and list its events. No token needed.",
        after_help = "EXAMPLES:\n    pb --document abc show\n    pb --document abc show --json"
    )]
    Show,

    #[command(
        next_help_heading = "Board",
        about = "Poll for new suggestions",
        long_about = "Poll the shared document and print every change. Owner only.",
        after_help = "EXAMPLES:\n    pb watch\n    pb watch --once --json\n    pb watch --interval-ms 10000"
    )]
    Watch(cmd::watch::WatchArgs),

    #[command(
        next_help_heading = "Board",
        about = "Place a pending event on the map",
        long_about = "Remove a pending event from the shared document and report it as a map point.",
        after_help = "EXAMPLES:\n    pb place 0 --lat 52.52 --lng 13.405"
    )]
    Place(cmd::place::PlaceArgs),

    #[command(
        next_help_heading = "Local",
        about = "List or clear events saved on this device",
        after_help = "EXAMPLES:\n    pb pending\n    pb pending --clear"
    )]
    Pending(cmd::pending::PendingArgs),

    #[command(
        next_help_heading = "Local",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    pb completions bash\n    pb completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("PINBOARD_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "pinboard=debug,info"
        } else {
            "pinboard=info,warn"
        })
    });

    let format = env::var("PINBOARD_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    let project_root = env::current_dir()?;

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }
    if let Commands::Init(args) = &cli.command {
        return cmd::init::run_init(args, output, &project_root);
    }

    let ctx = Context::load(&cli.connection, &project_root)?;
    debug!(role = %ctx.params.role(), data_dir = %ctx.data_dir.display(), "context loaded");

    match &cli.command {
        Commands::Role => cmd::role::run_role(&ctx, output),
        Commands::JoinUrl(args) => cmd::join_url::run_join_url(args, &ctx, output),
        Commands::Submit(args) => cmd::submit::run_submit(args, &ctx, output),
        Commands::Show => cmd::show::run_show(&ctx, output),
        Commands::Watch(args) => cmd::watch::run_watch(args, &ctx, output),
        Commands::Place(args) => cmd::place::run_place(args, &ctx, output),
        Commands::Pending(args) => cmd::pending::run_pending(args, &ctx, output),
        Commands::Init(_) | Commands::Completions(_) => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = cli.output_mode();
    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = output::render_error(output, &CliError::from(&err));
            ExitCode::FAILURE
        }
    }
}
