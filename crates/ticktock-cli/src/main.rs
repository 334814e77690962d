#![forbid(unsafe_code)]

mod cmd;
mod output;
mod prompt;

use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use cmd::Context;
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use ticktock_core::config::{load_config, resolve_data_dir};
use ticktock_core::error::ErrorCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ticktock: track tickets and the time spent on them",
    long_about = None
)]
struct Cli {
    /// Log lifecycle activity to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit JSON output (same as `--format json`).
    #[arg(long, global = true)]
    json: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Directory holding the ticket store (overrides TICKTOCK_HOME and config).
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Start tracking a ticket",
        long_about = "Create a ticket for a project and start its clock. If the project already has an active ticket you are asked whether to continue it instead.",
        after_help = "EXAMPLES:\n    # Start a ticket\n    tt new PRJ-42 --member ana --priority high\n\n    # Continue an active ticket for the same project without asking\n    tt new PRJ-42 --member ana --yes"
    )]
    New(cmd::new::NewArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Pause or resume a ticket",
        long_about = "Toggle a ticket between running and paused. Time stops accruing while paused.",
        after_help = "EXAMPLES:\n    # Pause by project ID\n    tt pause PRJ-42\n\n    # Pause the ticket in row 2, even if a project is named 2\n    tt pause '#2'"
    )]
    Pause(cmd::pause::PauseArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Resume or pause a ticket",
        long_about = "Same toggle as `tt pause`, named for the common case.",
        after_help = "EXAMPLES:\n    # Resume a paused ticket\n    tt resume PRJ-42"
    )]
    Resume(cmd::pause::PauseArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Mark a task finished",
        long_about = "Stop the clock and mark the task finished. Time from a running stretch is counted first.",
        after_help = "EXAMPLES:\n    # Finish a task\n    tt complete PRJ-42\n\n    # Emit machine-readable output\n    tt complete '#1' --json"
    )]
    Complete(cmd::complete::CompleteArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Start a correction",
        long_about = "Reopen a ticket for correction and start its clock. Accumulated time is kept.",
        after_help = "EXAMPLES:\n    # Start correcting a finished task\n    tt correct PRJ-42"
    )]
    Correct(cmd::correction::CorrectArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Complete a correction",
        long_about = "Stop the clock on a ticket under correction and mark the correction completed.",
        after_help = "EXAMPLES:\n    # Finish the correction\n    tt correct-done PRJ-42"
    )]
    CorrectDone(cmd::correction::CorrectDoneArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Restart work after a correction",
        long_about = "Fold live seconds into total hours, reset them, and start a new run on a ticket whose correction is completed.",
        after_help = "EXAMPLES:\n    # Restart a corrected ticket\n    tt restart PRJ-42"
    )]
    Restart(cmd::restart::RestartArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Edit ticket fields",
        long_about = "Override project ID, member, status or priority. Without flags on a terminal, prompts for each field with the current value as default.",
        after_help = "EXAMPLES:\n    # Reassign a ticket\n    tt edit PRJ-42 --member bo\n\n    # Set the status by hand\n    tt edit 3 --status 'task finished'\n\n    # Prompt for every field\n    tt edit 3"
    )]
    Edit(cmd::edit::EditArgs),

    #[command(
        next_help_heading = "Read",
        about = "List tickets",
        long_about = "List every ticket in creation order with hours and live time projected to now.",
        after_help = "EXAMPLES:\n    # List all tickets\n    tt list\n\n    # Only running or correcting tickets\n    tt list --active\n\n    # Emit machine-readable output\n    tt list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one ticket",
        long_about = "Show a single ticket by project ID or row number. A project ID wins over a row number; write `#N` to force row N.",
        after_help = "EXAMPLES:\n    # Show row 1\n    tt show 1\n\n    # Show by project ID\n    tt show PRJ-42 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Watch tickets tick",
        long_about = "Redraw the ticket list on an interval so running clocks can be followed live.",
        after_help = "EXAMPLES:\n    # Refresh every second until Ctrl-C\n    tt watch\n\n    # Three frames, half a second apart\n    tt watch --interval-ms 500 --ticks 3"
    )]
    Watch(cmd::watch::WatchArgs),

    #[command(
        next_help_heading = "Data",
        about = "Export tickets to a file",
        long_about = "Write every ticket, one row per ticket, to a CSV or JSON file.",
        after_help = "EXAMPLES:\n    # Write tickets.csv in the current directory\n    tt export\n\n    # Write JSON to a chosen path\n    tt export --output /tmp/today.json"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        next_help_heading = "Data",
        about = "Erase all tickets",
        long_about = "Delete every ticket and the last-saved stamp after confirmation.",
        after_help = "EXAMPLES:\n    # Ask before erasing\n    tt erase\n\n    # Erase without asking\n    tt erase --yes"
    )]
    Erase(cmd::erase::EraseArgs),

    #[command(
        next_help_heading = "Data",
        about = "Check tickets for contradictory state",
        long_about = "Report tickets whose lifecycle flags disagree with their status. Exits non-zero when any are found.",
        after_help = "EXAMPLES:\n    # Check the store\n    tt verify\n\n    # Emit machine-readable output\n    tt verify --json"
    )]
    Verify,

    #[command(
        next_help_heading = "Shell",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    tt completions bash\n\n    # Generate zsh completions\n    tt completions zsh"
    )]
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("TICKTOCK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "ticktock_core=debug,tt=debug,info"
        } else if verbose {
            "ticktock_core=info,tt=info,warn"
        } else {
            "warn"
        })
    });

    let format = env::var("TICKTOCK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

fn dispatch(command: &Commands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Commands::New(args) => cmd::new::run_new(args, ctx),
        Commands::Pause(args) | Commands::Resume(args) => cmd::pause::run_pause(args, ctx),
        Commands::Complete(args) => cmd::complete::run_complete(args, ctx),
        Commands::Correct(args) => cmd::correction::run_correct(args, ctx),
        Commands::CorrectDone(args) => cmd::correction::run_correct_done(args, ctx),
        Commands::Restart(args) => cmd::restart::run_restart(args, ctx),
        Commands::Edit(args) => cmd::edit::run_edit(args, ctx),
        Commands::List(args) => cmd::list::run_list(args, ctx),
        Commands::Show(args) => cmd::show::run_show(args, ctx),
        Commands::Watch(args) => cmd::watch::run_watch(args, ctx),
        Commands::Export(args) => cmd::export::run_export(args, ctx),
        Commands::Erase(args) => cmd::erase::run_erase(args, ctx),
        Commands::Verify => cmd::verify::run_verify(ctx),
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "tt", &mut io::stdout());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            let mode = resolve_output_mode(cli.format, cli.json, None);
            let error = CliError::with_code(format!("{err:#}"), ErrorCode::ConfigParseError);
            // Nothing else to report to if stderr itself fails.
            let _ = render_error(mode, &error);
            return ExitCode::FAILURE;
        }
    };

    let ctx = Context {
        output: resolve_output_mode(cli.format, cli.json, config.output.as_deref()),
        data_dir: resolve_data_dir(cli.data_dir.as_deref(), &config),
        quiet: cli.quiet,
        config,
    };
    debug!(data_dir = %ctx.data_dir.display(), output = ?ctx.output, "resolved context");

    match dispatch(&cli.command, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = render_error(ctx.output, &CliError::from(&err));
            ExitCode::FAILURE
        }
    }
}
