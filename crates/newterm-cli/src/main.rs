//! newterm - open terminals and inspect login shell environments.
//!
//! Every command prints a single JSON document on stdout. Logs go to stderr.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "newterm")]
#[command(about = "Open a terminal at a directory, with environment overrides")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a terminal at a directory
    Launch {
        /// Directory the terminal opens in
        cwd: PathBuf,

        /// Terminal program (defaults to the platform's terminal)
        #[arg(short, long)]
        terminal: Option<String>,

        /// Set an environment variable
        #[arg(short, long = "env", value_name = "NAME=VALUE")]
        env: Vec<String>,

        /// Remove an environment variable
        #[arg(short, long = "unset", value_name = "NAME")]
        unset: Vec<String>,

        /// Windows console width
        #[arg(short, long)]
        width: Option<u32>,

        /// macOS: open a tab instead of a window
        #[arg(long)]
        tabs: bool,

        /// Arguments for a custom terminal executable
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Open a terminal from a JSON parameter object
    LaunchJson {
        /// e.g. '{"cwd": "/tmp", "env": {"FOO": "bar"}}'
        params: String,
    },

    /// Print the terminal of the running desktop session
    DefaultTerminal,

    /// Print the environment a login shell establishes
    ShellEnv {
        /// Shell to ask (defaults to the login shell)
        #[arg(short, long)]
        shell: Option<String>,

        /// Drop per-session variables so the result can be passed to a child
        #[arg(long)]
        subprocess: bool,
    },

    /// Print a login shell environment from a JSON parameter object
    ShellEnvJson {
        /// e.g. '{"shell": "/bin/zsh", "for_subprocess": true}'
        params: String,
    },

    /// Print the PATH directories a login shell establishes
    ShellPath {
        /// Shell to ask (defaults to the login shell)
        #[arg(short, long)]
        shell: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    debug!("{:?}", args.command);

    let output = match args.command {
        Command::Launch {
            cwd,
            terminal,
            env,
            unset,
            width,
            tabs,
            args,
        } => {
            let request =
                commands::launch_request(&cwd, terminal, &env, &unset, width, tabs, args)?;
            commands::launch(&request)?
        }
        Command::LaunchJson { params } => commands::launch_json(&params)?,
        Command::DefaultTerminal => commands::default_terminal()?,
        Command::ShellEnv { shell, subprocess } => {
            commands::shell_env(shell.as_deref(), subprocess)?
        }
        Command::ShellEnvJson { params } => commands::shell_env_json(&params)?,
        Command::ShellPath { shell } => commands::shell_path(shell.as_deref())?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
