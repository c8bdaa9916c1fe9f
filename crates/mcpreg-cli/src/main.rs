mod assistant;
mod cmd;
mod output;
mod prompt;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, interactive::InteractiveArgs, register::RegisterArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mcpreg",
    about = "Register MCP servers in the company registry",
    version,
    propagate_version = true
)]
struct Cli {
    /// Registry checkout root (default: nearest directory containing .git/)
    #[arg(long, global = true, env = "MCPREG_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log pipeline progress to stderr
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a server through a conversation with the assistant
    Register {
        /// Repository URL (prompted for when omitted)
        #[arg(long)]
        repo_url: Option<String>,

        /// Skip the assistant and derive metadata from the URL
        #[arg(long)]
        no_assistant: bool,

        /// Answer yes to the commit and push prompts
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Register a server by answering one question per field
    Interactive {
        /// Skip name suggestions and field review
        #[arg(long)]
        no_assistant: bool,

        /// Answer yes to the confirmation, commit and push prompts
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Inspect or create .mcpreg.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Check an existing metadata.json
    Validate {
        /// Path to the metadata document
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Register {
            repo_url,
            no_assistant,
            yes,
        } => {
            let root = root::resolve_root(cli.root.as_deref())?;
            let args = RegisterArgs {
                repo_url,
                no_assistant,
                yes,
            };
            cmd::register::run(&root, args, cli.json)
        }
        Commands::Interactive { no_assistant, yes } => {
            let root = root::resolve_root(cli.root.as_deref())?;
            let args = InteractiveArgs { no_assistant, yes };
            cmd::interactive::run(&root, args, cli.json)
        }
        Commands::Config { subcommand } => {
            let root = root::resolve_root(cli.root.as_deref())?;
            cmd::config::run(&root, subcommand, cli.json)
        }
        Commands::Validate { path } => cmd::validate::run(&path, cli.json),
    }
}
