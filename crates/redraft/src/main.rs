use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use redraft::infra::config::Config;
use redraft::ui::repl::Repl;

#[derive(Parser)]
#[command(
    name = "redraft",
    version,
    about = "Curate file context, paste edit instructions, apply model-suggested whole-file edits"
)]
struct Cli {
    /// Workspace root; defaults to the current directory.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Override the configured model identifier.
    #[arg(long)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    redraft::init();
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut command = Cli::command();
        let name = command.get_name().to_string();
        clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load()?;
    if let Some(model) = cli.model {
        config.defaults.model = model;
    }

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    let mut repl = Repl::new(root, config)?;
    repl.run()
}
