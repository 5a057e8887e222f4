mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    add, add_screen, delete, fetch, init, list, new, remove, remove_screen, set, show, AddArgs,
    Context, DeleteArgs, DesignArgs, FetchArgs, InitArgs, NewArgs, RemoveArgs, SetArgs,
};
use designer_editor::EditorConfig;

/// Designer CLI - edit stored designs from the terminal
#[derive(Parser, Debug)]
#[command(name = "designer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding stored designs (overrides config)
    #[arg(long, global = true)]
    storage_dir: Option<String>,

    /// Published-design service URL (overrides config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a designer.config.json
    Init(InitArgs),

    /// Create a new design
    New(NewArgs),

    /// List stored designs, most recently used first
    List,

    /// Print the screens and component tree of a design
    Show(DesignArgs),

    /// Add a component
    Add(AddArgs),

    /// Set or clear a component, screen or design property
    Set(SetArgs),

    /// Remove a component and everything it owns
    Remove(RemoveArgs),

    /// Append a screen
    AddScreen(DesignArgs),

    /// Remove a screen and its component tree
    RemoveScreen(RemoveArgs),

    /// Fetch a published design and store it
    Fetch(FetchArgs),

    /// Delete a stored design
    Delete(DeleteArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    let command = match cli.command {
        Command::Init(args) => return init(args, &cwd),
        command => command,
    };

    let mut config = EditorConfig::load(&cwd)?;
    if let Some(storage_dir) = cli.storage_dir {
        config.storage_dir = storage_dir;
    }
    if cli.api_url.is_some() {
        config.api_url = cli.api_url;
    }
    let ctx = Context::new(cwd, config);

    match command {
        Command::Init(_) => Ok(()),
        Command::New(args) => new(args, &ctx).await,
        Command::List => list(&ctx),
        Command::Show(args) => show(args, &ctx).await,
        Command::Add(args) => add(args, &ctx).await,
        Command::Set(args) => set(args, &ctx).await,
        Command::Remove(args) => remove(args, &ctx).await,
        Command::AddScreen(args) => add_screen(args, &ctx).await,
        Command::RemoveScreen(args) => remove_screen(args, &ctx).await,
        Command::Fetch(args) => fetch(args, &ctx).await,
        Command::Delete(args) => delete(args, &ctx).await,
    }
}
