use anyhow::Result;
use clap::Parser;
use essaylens::cli::{AppContext, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only results
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ESSAYLENS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Analyze(args) => essaylens::analyze_run(args, &ctx),
        Commands::Ask(args) => essaylens::ask_run(args, &ctx),
        Commands::Profile(args) => essaylens::profile_run(args, &ctx),
        Commands::Init(args) => essaylens::infra::config::init(args, &ctx),
        Commands::Completions(args) => essaylens::completion::run(args, &ctx),
    }
}
