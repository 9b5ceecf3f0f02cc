use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::prompt::ScoreScale;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "elens")]
#[command(about = "Essay review assistant: word-frequency profile plus LLM feedback and follow-up Q&A")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress spinners and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Print the prompts that would be sent instead of calling the service
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze an essay and optionally answer follow-up questions
    Analyze(AnalyzeArgs),

    /// Ask one question about an essay
    Ask(AskArgs),

    /// Show the word-frequency profile of an essay (no network)
    Profile(ProfileArgs),

    /// Initialize an essaylens.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Where the essay text comes from
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Essay file (PDF or UTF-8 text); `-` reads standard input
    #[arg(value_name = "INPUT", required_unless_present = "text", conflicts_with = "text")]
    pub input: Option<String>,

    /// Essay text given inline instead of a file
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,
}

/// Generation service overrides
#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    /// API key for the generation service (overrides config and environment)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Model identifier (e.g., gemini-2.5-pro)
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub service: ServiceArgs,

    /// Number of most frequent words sent with the essay
    #[arg(long)]
    pub top: Option<usize>,

    /// Score scale stated in the analysis request
    #[arg(long, value_enum)]
    pub scale: Option<ScoreScale>,

    /// Summary length in sentences (e.g., "4-5")
    #[arg(long, value_name = "RANGE")]
    pub summary_sentences: Option<String>,

    /// Follow-up question to answer after the analysis (repeatable)
    #[arg(long = "ask", value_name = "QUESTION")]
    pub questions: Vec<String>,

    /// Keep reading follow-up questions from stdin until EOF or `exit`
    #[arg(short, long)]
    pub interactive: bool,

    /// Emit JSON output (single line)
    #[arg(long, conflicts_with = "interactive")]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct AskArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub service: ServiceArgs,

    /// The question to answer from the essay
    #[arg(short, long)]
    pub question: String,
}

#[derive(Parser, Debug)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Number of most frequent words to show
    #[arg(long)]
    pub top: Option<usize>,

    /// Emit JSON output (single line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,

    /// Write the script to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}
