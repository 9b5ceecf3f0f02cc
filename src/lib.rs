//! **essaylens** - Essay review assistant for the command line
//!
//! Extracts essay text from PDF or pasted input, computes a lexical frequency
//! profile, and asks a text-generation service for a six-part analysis plus
//! follow-up answers grounded only in the essay.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Error taxonomy (extraction, configuration, generation, validation)
pub mod error;

/// Review pipeline - pure text processing plus the one service boundary
pub mod core {
    /// PDF/plain-text acquisition into essay text
    pub mod extract;
    pub use extract::{EssaySource, EssayText, extract};

    /// Word-frequency profiling over ASCII-letter tokens
    pub mod profile;
    pub use profile::{FrequencyEntry, FrequencyProfile, profile};

    /// Analysis and follow-up prompt templates
    pub mod prompt;
    pub use prompt::{Rubric, ScoreScale, build_analysis_prompt, build_follow_up_prompt};

    /// Generation service adapter (Gemini over blocking HTTP)
    pub mod generate;
    pub use generate::{Credential, GeminiClient, Generator};

    /// Session state and the analyze/ask workflow
    pub mod session;
    pub use session::{Analysis, AnalysisSettings, Reviewer, SessionContext};

    /// Command handlers and terminal rendering
    pub mod review;
    pub use review::{analyze_run, ask_run, profile_run};
}

/// Infrastructure - Configuration and input I/O
pub mod infra {
    /// Layered configuration (file + environment) with TOML init
    pub mod config;
    pub use self::config::{Config, init as config_init, load_config};

    /// Input reading with memory mapping for large files
    pub mod io;
    pub use self::io::{InputBytes, read_input};
}

// Strategic re-exports for clean CLI interface
pub use crate::cli::{AppContext, Cli, Commands};
pub use crate::core::{analyze_run, ask_run, profile_run};
pub use crate::error::ReviewError;
pub use crate::infra::{Config, load_config};
