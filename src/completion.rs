//! Completion scripts for `elens`.

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::{AppContext, Cli, CompletionsArgs};

/// Binary name the scripts complete for.
const BIN_NAME: &str = "elens";

/// Render the completion script for `shell`.
fn script(shell: Shell) -> Vec<u8>
{
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut cmd, BIN_NAME, &mut buf);
    buf
}

/// Print the script, or write it to `--output`.
pub fn run(
    args: CompletionsArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let script = script(args.shell);

    let Some(path) = args.output
    else
    {
        return io::stdout()
            .lock()
            .write_all(&script)
            .context("Failed to write completion script");
    };

    fs::write(&path, &script).with_context(|| format!("Failed to write {}", path.display()))?;

    if !ctx.quiet
    {
        eprintln!("Wrote {} completions to {}", args.shell, path.display());
    }
    Ok(())
}
