//! Command handlers: acquire the essay, run the session, render results.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing::{debug, instrument, warn};

use crate::cli::{AnalyzeArgs, AppContext, AskArgs, InputArgs, ProfileArgs, ServiceArgs};
use crate::core::extract::{EssaySource, EssayText, extract};
use crate::core::generate::{Credential, GeminiClient, Generator};
use crate::core::profile::{FrequencyProfile, profile};
use crate::core::prompt::{Rubric, build_analysis_prompt, build_follow_up_prompt};
use crate::core::session::{AnalysisSettings, Reviewer};
use crate::error::{ExtractionError, ReviewError, ValidationError};
use crate::infra::config::{Config, load_config};
use crate::infra::io::{expand_path, has_pdf_extension, read_input, read_stdin};

/// Words that end an interactive session.
const END_WORDS: [&str; 3] = ["exit", "quit", ":q"];

/// Read the essay named by the input flags.
///
/// Pasted text and text files are trimmed here; PDF text is already trimmed
/// by the extractor.
#[instrument(level = "debug", skip_all)]
pub fn load_essay(input: &InputArgs) -> Result<EssayText, ExtractionError>
{
    if let Some(text) = &input.text
    {
        return extract(EssaySource::Text(text.trim()));
    }

    let (bytes, named_pdf) = match input
        .input
        .as_deref()
    {
        None | Some("-") => (read_stdin()?, false),
        Some(raw) =>
        {
            let path = expand_path(raw);
            (read_input(&path)?, has_pdf_extension(&path))
        }
    };

    debug!(bytes = bytes.as_ref().len(), named_pdf, "read essay input");

    match EssaySource::sniff(bytes.as_ref(), named_pdf)?
    {
        EssaySource::Text(text) => extract(EssaySource::Text(text.trim())),
        pdf => extract(pdf),
    }
}

fn reads_stdin(input: &InputArgs) -> bool
{
    input.text.is_none() && matches!(input.input.as_deref(), None | Some("-"))
}

fn heading(
    ctx: &AppContext,
    title: &str,
) -> String
{
    if ctx.no_color
    {
        format!("== {title} ==")
    }
    else
    {
        format!("== {title} ==").bold().cyan().to_string()
    }
}

fn spinner(
    ctx: &AppContext,
    msg: &'static str,
) -> ProgressBar
{
    if ctx.quiet
    {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(msg);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Ask the user for a key on the terminal; blank input is `None`.
fn prompt_for_key() -> Result<Option<Credential>>
{
    eprint!("Enter your generation service API key: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read API key")?;

    Ok(Credential::new(line))
}

fn connect(
    cfg: &Config,
    service: &ServiceArgs,
    credential: Option<Credential>,
    settings: AnalysisSettings,
) -> Result<Reviewer<GeminiClient>, ReviewError>
{
    let model = service
        .model
        .as_deref()
        .unwrap_or(&cfg.model);

    Reviewer::connect(credential, settings, |key| GeminiClient::new(&cfg.endpoint, model, key))
}

fn rubric_for(
    cfg: &Config,
    args: &AnalyzeArgs,
) -> Rubric
{
    let mut rubric = cfg
        .rubric
        .clone();
    if let Some(scale) = args.scale
    {
        rubric.score_scale = scale;
    }
    if let Some(sentences) = &args.summary_sentences
    {
        rubric.summary_sentences = sentences.clone();
    }
    rubric
}

/// The follow-up prompt `--dry-run` prints, refused for the same blank
/// questions a live session refuses.
fn dry_run_follow_up(
    essay: &EssayText,
    question: &str,
) -> Result<String, ValidationError>
{
    let question = question.trim();
    if question.is_empty()
    {
        return Err(ValidationError::EmptyQuestion);
    }
    Ok(build_follow_up_prompt(essay, question))
}

#[derive(Serialize)]
struct QaPair<'a>
{
    question: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct AnalyzeReport<'a>
{
    profile: &'a FrequencyProfile,
    analysis: &'a str,
    answers: Vec<QaPair<'a>>,
}

pub fn analyze_run(
    args: AnalyzeArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let cfg = load_config()?;

    if args.interactive && reads_stdin(&args.input)
    {
        anyhow::bail!("--interactive reads questions from stdin; pass the essay as a file or with --text");
    }

    let essay = load_essay(&args.input)?;
    if essay.is_blank()
    {
        return Err(ReviewError::from(ValidationError::EmptyEssay).into());
    }

    let settings = AnalysisSettings {
        top_n: args
            .top
            .unwrap_or(cfg.top_n),
        rubric: rubric_for(&cfg, &args),
    };

    if !ctx.quiet && !args.json
    {
        println!("{}", heading(ctx, "Essay Text Preview"));
        println!("{}\n", essay.preview(cfg.preview_chars));
    }

    if ctx.dry_run
    {
        let p = profile(essay.as_str(), settings.top_n);
        println!("{}", build_analysis_prompt(&essay, &p, &settings.rubric));
        for q in &args.questions
        {
            match dry_run_follow_up(&essay, q)
            {
                Ok(prompt) => println!("{prompt}"),
                Err(err) => println!("error: {err}"),
            }
        }
        return Ok(());
    }

    let mut credential = cfg.credential(
        args.service
            .api_key
            .as_deref(),
    );
    if credential.is_none() && args.interactive
    {
        credential = prompt_for_key()?;
    }

    let mut reviewer = connect(&cfg, &args.service, credential, settings)?;

    let pb = spinner(ctx, "Analyzing essay...");
    let analysis = reviewer.analyze(essay);
    pb.finish_and_clear();
    let analysis = analysis?;

    if !args.json
    {
        println!("{}", heading(ctx, "Analysis Results"));
        println!("{}", analysis.text);
    }

    // A failed question is reported in its slot; later questions still run
    let mut answers = Vec::with_capacity(args.questions.len());
    for question in &args.questions
    {
        let pb = spinner(ctx, "Answering...");
        let answer = reviewer.ask(question);
        pb.finish_and_clear();

        let qa = match answer
        {
            Ok(text) => QaPair { question, answer: Some(text), error: None },
            Err(err) =>
            {
                warn!(error = %err, "follow-up failed");
                QaPair { question, answer: None, error: Some(err.to_string()) }
            }
        };

        if !args.json
        {
            println!("\n{}", heading(ctx, &format!("Q: {}", qa.question)));
            match (&qa.answer, &qa.error)
            {
                (Some(text), _) => println!("{text}"),
                (None, Some(err)) => println!("error: {err}"),
                (None, None) => {}
            }
        }
        answers.push(qa);
    }

    if args.json
    {
        let report = AnalyzeReport { profile: &analysis.profile, analysis: &analysis.text, answers };
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    if args.interactive
    {
        let stdin = io::stdin();
        let asked = follow_up_loop(&mut reviewer, stdin.lock(), io::stdout(), ctx)?;
        debug!(asked, "interactive session finished");
    }

    Ok(())
}

/// Answer one question per input line until EOF or an end word.
///
/// Errors for a single question are reported and the loop continues.
/// Returns the number of questions answered successfully.
pub fn follow_up_loop<G, R, W>(
    reviewer: &mut Reviewer<G>,
    input: R,
    mut out: W,
    ctx: &AppContext,
) -> Result<usize>
where
    G: Generator,
    R: BufRead,
    W: Write,
{
    let mut answered = 0;

    if !ctx.quiet
    {
        writeln!(out, "\nAsk questions about the essay (`exit` to finish).")?;
    }

    for line in input.lines()
    {
        let line = line.context("Failed to read question")?;
        let question = line.trim();

        if END_WORDS
            .iter()
            .any(|w| question.eq_ignore_ascii_case(w))
        {
            break;
        }
        if question.is_empty()
        {
            continue;
        }

        let pb = spinner(ctx, "Answering...");
        let answer = reviewer.ask(question);
        pb.finish_and_clear();

        match answer
        {
            Ok(text) =>
            {
                writeln!(out, "{text}")?;
                answered += 1;
            }
            Err(err) =>
            {
                warn!(error = %err, "follow-up failed");
                writeln!(out, "error: {err}")?;
            }
        }
    }

    reviewer.end();
    if !ctx.quiet
    {
        writeln!(out, "Session ended.")?;
    }

    Ok(answered)
}

pub fn ask_run(
    args: AskArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let cfg = load_config()?;
    let essay = load_essay(&args.input)?;

    if ctx.dry_run
    {
        if essay.is_blank()
        {
            return Err(ReviewError::from(ValidationError::EmptyEssay).into());
        }
        println!("{}", dry_run_follow_up(&essay, &args.question).map_err(ReviewError::from)?);
        return Ok(());
    }

    let credential = cfg.credential(
        args.service
            .api_key
            .as_deref(),
    );
    let settings = AnalysisSettings { top_n: cfg.top_n, rubric: cfg.rubric.clone() };
    let mut reviewer = connect(&cfg, &args.service, credential, settings)?;

    // A one-shot question skips the analysis call
    reviewer.retain(essay)?;

    let pb = spinner(ctx, "Answering...");
    let answer = reviewer.ask(&args.question);
    pb.finish_and_clear();

    println!("{}", answer?);
    Ok(())
}

#[derive(Tabled)]
struct ProfileRow<'a>
{
    #[tabled(rename = "#")]
    rank: usize,
    word: &'a str,
    count: usize,
}

pub fn profile_run(
    args: ProfileArgs,
    _ctx: &AppContext,
) -> Result<()>
{
    let cfg = load_config()?;
    let essay = load_essay(&args.input)?;
    let p = profile(
        essay.as_str(),
        args.top
            .unwrap_or(cfg.top_n),
    );

    if args.json
    {
        println!("{}", serde_json::to_string(&p)?);
        return Ok(());
    }

    if p.is_empty()
    {
        println!("No words found.");
        return Ok(());
    }

    let rows: Vec<ProfileRow<'_>> = p
        .pairs()
        .enumerate()
        .map(|(i, (word, count))| ProfileRow { rank: i + 1, word, count })
        .collect();

    println!("{}", Table::new(rows));
    Ok(())
}
