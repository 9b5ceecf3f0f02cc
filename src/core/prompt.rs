//! Prompt templates sent to the generation service.
//!
//! Both templates are a contract with the service: keep the wording stable so
//! evaluations stay reproducible. Builders are pure and never touch the network.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::extract::EssayText;
use crate::core::profile::FrequencyProfile;

/// Numeric scale the overall score is reported on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScoreScale
{
    /// 0 to 100
    #[default]
    Percent,
    /// 1 to 10
    Ten,
}

impl ScoreScale
{
    pub fn bounds(self) -> (u8, u8)
    {
        match self
        {
            ScoreScale::Percent => (0, 100),
            ScoreScale::Ten => (1, 10),
        }
    }
}

impl fmt::Display for ScoreScale
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        let (lo, hi) = self.bounds();
        write!(f, "{lo}-{hi}")
    }
}

/// Deployment constants of the analysis rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rubric
{
    pub score_scale: ScoreScale,
    /// Summary length in sentences, e.g. "4-5"
    pub summary_sentences: String,
}

impl Default for Rubric
{
    fn default() -> Self
    {
        Self { score_scale: ScoreScale::Percent, summary_sentences: "4-5".to_string() }
    }
}

/// Instruction asking for the six-part essay analysis.
pub fn build_analysis_prompt(
    essay: &EssayText,
    profile: &FrequencyProfile,
    rubric: &Rubric,
) -> String
{
    let (lo, hi) = rubric
        .score_scale
        .bounds();
    let table = profile.render();

    let mut out = String::with_capacity(
        essay
            .as_str()
            .len()
            + table.len()
            + 1024,
    );

    out.push_str("Analyze the following essay. Answer in exactly six numbered sections:\n\n");
    out.push_str(&format!(
        "1. Summary - a concise summary of the essay in {} sentences.\n",
        rubric.summary_sentences
    ));
    out.push_str(
        "2. Sentence-final expressions - analyze how the sentences end and what patterns exist.\n",
    );
    out.push_str(&format!(
        "3. Frequently used words - confirm the word frequencies below.\n   Word frequency (top {}):\n",
        profile.len()
    ));
    for line in table.lines()
    {
        out.push_str("   ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(
        "4. Writing quality - comment on organization, vocabulary, coherence and grammar.\n",
    );
    out.push_str("5. Areas for improvement - give constructive, specific suggestions.\n");
    out.push_str(&format!(
        "6. Overall evaluation - give one integer score from {lo} to {hi}, where {lo} is the lowest and {hi} the highest possible score, formatted as \"Score: N/{hi}\".\n"
    ));
    out.push_str("\nEssay:\n");
    out.push_str(essay.as_str());
    out.push('\n');

    out
}

/// Instruction answering a question from the essay alone.
pub fn build_follow_up_prompt(
    essay: &EssayText,
    question: &str,
) -> String
{
    format!(
        "Essay:\n{essay}\n\nQuestion: {question}\n\n\
         Answer concisely and accurately using only the essay above as your source. \
         Do not use outside knowledge. If the essay does not contain the answer, say so.\n",
        essay = essay.as_str(),
    )
}
