//! Per-session state and the analyze/ask workflow built on top of it.

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::core::extract::EssayText;
use crate::core::generate::{Credential, Generator};
use crate::core::profile::{FrequencyProfile, profile};
use crate::core::prompt::{Rubric, build_analysis_prompt, build_follow_up_prompt};
use crate::error::{ConfigurationError, Result, ValidationError};

/// State that lives for one interactive session.
#[derive(Debug, Default)]
pub struct SessionContext
{
    essay: Option<EssayText>,
    ended: bool,
}

impl SessionContext
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn essay(&self) -> Option<&EssayText>
    {
        self.essay
            .as_ref()
    }

    /// Replace the retained essay.
    pub fn set_essay(
        &mut self,
        essay: EssayText,
    )
    {
        self.essay = Some(essay);
    }

    /// Forget the retained essay.
    pub fn clear(&mut self)
    {
        self.essay = None;
    }

    /// Mark the session as finished; the essay is dropped.
    pub fn end(&mut self)
    {
        self.essay = None;
        self.ended = true;
    }

    pub fn is_ended(&self) -> bool
    {
        self.ended
    }
}

/// Outcome of one essay analysis.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis
{
    pub profile: FrequencyProfile,
    /// Service reply, verbatim
    pub text: String,
}

/// Tunables for the analysis step.
#[derive(Debug, Clone)]
pub struct AnalysisSettings
{
    pub top_n: usize,
    pub rubric: Rubric,
}

/// Drives one session: analyze an essay, then answer questions about it.
pub struct Reviewer<G>
{
    generator: G,
    settings: AnalysisSettings,
    context: SessionContext,
}

impl<G: Generator> Reviewer<G>
{
    /// Build a reviewer once a credential is available.
    ///
    /// `connect` runs only when `credential` is present, so no generator
    /// (and no service call) can exist without one.
    pub fn connect<F>(
        credential: Option<Credential>,
        settings: AnalysisSettings,
        connect: F,
    ) -> Result<Self>
    where
        F: FnOnce(Credential) -> G,
    {
        let credential = credential.ok_or(ConfigurationError::MissingCredential)?;

        let generator = connect(credential);
        debug!(backend = generator.name(), "reviewer connected");

        Ok(Self { generator, settings, context: SessionContext::new() })
    }

    pub fn context(&self) -> &SessionContext
    {
        &self.context
    }

    pub fn generator(&self) -> &G
    {
        &self.generator
    }

    /// Profile the essay, request the analysis, and retain the essay for
    /// follow-up questions.
    #[instrument(skip_all, fields(top_n = self.settings.top_n))]
    pub fn analyze(
        &mut self,
        essay: EssayText,
    ) -> Result<Analysis>
    {
        if self
            .context
            .is_ended()
        {
            return Err(ValidationError::SessionEnded.into());
        }
        if essay.is_blank()
        {
            return Err(ValidationError::EmptyEssay.into());
        }

        let profile = profile(essay.as_str(), self.settings.top_n);
        let prompt = build_analysis_prompt(&essay, &profile, &self.settings.rubric);

        let text = self
            .generator
            .generate(&prompt)?;
        info!(reply_chars = text.len(), "analysis complete");

        self.context
            .set_essay(essay);

        Ok(Analysis { profile, text })
    }

    /// Retain an essay for questions without requesting an analysis.
    pub fn retain(
        &mut self,
        essay: EssayText,
    ) -> Result<()>
    {
        if self
            .context
            .is_ended()
        {
            return Err(ValidationError::SessionEnded.into());
        }
        if essay.is_blank()
        {
            return Err(ValidationError::EmptyEssay.into());
        }

        self.context
            .set_essay(essay);
        Ok(())
    }

    /// Answer a question from the retained essay only.
    #[instrument(skip_all)]
    pub fn ask(
        &self,
        question: &str,
    ) -> Result<String>
    {
        if self
            .context
            .is_ended()
        {
            return Err(ValidationError::SessionEnded.into());
        }

        let essay = self
            .context
            .essay()
            .ok_or(ValidationError::NoEssay)?;

        let question = question.trim();
        if question.is_empty()
        {
            return Err(ValidationError::EmptyQuestion.into());
        }

        let prompt = build_follow_up_prompt(essay, question);
        Ok(self
            .generator
            .generate(&prompt)?)
    }

    /// Finish the session; later calls fail with a validation error.
    pub fn end(&mut self)
    {
        self.context
            .end();
    }
}

#[cfg(test)]
mod tests
{
    use std::cell::RefCell;

    use super::*;
    use crate::error::{GenerationError, ReviewError};

    /// Records prompts and replays queued replies.
    #[derive(Default)]
    struct SpyGenerator
    {
        replies: RefCell<Vec<Result<String, GenerationError>>>,
        prompts: RefCell<Vec<String>>,
    }

    impl SpyGenerator
    {
        fn replying(replies: Vec<Result<String, GenerationError>>) -> Self
        {
            Self { replies: RefCell::new(replies), prompts: RefCell::default() }
        }
    }

    impl Generator for SpyGenerator
    {
        fn generate(
            &self,
            prompt: &str,
        ) -> Result<String, GenerationError>
        {
            self.prompts
                .borrow_mut()
                .push(prompt.to_string());

            let mut replies = self
                .replies
                .borrow_mut();
            if replies.is_empty()
            {
                return Ok(String::new());
            }
            replies.remove(0)
        }

        fn name(&self) -> &str
        {
            "spy"
        }
    }

    fn settings() -> AnalysisSettings
    {
        AnalysisSettings { top_n: 3, rubric: Rubric::default() }
    }

    fn reviewer(spy: SpyGenerator) -> Reviewer<SpyGenerator>
    {
        Reviewer::connect(Credential::new("key"), settings(), |_| spy).unwrap()
    }

    #[test]
    fn context_set_clear_end()
    {
        let mut ctx = SessionContext::new();
        assert!(ctx.essay().is_none());

        ctx.set_essay(EssayText::new("first"));
        ctx.set_essay(EssayText::new("second"));
        assert_eq!(ctx.essay().unwrap().as_str(), "second");

        ctx.clear();
        assert!(ctx.essay().is_none());
        assert!(!ctx.is_ended());

        ctx.set_essay(EssayText::new("third"));
        ctx.end();
        assert!(ctx.essay().is_none());
        assert!(ctx.is_ended());
    }

    #[test]
    fn missing_credential_never_builds_a_generator()
    {
        let spy = SpyGenerator::default();
        let mut built = 0;

        let result = Reviewer::connect(None, settings(), |_| {
            built += 1;
            &spy
        });

        assert!(matches!(result, Err(ReviewError::Configuration(ConfigurationError::MissingCredential))));
        assert_eq!(built, 0);
        assert!(spy.prompts.borrow().is_empty());
    }

    #[test]
    fn analyze_returns_reply_verbatim_and_retains_essay()
    {
        let mut r = reviewer(SpyGenerator::replying(vec![Ok("  Analysis text\n".into())]));

        let analysis = r.analyze(EssayText::new("The cat sat on the mat. The cat ran.")).unwrap();

        assert_eq!(analysis.text, "  Analysis text\n");
        assert_eq!(analysis.profile.len(), 3);
        assert_eq!(r.context().essay().unwrap().as_str(), "The cat sat on the mat. The cat ran.");

        let prompts = r.generator().prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("the: 3"));
    }

    #[test]
    fn generation_failure_surfaces_and_keeps_session_usable()
    {
        let mut r = reviewer(SpyGenerator::replying(vec![
            Err(GenerationError::QuotaExhausted),
            Ok("second try".into()),
        ]));

        let err = r.analyze(EssayText::new("An essay.")).unwrap_err();
        assert!(matches!(err, ReviewError::Generation(GenerationError::QuotaExhausted)));
        assert!(r.context().essay().is_none());

        let ok = r.analyze(EssayText::new("An essay.")).unwrap();
        assert_eq!(ok.text, "second try");
    }

    #[test]
    fn empty_essay_is_rejected_without_a_call()
    {
        let mut r = reviewer(SpyGenerator::default());

        let err = r.analyze(EssayText::new("  \n ")).unwrap_err();
        assert!(matches!(err, ReviewError::Validation(ValidationError::EmptyEssay)));
        assert!(r.generator().prompts.borrow().is_empty());
    }

    #[test]
    fn ask_requires_essay_and_question()
    {
        let mut r = reviewer(SpyGenerator::replying(vec![Ok("analysis".into()), Ok("answer".into())]));

        assert!(matches!(r.ask("why?"), Err(ReviewError::Validation(ValidationError::NoEssay))));

        r.analyze(EssayText::new("Cats nap in sunlight.")).unwrap();
        assert!(matches!(r.ask("   "), Err(ReviewError::Validation(ValidationError::EmptyQuestion))));

        assert_eq!(r.ask("Where do cats nap?").unwrap(), "answer");

        let prompts = r.generator().prompts.borrow();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("Cats nap in sunlight."));
        assert!(prompts[1].contains("Where do cats nap?"));
    }

    #[test]
    fn retain_allows_questions_without_analysis()
    {
        let mut r = reviewer(SpyGenerator::replying(vec![Ok("answer".into())]));

        assert!(matches!(
            r.retain(EssayText::new("")),
            Err(ReviewError::Validation(ValidationError::EmptyEssay))
        ));
        r.retain(EssayText::new("Rivers shape valleys.")).unwrap();

        assert_eq!(r.ask("What shapes valleys?").unwrap(), "answer");
        assert_eq!(r.generator().prompts.borrow().len(), 1);
    }

    #[test]
    fn ended_session_refuses_work()
    {
        let mut r = reviewer(SpyGenerator::replying(vec![Ok("analysis".into())]));
        r.analyze(EssayText::new("Short essay.")).unwrap();
        r.end();

        assert!(matches!(r.ask("anything?"), Err(ReviewError::Validation(ValidationError::SessionEnded))));
        assert!(matches!(
            r.analyze(EssayText::new("Another essay.")),
            Err(ReviewError::Validation(ValidationError::SessionEnded))
        ));
        assert_eq!(r.generator().prompts.borrow().len(), 1);
    }
}
