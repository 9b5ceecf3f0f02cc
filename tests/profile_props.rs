//! Property tests for the frequency profiler.

use essaylens::core::profile::{profile, tokenize};
use proptest::prelude::*;
use std::collections::HashSet;

// Mix of letters, digits, punctuation, whitespace and non-ASCII so token
// boundaries get exercised from every side.
fn essay_like() -> impl Strategy<Value = String>
{
    proptest::string::string_regex("[a-zA-Z0-9 .,;:'!?\\-\n\té]{0,200}").expect("valid regex")
}

proptest! {
    #[test]
    fn tokens_are_ascii_letter_runs(text in essay_like())
    {
        for token in tokenize(&text)
        {
            prop_assert!(!token.is_empty());
            prop_assert!(token.bytes().all(|b| b.is_ascii_lowercase()), "bad token {:?}", token);
        }
    }

    #[test]
    fn length_is_min_of_n_and_distinct(text in essay_like(), n in 0usize..20)
    {
        let distinct: HashSet<String> = tokenize(&text).into_iter().collect();
        let p = profile(&text, n);

        prop_assert_eq!(p.len(), n.min(distinct.len()));
    }

    #[test]
    fn counts_descend_and_tokens_are_unique(text in essay_like(), n in 1usize..20)
    {
        let p = profile(&text, n);
        let entries = p.entries();

        for pair in entries.windows(2)
        {
            prop_assert!(pair[0].count >= pair[1].count);
        }

        let unique: HashSet<&str> = entries.iter().map(|e| e.token.as_str()).collect();
        prop_assert_eq!(unique.len(), entries.len());
        prop_assert!(entries.iter().all(|e| e.count >= 1));
    }

    #[test]
    fn ties_follow_first_occurrence(text in essay_like())
    {
        let tokens = tokenize(&text);
        let p = profile(&text, usize::MAX);

        let first_seen = |t: &str| tokens.iter().position(|x| x == t).unwrap();
        for pair in p.entries().windows(2)
        {
            if pair[0].count == pair[1].count
            {
                prop_assert!(first_seen(&pair[0].token) < first_seen(&pair[1].token));
            }
        }
    }

    #[test]
    fn profiling_is_pure(text in essay_like(), n in 0usize..20)
    {
        prop_assert_eq!(profile(&text, n), profile(&text, n));
    }
}

#[test]
fn concrete_case()
{
    let p = profile("The cat sat on the mat. The cat ran.", 3);
    let got: Vec<(&str, usize)> = p.pairs().collect();

    assert_eq!(got, vec![("the", 3), ("cat", 2), ("sat", 1)]);
}

#[test]
fn empty_text_for_any_n()
{
    for n in [0, 1, 10, 1000]
    {
        assert!(profile("", n).is_empty());
    }
}
