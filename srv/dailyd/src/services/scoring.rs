use std::collections::HashSet;

use futures_util::future::join_all;
use log::{debug, info};
use serde_json::Value;

use crate::errors::ApiError;
use crate::models::{AcceptedWord, Gloss, ScoreResult, ValidationOutcome, WordSource};
use crate::services::dictionary::DictionaryIndex;
use crate::services::resolver::DefinitionResolver;
use crate::utils::{can_form, escape_html, normalize_word};

pub const DEFAULT_MAX_WORDS: usize = 200;
pub const MAX_NAME_LEN: usize = 32;

/// Trim and escape a player name, rejecting empty or overlong ones
pub fn sanitize_name(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::Validation(format!(
            "Name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(escape_html(name))
}

/// Render one HTML fragment per accepted word, in order
pub fn render_meanings(words: &[AcceptedWord]) -> String {
    words
        .iter()
        .map(|accepted| {
            let gloss = accepted.gloss.clone().unwrap_or_default();
            let pos = gloss
                .part_of_speech
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| format!(" <em>({})</em>", escape_html(p)))
                .unwrap_or_default();
            let definition = gloss
                .definition
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(escape_html)
                .unwrap_or_else(|| "no definition available".to_string());
            format!(
                "<p><strong>{}</strong>{}: {}</p>",
                escape_html(&accepted.word.to_uppercase()),
                pos,
                definition
            )
        })
        .collect()
}

/// Scores one submission against the day's letters
pub struct ScoringEngine<'a> {
    dictionary: &'a DictionaryIndex,
    resolver: &'a DefinitionResolver,
    max_words: usize,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(dictionary: &'a DictionaryIndex, resolver: &'a DefinitionResolver, max_words: usize) -> Self {
        ScoringEngine {
            dictionary,
            resolver,
            max_words,
        }
    }

    /// Decide a single normalized word. Cheap checks run before the
    /// dictionary, and the dictionary before any provider.
    pub async fn evaluate(
        &self,
        word: &str,
        letters: &[char],
        accepted: &HashSet<String>,
    ) -> ValidationOutcome {
        let rejected = || ValidationOutcome {
            word: word.to_string(),
            accepted: false,
            source: WordSource::Rejected,
            gloss: None,
        };

        if accepted.contains(word) {
            debug!("Duplicate word ignored: {}", word);
            return rejected();
        }
        if !can_form(word, letters) {
            debug!("Word not formable from puzzle: {}", word);
            return rejected();
        }
        if self.dictionary.contains(word) {
            return ValidationOutcome {
                word: word.to_string(),
                accepted: true,
                source: WordSource::LocalDictionary,
                gloss: None,
            };
        }

        let resolution = self.resolver.resolve(word).await;
        if !resolution.accepted {
            debug!("Word rejected by all providers: {}", word);
            return rejected();
        }
        ValidationOutcome {
            word: word.to_string(),
            accepted: true,
            source: WordSource::RemoteProvider,
            gloss: resolution.gloss,
        }
    }

    /// Reject a submission wholesale when it carries too many entries
    pub fn check_size(&self, candidates: &[Value]) -> Result<(), ApiError> {
        if candidates.len() > self.max_words {
            return Err(ApiError::Validation(format!(
                "Too many words submitted (max {})",
                self.max_words
            )));
        }
        Ok(())
    }

    pub async fn score(&self, candidates: &[Value], letters: &[char]) -> Result<ScoreResult, ApiError> {
        self.check_size(candidates)?;

        let mut total_score = 0u32;
        let mut seen = HashSet::new();
        let mut outcomes: Vec<ValidationOutcome> = Vec::new();

        for candidate in candidates {
            let Some(raw) = candidate.as_str() else {
                continue;
            };
            let Some(word) = normalize_word(raw) else {
                debug!("Malformed word ignored: {:?}", raw);
                continue;
            };

            let outcome = self.evaluate(&word, letters, &seen).await;
            if outcome.accepted {
                total_score += word.chars().count() as u32;
                seen.insert(word);
                outcomes.push(outcome);
            }
        }

        let accepted_words = join_all(outcomes.into_iter().map(|outcome| async move {
            let gloss: Option<Gloss> = match outcome.source {
                WordSource::LocalDictionary => self.resolver.resolve(&outcome.word).await.gloss,
                _ => outcome.gloss,
            };
            AcceptedWord {
                word: outcome.word,
                gloss,
            }
        }))
        .await;

        info!(
            "Scored submission: {} words accepted, {} points",
            accepted_words.len(),
            total_score
        );

        Ok(ScoreResult {
            total_score,
            accepted_words,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::resolver::tests::{boxed, StubProvider};
    use crate::services::resolver::RetryPolicy;
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    const LETTERS: [char; 9] = ['C', 'A', 'T', 'D', 'O', 'G', 'Z', 'N', 'K'];

    fn policy() -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(50),
            max_attempts: 1,
        }
    }

    fn words(values: Value) -> Vec<Value> {
        values.as_array().cloned().unwrap()
    }

    #[actix_web::test]
    async fn test_duplicates_score_once() {
        let dict = DictionaryIndex::new(["cat", "dog"]);
        let resolver = DefinitionResolver::new(Vec::new(), policy());
        let engine = ScoringEngine::new(&dict, &resolver, DEFAULT_MAX_WORDS);

        let result = engine
            .score(&words(json!(["cat", "cat", "dog"])), &LETTERS)
            .await
            .unwrap();
        assert_eq!(result.total_score, 6);
        let accepted: Vec<&str> = result.accepted_words.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(accepted, vec!["cat", "dog"]);
    }

    #[actix_web::test]
    async fn test_padded_words_are_skipped() {
        let dict = DictionaryIndex::new(["cat", "dog"]);
        let resolver = DefinitionResolver::new(Vec::new(), policy());
        let engine = ScoringEngine::new(&dict, &resolver, DEFAULT_MAX_WORDS);

        let result = engine
            .score(&words(json!(["  cat\t", " dog", "dog"])), &LETTERS)
            .await
            .unwrap();
        assert_eq!(result.total_score, 3);
        assert_eq!(result.accepted_words.len(), 1);
    }

    #[actix_web::test]
    async fn test_dedup_ignores_case() {
        let dict = DictionaryIndex::new(["cat"]);
        let resolver = DefinitionResolver::new(Vec::new(), policy());
        let engine = ScoringEngine::new(&dict, &resolver, DEFAULT_MAX_WORDS);

        let result = engine.score(&words(json!(["Cat", "CAT", "cat"])), &LETTERS).await.unwrap();
        assert_eq!(result.total_score, 3);
        assert_eq!(result.accepted_words.len(), 1);
    }

    #[actix_web::test]
    async fn test_non_strings_are_skipped() {
        let dict = DictionaryIndex::new(["cat", "dog"]);
        let resolver = DefinitionResolver::new(Vec::new(), policy());
        let engine = ScoringEngine::new(&dict, &resolver, DEFAULT_MAX_WORDS);

        let result = engine
            .score(&words(json!([1, null, "cat", {"w": "dog"}, ["dog"], true, "dog"])), &LETTERS)
            .await
            .unwrap();
        assert_eq!(result.total_score, 6);
    }

    #[actix_web::test]
    async fn test_oversized_submission_does_no_work() {
        let dict = DictionaryIndex::new(["cat"]);
        let provider = StubProvider::answering("remote", "noun", "anything");
        let calls = provider.calls.clone();
        let resolver = DefinitionResolver::new(vec![boxed(provider)], policy());
        let engine = ScoringEngine::new(&dict, &resolver, 3);

        let result = engine
            .score(&words(json!(["cat", "zonk", "dog", "tack"])), &LETTERS)
            .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn test_remote_word_keeps_provider_gloss() {
        let dict = DictionaryIndex::new(["cat"]);
        let slow = StubProvider::answering("slow", "noun", "wrong answer").stalled(Duration::from_secs(10));
        let fast = StubProvider::answering("fast", "verb", "to hit hard");
        let fast_calls = fast.calls.clone();
        let resolver = DefinitionResolver::new(vec![boxed(slow), boxed(fast)], policy());
        let engine = ScoringEngine::new(&dict, &resolver, DEFAULT_MAX_WORDS);

        let result = engine.score(&words(json!(["zonk"])), &LETTERS).await.unwrap();
        assert_eq!(result.total_score, 4);
        let gloss = result.accepted_words[0].gloss.clone().unwrap();
        assert_eq!(gloss.part_of_speech.as_deref(), Some("verb"));
        assert_eq!(gloss.definition.as_deref(), Some("to hit hard"));
        // The gloss obtained during validation is reused
        assert_eq!(fast_calls.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn test_unformable_words_never_reach_providers() {
        let dict = DictionaryIndex::new(["tree"]);
        let provider = StubProvider::answering("remote", "noun", "anything");
        let calls = provider.calls.clone();
        let resolver = DefinitionResolver::new(vec![boxed(provider)], policy());
        let engine = ScoringEngine::new(&dict, &resolver, DEFAULT_MAX_WORDS);

        let result = engine
            .score(&words(json!(["tree", "xylophone", "coat!"])), &LETTERS)
            .await
            .unwrap();
        assert_eq!(result.total_score, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn test_unknown_word_is_rejected_without_error() {
        let dict = DictionaryIndex::new(["cat"]);
        let resolver = DefinitionResolver::new(vec![boxed(StubProvider::unknown("remote"))], policy());
        let engine = ScoringEngine::new(&dict, &resolver, DEFAULT_MAX_WORDS);

        let result = engine.score(&words(json!(["cat", "tonk"])), &LETTERS).await.unwrap();
        assert_eq!(result.total_score, 3);
        assert_eq!(result.accepted_words.len(), 1);
    }

    #[actix_web::test]
    async fn test_local_words_are_glossed_after_scoring() {
        let dict = DictionaryIndex::new(["cat"]);
        let resolver = DefinitionResolver::new(
            vec![boxed(StubProvider::answering("remote", "noun", "a small feline"))],
            policy(),
        );
        let engine = ScoringEngine::new(&dict, &resolver, DEFAULT_MAX_WORDS);

        let result = engine.score(&words(json!(["cat"])), &LETTERS).await.unwrap();
        let gloss = result.accepted_words[0].gloss.clone().unwrap();
        assert_eq!(gloss.definition.as_deref(), Some("a small feline"));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("  Ann  ").unwrap(), "Ann");
        assert_eq!(sanitize_name("<b>x</b>").unwrap(), "&lt;b&gt;x&lt;&#x2F;b&gt;");
        assert!(sanitize_name("   ").is_err());
        assert!(sanitize_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_render_meanings_escapes_provider_text() {
        let words = vec![
            AcceptedWord {
                word: "zonk".to_string(),
                gloss: Some(Gloss {
                    part_of_speech: Some("verb".to_string()),
                    definition: Some("<script>alert(1)</script>".to_string()),
                }),
            },
            AcceptedWord {
                word: "cat".to_string(),
                gloss: None,
            },
        ];

        assert_eq!(
            render_meanings(&words),
            "<p><strong>ZONK</strong> <em>(verb)</em>: &lt;script&gt;alert(1)&lt;&#x2F;script&gt;</p>\
             <p><strong>CAT</strong>: no definition available</p>"
        );
    }
}
