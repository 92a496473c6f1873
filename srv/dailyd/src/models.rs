use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::dictionary::DictionaryIndex;
use crate::services::leaderboard::LeaderboardStore;
use crate::services::resolver::DefinitionResolver;

/// Application state shared across all handlers
pub struct AppState {
    pub dictionary: DictionaryIndex,
    pub resolver: DefinitionResolver,
    pub leaderboard: Box<dyn LeaderboardStore>,
    pub max_words: usize,
}

/// Part of speech and definition for a word, as returned by a provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gloss {
    pub part_of_speech: Option<String>,
    pub definition: Option<String>,
}

/// What the resolver concluded about a word absent from the dictionary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub accepted: bool,
    pub gloss: Option<Gloss>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSource {
    LocalDictionary,
    RemoteProvider,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub word: String,
    pub accepted: bool,
    pub source: WordSource,
    pub gloss: Option<Gloss>,
}

/// An accepted word with its resolved gloss
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedWord {
    pub word: String,
    pub gloss: Option<Gloss>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResult {
    pub total_score: u32,
    pub accepted_words: Vec<AcceptedWord>,
}

#[derive(Serialize)]
pub struct ChallengeResponse {
    pub letters: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub name: String,
    pub found_words: Vec<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub success: bool,
    pub validated_score: u32,
    pub meanings: String,
}
