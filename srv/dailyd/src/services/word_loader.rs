use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;
use log::{info, warn};

use crate::errors::StartupError;
use crate::services::dictionary::DictionaryIndex;

/// Load words from a plain text file (one word per line)
pub fn load_words(file_path: &Path) -> io::Result<HashSet<String>> {
    let file = File::open(file_path)?;
    let reader = io::BufReader::new(file);

    let mut words = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        let word = line.trim();
        if !word.is_empty() {
            words.insert(word.to_lowercase());
        }
    }

    Ok(words)
}

/// Load the lexicon and apply the optional insertions and deletions lists.
/// A missing or unreadable lexicon is fatal; the side lists are not.
pub fn load_dictionary(base_dir: &str, lang: &str) -> Result<DictionaryIndex, StartupError> {
    let lang_dir = Path::new(base_dir).join("words").join(lang);

    let lexicon_path = lang_dir.join("lexicon.txt");
    let insertions_path = lang_dir.join("insertions.txt");
    let deletions_path = lang_dir.join("deletions.txt");

    let mut words = load_words(&lexicon_path).map_err(|source| StartupError::Lexicon {
        path: lexicon_path.display().to_string(),
        source,
    })?;

    if insertions_path.exists() {
        match load_words(&insertions_path) {
            Ok(inserted) => {
                info!("Inserted {} words into {} lexicon.", inserted.len(), lang);
                words.extend(inserted);
            }
            Err(e) => warn!("Ignoring unreadable insertions at {}: {}", insertions_path.display(), e),
        }
    }

    if deletions_path.exists() {
        match load_words(&deletions_path) {
            Ok(deleted) => {
                info!("Deleted {} words from {} lexicon.", deleted.len(), lang);
                for word in deleted {
                    words.remove(&word);
                }
            }
            Err(e) => warn!("Ignoring unreadable deletions at {}: {}", deletions_path.display(), e),
        }
    }

    if words.is_empty() {
        return Err(StartupError::EmptyLexicon(lexicon_path.display().to_string()));
    }

    info!("Total valid words for {}: {}", lang, words.len());
    Ok(DictionaryIndex::new(words))
}
