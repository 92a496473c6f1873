use std::collections::HashSet;

/// Read-only set of known words, lowercased at construction.
/// Built once at startup and shared by reference; there is no mutation path.
pub struct DictionaryIndex {
    words: HashSet<String>,
}

impl DictionaryIndex {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        DictionaryIndex { words }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }
}
