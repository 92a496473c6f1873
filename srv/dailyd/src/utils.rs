use std::collections::HashSet;

/// Check if a word can be spelled from the letter pool.
/// Each letter in the pool may be used at most once.
pub fn can_form(word: &str, letters: &[char]) -> bool {
    let mut pool = letters.to_vec();

    for ch in word.to_uppercase().chars() {
        match pool.iter().position(|&c| c == ch) {
            Some(idx) => {
                pool.swap_remove(idx);
            }
            None => return false,
        }
    }

    true
}

/// Count vowels and consonants in a letter sequence
pub fn count_vowels_consonants(letters: &[char], vowels: &[char]) -> (usize, usize) {
    let vowel_set: HashSet<char> = vowels.iter().map(|c| c.to_ascii_uppercase()).collect();

    let mut vowel_count = 0;
    let mut consonant_count = 0;

    for ch in letters.iter().map(|c| c.to_ascii_uppercase()) {
        if ch.is_alphabetic() {
            if vowel_set.contains(&ch) {
                vowel_count += 1;
            } else {
                consonant_count += 1;
            }
        }
    }

    (vowel_count, consonant_count)
}

/// Lowercase a submitted word. Returns None for anything that is not a plain
/// run of ASCII letters, which can never be formed from a puzzle.
pub fn normalize_word(raw: &str) -> Option<String> {
    let word = raw.to_lowercase();
    if word.is_empty() || !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(word)
}

/// Escape text for embedding in an HTML fragment
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(ch),
        }
    }
    out
}
