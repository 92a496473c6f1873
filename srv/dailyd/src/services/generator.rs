use log::{debug, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::services::dictionary::DictionaryIndex;
use crate::utils::{can_form, count_vowels_consonants};

pub const VOWELS: [char; 5] = ['A', 'E', 'I', 'O', 'U'];
pub const CONSONANTS: [char; 21] = [
    'B', 'C', 'D', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'V', 'W',
    'X', 'Y', 'Z',
];

pub const PUZZLE_SIZE: usize = 9;
pub const MIN_WORD_LEN: usize = 5;
pub const MAX_ATTEMPTS: u32 = 10;

/// The day's letter pool together with how it was reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPuzzle {
    pub seed: String,
    pub attempt: u32,
    pub letters: Vec<char>,
    pub valid: bool,
}

/// 64-bit FNV-1a. Seeds the letter stream, so it must never change once
/// puzzles have been served.
fn fnv1a(input: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    input.bytes().fold(OFFSET, |hash, b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

fn draw_index(rng: &mut ChaCha8Rng, len: usize) -> usize {
    (rng.gen::<f64>() * len as f64).floor() as usize
}

/// Generate the letter pool for a seed and attempt.
/// The order of draws is fixed: vowel count, vowels, consonants, shuffle.
pub fn generate_letters(seed: &str, attempt: u32) -> Vec<char> {
    let mut rng = ChaCha8Rng::seed_from_u64(fnv1a(&format!("{}{}", seed, attempt)));

    let vowel_count = draw_index(&mut rng, 3) + 3;
    let mut letters = Vec::with_capacity(PUZZLE_SIZE);

    for _ in 0..vowel_count {
        letters.push(VOWELS[draw_index(&mut rng, VOWELS.len())]);
    }
    for _ in 0..(PUZZLE_SIZE - vowel_count) {
        letters.push(CONSONANTS[draw_index(&mut rng, CONSONANTS.len())]);
    }

    for i in (1..PUZZLE_SIZE).rev() {
        let j = draw_index(&mut rng, i + 1);
        letters.swap(i, j);
    }

    letters
}

/// True if at least one dictionary word of MIN_WORD_LEN or more can be
/// formed from the letters
pub fn is_playable(letters: &[char], dictionary: &DictionaryIndex) -> bool {
    dictionary
        .iter()
        .any(|word| word.chars().count() >= MIN_WORD_LEN && can_form(word, letters))
}

/// Regenerate with increasing attempts until the pool is playable.
/// Falls back to the last draw when no attempt succeeds.
pub fn daily_puzzle(seed: &str, dictionary: &DictionaryIndex) -> DailyPuzzle {
    let mut attempt = 0;
    loop {
        let letters = generate_letters(seed, attempt);
        if is_playable(&letters, dictionary) {
            let (vowels, _) = count_vowels_consonants(&letters, &VOWELS);
            debug!("Puzzle for {} found on attempt {} ({} vowels)", seed, attempt, vowels);
            return DailyPuzzle { seed: seed.to_string(), attempt, letters, valid: true };
        }

        if attempt + 1 >= MAX_ATTEMPTS {
            warn!(
                "No playable puzzle for {} within {} attempts; using last draw",
                seed, MAX_ATTEMPTS
            );
            return DailyPuzzle { seed: seed.to_string(), attempt, letters, valid: false };
        }
        attempt += 1;
    }
}

/// Today's seed: the UTC calendar date as YYYY-MM-DD
pub fn today_seed() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}
