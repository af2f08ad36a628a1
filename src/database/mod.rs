use std::future::Future;

use rand::{seq::SliceRandom, Rng};
use uuid::Uuid;

use crate::error::{BotError, BotResult};

pub mod connection;
pub mod memory;
pub mod word;

use word::{User, UserWord, Word};

/// Pairs inserted into a fresh dictionary so the quiz has something to ask.
pub const SEED_WORDS: [(&str, &str); 10] = [
    ("книга", "book"),
    ("собака", "dog"),
    ("яблоко", "apple"),
    ("карандаш", "pencil"),
    ("дом", "house"),
    ("цветок", "flower"),
    ("кот", "cat"),
    ("машина", "car"),
    ("школа", "school"),
    ("учитель", "teacher"),
];

/// Seeding is skipped once the dictionary holds at least this many words.
pub const SEED_THRESHOLD: i64 = 10;

pub const DISTRACTOR_COUNT: usize = 3;

pub trait WordStore: Send + Sync {
    /// Inserts the missing seed pairs when the dictionary is small. Returns how many were added.
    fn seed_defaults(&self) -> impl Future<Output = BotResult<usize>> + Send;

    fn add_word(
        &self,
        source_text: &str,
        target_text: &str,
    ) -> impl Future<Output = BotResult<Uuid>> + Send;

    fn random_word<R: Rng + Send>(&self, rng: &mut R)
        -> impl Future<Output = BotResult<Word>> + Send;

    /// Up to `count` target texts of words other than `exclude`, without repetition.
    fn random_distractors<R: Rng + Send>(
        &self,
        rng: &mut R,
        exclude: &Uuid,
        count: usize,
    ) -> impl Future<Output = BotResult<Vec<String>>> + Send;

    fn count_words(&self) -> impl Future<Output = BotResult<i64>> + Send;

    fn user_words(&self, user_id: &Uuid) -> impl Future<Output = BotResult<Vec<UserWord>>> + Send;

    fn add_association(
        &self,
        user_id: &Uuid,
        word_id: &Uuid,
    ) -> impl Future<Output = BotResult<Uuid>> + Send;

    /// Inserts a new word and links it to `user_id` as one unit: either both rows exist afterwards or neither does.
    /// Returns the word id.
    fn add_user_word(
        &self,
        user_id: &Uuid,
        source_text: &str,
        target_text: &str,
    ) -> impl Future<Output = BotResult<Uuid>> + Send;

    /// Deletes the association only when it belongs to `user_id`. Returns `false` when nothing was deleted.
    fn remove_association(
        &self,
        user_id: &Uuid,
        assoc_id: &Uuid,
    ) -> impl Future<Output = BotResult<bool>> + Send;

    fn count_user_words(&self, user_id: &Uuid) -> impl Future<Output = BotResult<i64>> + Send;
}

pub trait UserRegistry: Send + Sync {
    /// Existing records are returned unchanged, display name included.
    fn register(
        &self,
        external_id: i64,
        display_name: &str,
    ) -> impl Future<Output = BotResult<User>> + Send;

    fn resolve(&self, external_id: i64) -> impl Future<Output = BotResult<User>> + Send;
}

pub trait Store: WordStore + UserRegistry + 'static {}

impl<T: WordStore + UserRegistry + 'static> Store for T {}

pub(crate) fn validate_pair(source_text: &str, target_text: &str) -> BotResult<(String, String)> {
    let (source_text, target_text) = (source_text.trim(), target_text.trim());
    if source_text.is_empty() || target_text.is_empty() {
        return Err(BotError::Validation(
            "both the word and its translation must be non-empty".into(),
        ));
    }
    Ok((source_text.to_owned(), target_text.to_owned()))
}

pub(crate) fn sample_targets<R: Rng + ?Sized>(
    rng: &mut R,
    targets: Vec<String>,
    count: usize,
) -> Vec<String> {
    targets.choose_multiple(rng, count).cloned().collect()
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn validate_pair_trims_both_sides() {
        let pair = validate_pair("  море ", " sea").unwrap();
        assert_eq!(pair, ("море".to_owned(), "sea".to_owned()));
    }

    #[test]
    fn validate_pair_rejects_blank_side() {
        assert!(matches!(
            validate_pair("море", "   "),
            Err(BotError::Validation(_))
        ));
        assert!(matches!(validate_pair("", "sea"), Err(BotError::Validation(_))));
    }

    #[test]
    fn sample_targets_never_exceeds_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        let sampled = sample_targets(&mut rng, vec!["dog".into()], DISTRACTOR_COUNT);
        assert_eq!(sampled, vec!["dog".to_owned()]);
    }

    #[test]
    fn sample_targets_does_not_repeat_entries() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool: Vec<String> = SEED_WORDS.iter().map(|(_, en)| en.to_string()).collect();
        let mut sampled = sample_targets(&mut rng, pool, DISTRACTOR_COUNT);
        assert_eq!(sampled.len(), DISTRACTOR_COUNT);
        sampled.sort();
        sampled.dedup();
        assert_eq!(sampled.len(), DISTRACTOR_COUNT);
    }
}
