use std::sync::{Mutex, MutexGuard};

use rand::Rng;
use uuid::Uuid;

use super::{
    sample_targets, validate_pair,
    word::{User, UserWord, Word},
    UserRegistry, WordStore, SEED_THRESHOLD, SEED_WORDS,
};
use crate::error::{BotError, BotResult};

#[derive(Debug, Clone)]
struct Association {
    uuid: Uuid,
    user_id: Uuid,
    word_id: Uuid,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    words: Vec<Word>,
    user_words: Vec<Association>,
}

/// Process-local store with the same semantics as the Postgres [`Connection`](super::connection::Connection).
///
/// Everything is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WordStore for MemoryStore {
    async fn seed_defaults(&self) -> BotResult<usize> {
        let mut tables = self.tables();
        if tables.words.len() as i64 >= SEED_THRESHOLD {
            return Ok(0);
        }

        let mut inserted = 0;
        for (source_text, target_text) in SEED_WORDS {
            let present = tables
                .words
                .iter()
                .any(|w| w.source_text() == source_text && w.target_text() == target_text);
            if !present {
                tables
                    .words
                    .push(Word::new(source_text.to_owned(), target_text.to_owned()));
                inserted += 1;
            }
        }

        Ok(inserted)
    }

    async fn add_word(&self, source_text: &str, target_text: &str) -> BotResult<Uuid> {
        let (source_text, target_text) = validate_pair(source_text, target_text)?;
        let word = Word::new(source_text, target_text);
        let uuid = *word.uuid();
        self.tables().words.push(word);
        Ok(uuid)
    }

    async fn random_word<R: Rng + Send>(&self, rng: &mut R) -> BotResult<Word> {
        let tables = self.tables();
        if tables.words.is_empty() {
            return Err(BotError::EmptySet);
        }
        let idx = rng.gen_range(0..tables.words.len());
        Ok(tables.words[idx].clone())
    }

    async fn random_distractors<R: Rng + Send>(
        &self,
        rng: &mut R,
        exclude: &Uuid,
        count: usize,
    ) -> BotResult<Vec<String>> {
        let targets = self
            .tables()
            .words
            .iter()
            .filter(|w| w.uuid() != exclude)
            .map(|w| w.target_text().to_owned())
            .collect();

        Ok(sample_targets(rng, targets, count))
    }

    async fn count_words(&self) -> BotResult<i64> {
        Ok(self.tables().words.len() as i64)
    }

    async fn user_words(&self, user_id: &Uuid) -> BotResult<Vec<UserWord>> {
        let tables = self.tables();
        let words = tables
            .user_words
            .iter()
            .filter(|assoc| &assoc.user_id == user_id)
            .filter_map(|assoc| {
                tables
                    .words
                    .iter()
                    .find(|w| w.uuid() == &assoc.word_id)
                    .map(|w| {
                        UserWord::retreive(
                            w.source_text().to_owned(),
                            w.target_text().to_owned(),
                            assoc.uuid,
                        )
                    })
            })
            .collect();

        Ok(words)
    }

    async fn add_association(&self, user_id: &Uuid, word_id: &Uuid) -> BotResult<Uuid> {
        let mut tables = self.tables();
        // Mirrors the foreign keys of the relational schema.
        if !tables.users.iter().any(|u| u.uuid() == user_id) {
            return Err(BotError::Validation(format!("no user with id {}", user_id)));
        }
        if !tables.words.iter().any(|w| w.uuid() == word_id) {
            return Err(BotError::Validation(format!("no word with id {}", word_id)));
        }

        let assoc = Association {
            uuid: Uuid::new_v4(),
            user_id: *user_id,
            word_id: *word_id,
        };
        let uuid = assoc.uuid;
        tables.user_words.push(assoc);
        Ok(uuid)
    }

    async fn add_user_word(
        &self,
        user_id: &Uuid,
        source_text: &str,
        target_text: &str,
    ) -> BotResult<Uuid> {
        let (source_text, target_text) = validate_pair(source_text, target_text)?;
        let mut tables = self.tables();
        if !tables.users.iter().any(|u| u.uuid() == user_id) {
            return Err(BotError::Validation(format!("no user with id {}", user_id)));
        }

        let word = Word::new(source_text, target_text);
        let word_id = *word.uuid();
        tables.words.push(word);
        tables.user_words.push(Association {
            uuid: Uuid::new_v4(),
            user_id: *user_id,
            word_id,
        });
        Ok(word_id)
    }

    async fn remove_association(&self, user_id: &Uuid, assoc_id: &Uuid) -> BotResult<bool> {
        let mut tables = self.tables();
        let before = tables.user_words.len();
        tables
            .user_words
            .retain(|assoc| !(&assoc.uuid == assoc_id && &assoc.user_id == user_id));
        Ok(tables.user_words.len() < before)
    }

    async fn count_user_words(&self, user_id: &Uuid) -> BotResult<i64> {
        let count = self
            .tables()
            .user_words
            .iter()
            .filter(|assoc| &assoc.user_id == user_id)
            .count();
        Ok(count as i64)
    }
}

impl UserRegistry for MemoryStore {
    async fn register(&self, external_id: i64, display_name: &str) -> BotResult<User> {
        let mut tables = self.tables();
        if let Some(user) = tables.users.iter().find(|u| u.external_id() == external_id) {
            return Ok(user.clone());
        }

        let user = User::new(external_id, display_name.to_owned());
        tracing::info!("Registered user {} as {}", external_id, user.uuid());
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn resolve(&self, external_id: i64) -> BotResult<User> {
        self.tables()
            .users
            .iter()
            .find(|u| u.external_id() == external_id)
            .cloned()
            .ok_or(BotError::UnknownUser(external_id))
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[tokio::test]
    async fn seeding_twice_adds_nothing_new() {
        let store = MemoryStore::new();
        assert_eq!(store.seed_defaults().await.unwrap(), 10);
        assert_eq!(store.seed_defaults().await.unwrap(), 0);
        assert_eq!(store.count_words().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn seeding_skips_pairs_already_present() {
        let store = MemoryStore::new();
        store.add_word("кот", "cat").await.unwrap();
        store.add_word("море", "sea").await.unwrap();

        assert_eq!(store.seed_defaults().await.unwrap(), 9);
        assert_eq!(store.count_words().await.unwrap(), 11);
    }

    #[tokio::test]
    async fn seeding_is_skipped_for_a_full_dictionary() {
        let store = MemoryStore::new();
        for i in 0..10 {
            store.add_word(&format!("слово{i}"), &format!("word{i}")).await.unwrap();
        }

        assert_eq!(store.seed_defaults().await.unwrap(), 0);
        assert_eq!(store.count_words().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn add_word_allows_duplicates() {
        let store = MemoryStore::new();
        let first = store.add_word("море", "sea").await.unwrap();
        let second = store.add_word("море", "sea").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.count_words().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn random_word_fails_on_empty_store() {
        let store = MemoryStore::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            store.random_word(&mut rng).await,
            Err(BotError::EmptySet)
        ));
    }

    #[tokio::test]
    async fn distractors_exclude_the_prompt_word() {
        let store = MemoryStore::new();
        let sea = store.add_word("море", "sea").await.unwrap();
        store.add_word("кот", "cat").await.unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let distractors = store.random_distractors(&mut rng, &sea, 3).await.unwrap();
        assert_eq!(distractors, vec!["cat".to_owned()]);
    }

    #[tokio::test]
    async fn register_is_idempotent_and_keeps_first_name() {
        let store = MemoryStore::new();
        let first = store.register(42, "alice").await.unwrap();
        let second = store.register(42, "alice_renamed").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.display_name(), "alice");
    }

    #[tokio::test]
    async fn resolve_requires_registration() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.resolve(7).await,
            Err(BotError::UnknownUser(7))
        ));

        let user = store.register(7, "bob").await.unwrap();
        assert_eq!(store.resolve(7).await.unwrap(), user);
    }

    #[tokio::test]
    async fn removing_unknown_association_is_a_noop() {
        let store = MemoryStore::new();
        store.seed_defaults().await.unwrap();
        let user = store.register(1, "carol").await.unwrap();

        assert!(!store
            .remove_association(user.uuid(), &Uuid::new_v4())
            .await
            .unwrap());
        assert_eq!(store.count_words().await.unwrap(), 10);
        assert_eq!(store.count_user_words(user.uuid()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn removing_last_association_keeps_the_word() {
        let store = MemoryStore::new();
        let user = store.register(1, "carol").await.unwrap();
        let word = store.add_word("море", "sea").await.unwrap();
        let assoc = store.add_association(user.uuid(), &word).await.unwrap();

        let listed = store.user_words(user.uuid()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].assoc_id(), &assoc);
        assert_eq!(listed[0].to_string(), "море - sea");

        assert!(store.remove_association(user.uuid(), &assoc).await.unwrap());
        assert_eq!(store.count_user_words(user.uuid()).await.unwrap(), 0);
        assert_eq!(store.count_words().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn association_requires_existing_user_and_word() {
        let store = MemoryStore::new();
        let word = store.add_word("море", "sea").await.unwrap();
        assert!(store.add_association(&Uuid::new_v4(), &word).await.is_err());

        let user = store.register(1, "carol").await.unwrap();
        assert!(store
            .add_association(user.uuid(), &Uuid::new_v4())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn add_user_word_links_word_to_user() {
        let store = MemoryStore::new();
        let user = store.register(1, "carol").await.unwrap();
        let word = store.add_user_word(user.uuid(), " море ", "sea").await.unwrap();

        let listed = store.user_words(user.uuid()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].source_text(), "море");
        assert_eq!(store.count_words().await.unwrap(), 1);

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(store.random_word(&mut rng).await.unwrap().uuid(), &word);
    }

    #[tokio::test]
    async fn failed_add_user_word_leaves_no_orphan_word() {
        let store = MemoryStore::new();
        assert!(store
            .add_user_word(&Uuid::new_v4(), "море", "sea")
            .await
            .is_err());

        let user = store.register(1, "carol").await.unwrap();
        assert!(matches!(
            store.add_user_word(user.uuid(), "море", " ").await,
            Err(BotError::Validation(_))
        ));
        assert_eq!(store.count_words().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn association_of_another_user_is_not_removed() {
        let store = MemoryStore::new();
        let owner = store.register(1, "carol").await.unwrap();
        let other = store.register(2, "dave").await.unwrap();
        store.add_user_word(owner.uuid(), "море", "sea").await.unwrap();
        let assoc = *store.user_words(owner.uuid()).await.unwrap()[0].assoc_id();

        assert!(!store.remove_association(other.uuid(), &assoc).await.unwrap());
        assert_eq!(store.count_user_words(owner.uuid()).await.unwrap(), 1);

        assert!(store.remove_association(owner.uuid(), &assoc).await.unwrap());
        assert_eq!(store.count_user_words(owner.uuid()).await.unwrap(), 0);
    }
}
