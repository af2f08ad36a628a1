use rand::Rng;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use super::{
    sample_targets, validate_pair,
    word::{User, UserWord, Word},
    UserRegistry, WordStore, SEED_THRESHOLD, SEED_WORDS,
};
use crate::error::{BotError, BotResult};

pub struct Connection {
    pool: PgPool,
}

impl Connection {
    pub async fn connect(connection_string: &str, max_connections: u32) -> BotResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await?;
        Ok(Self { pool })
    }

    /// Applies pending migrations and seeds the dictionary.
    pub async fn prepare(&self) -> BotResult<usize> {
        tracing::debug!("Running migrations");
        sqlx::migrate!().run(&self.pool).await?;
        self.seed_defaults().await
    }
}

impl WordStore for Connection {
    async fn seed_defaults(&self) -> BotResult<usize> {
        tracing::debug!("Creating transaction");
        let mut tx = self.pool.begin().await?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM words")
            .fetch_one(&mut *tx)
            .await?;

        let mut inserted = 0;
        if count < SEED_THRESHOLD {
            for (source_text, target_text) in SEED_WORDS {
                let present = sqlx::query("SELECT 1 FROM words WHERE source_text = $1 AND target_text = $2")
                    .bind(source_text)
                    .bind(target_text)
                    .fetch_optional(&mut *tx)
                    .await?;
                if present.is_some() {
                    continue;
                }

                let word = Word::new(source_text.to_owned(), target_text.to_owned());
                tracing::debug!("Seeding word {}", word);
                sqlx::query("INSERT INTO words (uuid, source_text, target_text) VALUES ($1, $2, $3)")
                    .bind(*word.uuid())
                    .bind(word.source_text())
                    .bind(word.target_text())
                    .execute(&mut *tx)
                    .await?;
                inserted += 1;
            }
        }

        tracing::debug!("Closing transaction");
        tx.commit().await?;

        Ok(inserted)
    }

    async fn add_word(&self, source_text: &str, target_text: &str) -> BotResult<Uuid> {
        let (source_text, target_text) = validate_pair(source_text, target_text)?;
        let word = Word::new(source_text, target_text);

        let (uuid,): (Uuid,) = sqlx::query_as(
            "INSERT INTO words (uuid, source_text, target_text) VALUES ($1, $2, $3) RETURNING uuid",
        )
        .bind(*word.uuid())
        .bind(word.source_text())
        .bind(word.target_text())
        .fetch_one(&self.pool)
        .await?;

        Ok(uuid)
    }

    async fn random_word<R: Rng + Send>(&self, rng: &mut R) -> BotResult<Word> {
        let count = self.count_words().await?;
        if count < 1 {
            return Err(BotError::EmptySet);
        }

        let offset = rng.gen_range(0..count);
        let word = sqlx::query_as::<_, Word>(
            "SELECT uuid, source_text, target_text FROM words ORDER BY created_at, uuid OFFSET $1 LIMIT 1",
        )
        .bind(offset)
        .fetch_optional(&self.pool)
        .await?;

        word.ok_or(BotError::EmptySet)
    }

    async fn random_distractors<R: Rng + Send>(
        &self,
        rng: &mut R,
        exclude: &Uuid,
        count: usize,
    ) -> BotResult<Vec<String>> {
        let records: Vec<(String,)> =
            sqlx::query_as("SELECT target_text FROM words WHERE uuid <> $1")
                .bind(*exclude)
                .fetch_all(&self.pool)
                .await?;

        let targets = records.into_iter().map(|(text,)| text).collect();
        Ok(sample_targets(rng, targets, count))
    }

    async fn count_words(&self) -> BotResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM words")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn user_words(&self, user_id: &Uuid) -> BotResult<Vec<UserWord>> {
        let words = sqlx::query_as::<_, UserWord>(
            "SELECT words.source_text, words.target_text, user_words.uuid AS assoc_id FROM words INNER JOIN user_words ON words.uuid = user_words.word_id WHERE user_words.user_id = $1 ORDER BY user_words.created_at",
        )
        .bind(*user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(words)
    }

    async fn add_association(&self, user_id: &Uuid, word_id: &Uuid) -> BotResult<Uuid> {
        let (uuid,): (Uuid,) = sqlx::query_as(
            "INSERT INTO user_words (uuid, user_id, word_id) VALUES ($1, $2, $3) RETURNING uuid",
        )
        .bind(Uuid::new_v4())
        .bind(*user_id)
        .bind(*word_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(uuid)
    }

    async fn add_user_word(
        &self,
        user_id: &Uuid,
        source_text: &str,
        target_text: &str,
    ) -> BotResult<Uuid> {
        let (source_text, target_text) = validate_pair(source_text, target_text)?;
        let word = Word::new(source_text, target_text);

        tracing::debug!("Creating transaction");
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO words (uuid, source_text, target_text) VALUES ($1, $2, $3)")
            .bind(*word.uuid())
            .bind(word.source_text())
            .bind(word.target_text())
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO user_words (uuid, user_id, word_id) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(*user_id)
            .bind(*word.uuid())
            .execute(&mut *tx)
            .await?;

        tracing::debug!("Closing transaction");
        tx.commit().await?;

        Ok(*word.uuid())
    }

    async fn remove_association(&self, user_id: &Uuid, assoc_id: &Uuid) -> BotResult<bool> {
        let deleted = sqlx::query("DELETE FROM user_words WHERE uuid = $1 AND user_id = $2")
            .bind(*assoc_id)
            .bind(*user_id)
            .execute(&self.pool)
            .await?;

        Ok(deleted.rows_affected() > 0)
    }

    async fn count_user_words(&self, user_id: &Uuid) -> BotResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_words WHERE user_id = $1")
            .bind(*user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

impl UserRegistry for Connection {
    async fn register(&self, external_id: i64, display_name: &str) -> BotResult<User> {
        let existing = sqlx::query_as::<_, User>(
            "SELECT uuid, external_id, display_name FROM users WHERE external_id = $1",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(user) = existing {
            return Ok(user);
        }

        // A concurrent registration of the same id keeps the first row.
        let new_user = User::new(external_id, display_name.to_owned());
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (uuid, external_id, display_name) VALUES ($1, $2, $3) ON CONFLICT (external_id) DO UPDATE SET external_id = EXCLUDED.external_id RETURNING uuid, external_id, display_name",
        )
        .bind(*new_user.uuid())
        .bind(new_user.external_id())
        .bind(new_user.display_name())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Registered user {} as {}", external_id, user.uuid());
        Ok(user)
    }

    async fn resolve(&self, external_id: i64) -> BotResult<User> {
        let user = sqlx::query_as::<_, User>(
            "SELECT uuid, external_id, display_name FROM users WHERE external_id = $1",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or(BotError::UnknownUser(external_id))
    }
}
