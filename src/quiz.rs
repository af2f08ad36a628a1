use std::fmt;

use rand::{seq::SliceRandom, Rng};
use uuid::Uuid;

use crate::{
    action::MenuAction,
    database::{WordStore, DISTRACTOR_COUNT},
    error::BotResult,
};

/// Redraws allowed when the drawn word is the one that should be skipped.
const REDRAW_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    word_id: Uuid,
    prompt_text: String,
    correct_answer: String,
    options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Retry,
    Escape(MenuAction),
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "🇷🇺 Choose the translation of:\n{}", self.prompt_text)
    }
}

impl Question {
    pub fn new(
        word_id: Uuid,
        prompt_text: String,
        correct_answer: String,
        options: Vec<String>,
    ) -> Self {
        Self {
            word_id,
            prompt_text,
            correct_answer,
            options,
        }
    }

    pub fn word_id(&self) -> &Uuid {
        &self.word_id
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Correctness is checked before the escape buttons, so a translation that
    /// happens to equal a button label still counts as the right answer.
    pub fn evaluate(&self, reply_text: &str) -> Verdict {
        if reply_text == self.correct_answer {
            return Verdict::Correct;
        }

        match MenuAction::from_label(reply_text) {
            Some(action @ (MenuAction::Next | MenuAction::AddWord | MenuAction::DeleteWord)) => {
                Verdict::Escape(action)
            }
            _ => Verdict::Retry,
        }
    }
}

/// Draws a prompt word and up to three distractors, skipping `exclude` when
/// the dictionary has anything else to offer.
pub async fn new_question<S, R>(store: &S, rng: &mut R, exclude: Option<&Uuid>) -> BotResult<Question>
where
    S: WordStore,
    R: Rng + Send,
{
    let mut word = store.random_word(rng).await?;
    if let Some(exclude) = exclude {
        for _ in 0..REDRAW_ATTEMPTS {
            if word.uuid() != exclude {
                break;
            }
            word = store.random_word(rng).await?;
        }
    }

    let mut options = store
        .random_distractors(rng, word.uuid(), DISTRACTOR_COUNT)
        .await?;
    options.push(word.target_text().to_owned());
    options.shuffle(rng);

    tracing::debug!("Drew question for {} with {} options", word, options.len());

    Ok(Question::new(
        *word.uuid(),
        word.source_text().to_owned(),
        word.target_text().to_owned(),
        options,
    ))
}
