//! Conversation state machine.
//!
//! [`advance`] takes the current [`ConversationState`] of a chat together with
//! one inbound [`Event`] and returns the next state plus the replies to send.
//! It never talks to the transport, so a whole dialogue can be replayed in a
//! test against [`MemoryStore`](crate::database::memory::MemoryStore) and a
//! seeded random source.

use rand::Rng;

use crate::{
    action::{parse_deletion_token, MenuAction},
    database::{validate_pair, word::UserWord, Store},
    error::{BotError, BotResult},
    quiz::{new_question, Question, Verdict},
    state::ConversationState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start {
        external_id: i64,
        display_name: String,
    },
    Text {
        external_id: i64,
        text: String,
    },
    DeletionSelected {
        external_id: i64,
        token: String,
    },
    /// A sticker, photo or anything else without text.
    NonText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Menu,
    AddPrompt,
    Question(Question),
    Retry,
    DeletionList(Vec<UserWord>),
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: ConversationState,
    pub replies: Vec<Reply>,
}

impl Transition {
    fn new(next: ConversationState, replies: Vec<Reply>) -> Self {
        Self { next, replies }
    }

    fn idle(replies: Vec<Reply>) -> Self {
        Self::new(ConversationState::Idle, replies)
    }
}

pub async fn advance<S, R>(
    store: &S,
    rng: &mut R,
    state: ConversationState,
    event: Event,
) -> BotResult<Transition>
where
    S: Store,
    R: Rng + Send,
{
    let result = match (state, event) {
        (
            _,
            Event::Start {
                external_id,
                display_name,
            },
        ) => start(store, external_id, &display_name).await,
        // Deletion preempts whatever step was pending.
        (_, Event::DeletionSelected { external_id, token }) => {
            delete_selected(store, external_id, &token).await
        }
        (_, Event::NonText) => Ok(Transition::idle(vec![Reply::Menu])),
        (ConversationState::Idle, Event::Text { external_id, text }) => {
            choose_what_to_do(store, rng, external_id, &text).await
        }
        (ConversationState::AwaitingAddInput, Event::Text { external_id, text }) => {
            receive_word_pair(store, external_id, &text).await
        }
        (ConversationState::AwaitingQuizAnswer { question }, Event::Text { external_id, text }) => {
            receive_answer(store, rng, external_id, question, &text).await
        }
    };

    recover(result)
}

/// Turns user-facing failures into a message and a fresh menu.
fn recover(result: BotResult<Transition>) -> BotResult<Transition> {
    let text = match result {
        Ok(transition) => return Ok(transition),
        Err(BotError::Validation(reason)) => {
            format!("Could not add the word: {reason}. Try again from the menu.")
        }
        Err(BotError::EmptySet) => "There are no words to practise yet. Add one first!".into(),
        Err(BotError::UnknownUser(id)) => {
            tracing::warn!("Unregistered user {} tried to change their list", id);
            "Please send /start first.".into()
        }
        Err(e) => return Err(e),
    };

    Ok(Transition::idle(vec![Reply::Text(text), Reply::Menu]))
}

async fn start<S: Store>(store: &S, external_id: i64, display_name: &str) -> BotResult<Transition> {
    let user = store.register(external_id, display_name).await?;
    Ok(Transition::idle(vec![
        Reply::Text(format!(
            "Hello, {}! Welcome to EnglishCard!",
            user.display_name()
        )),
        Reply::Menu,
    ]))
}

async fn choose_what_to_do<S, R>(
    store: &S,
    rng: &mut R,
    external_id: i64,
    text: &str,
) -> BotResult<Transition>
where
    S: Store,
    R: Rng + Send,
{
    match MenuAction::from_label(text) {
        Some(MenuAction::TakeQuiz) => {
            tracing::info!("{} chooses to take a quiz", external_id);
            ask(store, rng, None).await
        }
        Some(MenuAction::AddWord) => {
            tracing::info!("{} chooses to add a word", external_id);
            Ok(Transition::new(
                ConversationState::AwaitingAddInput,
                vec![Reply::AddPrompt],
            ))
        }
        Some(MenuAction::DeleteWord) => {
            tracing::info!("{} chooses to delete a word", external_id);
            deletion_menu(store, external_id).await
        }
        Some(MenuAction::Next) | None => {
            tracing::info!("{}: invalid input {:?}", external_id, text);
            Ok(Transition::idle(vec![
                Reply::Text("Choose an action from the menu.".into()),
                Reply::Menu,
            ]))
        }
    }
}

async fn ask<S, R>(store: &S, rng: &mut R, previous: Option<&Question>) -> BotResult<Transition>
where
    S: Store,
    R: Rng + Send,
{
    let question = new_question(store, rng, previous.map(Question::word_id)).await?;
    Ok(Transition::new(
        ConversationState::AwaitingQuizAnswer {
            question: question.clone(),
        },
        vec![Reply::Question(question)],
    ))
}

async fn receive_answer<S, R>(
    store: &S,
    rng: &mut R,
    external_id: i64,
    question: Question,
    text: &str,
) -> BotResult<Transition>
where
    S: Store,
    R: Rng + Send,
{
    let verdict = question.evaluate(text);
    tracing::info!(
        "{} answers {:?} to '{}': {:?}",
        external_id,
        text,
        question.prompt_text(),
        verdict
    );

    match verdict {
        Verdict::Correct => {
            let mut transition = ask(store, rng, Some(&question)).await?;
            transition.replies.insert(
                0,
                Reply::Text(format!(
                    "Well done! ❤️\n{} -> {}\n\nLet's keep going 👉",
                    question.prompt_text(),
                    question.correct_answer()
                )),
            );
            Ok(transition)
        }
        Verdict::Escape(MenuAction::AddWord) => Ok(Transition::new(
            ConversationState::AwaitingAddInput,
            vec![Reply::AddPrompt],
        )),
        Verdict::Escape(MenuAction::DeleteWord) => deletion_menu(store, external_id).await,
        Verdict::Escape(_) => ask(store, rng, Some(&question)).await,
        Verdict::Retry => Ok(Transition::new(
            ConversationState::AwaitingQuizAnswer { question },
            vec![Reply::Retry],
        )),
    }
}

/// Splits `source,target` on its only comma.
pub fn parse_word_pair(text: &str) -> BotResult<(String, String)> {
    match text.split(',').collect::<Vec<_>>().as_slice() {
        [source_text, target_text] => validate_pair(source_text, target_text),
        _ => Err(BotError::Validation(
            "expected the word and its translation separated by a single comma".into(),
        )),
    }
}

async fn receive_word_pair<S: Store>(
    store: &S,
    external_id: i64,
    text: &str,
) -> BotResult<Transition> {
    let user = store.resolve(external_id).await?;
    let (source_text, target_text) = parse_word_pair(text)?;

    store
        .add_user_word(user.uuid(), &source_text, &target_text)
        .await?;
    let count = store.count_user_words(user.uuid()).await?;

    tracing::info!(
        "{} added '{}' -> '{}', {} words in total",
        external_id,
        source_text,
        target_text,
        count
    );

    Ok(Transition::idle(vec![
        Reply::Text(format!("Word added! You now have {count} words.")),
        Reply::Menu,
    ]))
}

async fn deletion_menu<S: Store>(store: &S, external_id: i64) -> BotResult<Transition> {
    let user = store.resolve(external_id).await?;
    let words = store.user_words(user.uuid()).await?;

    if words.is_empty() {
        return Ok(Transition::idle(vec![
            Reply::Text("You have no words to delete.".into()),
            Reply::Menu,
        ]));
    }

    Ok(Transition::idle(vec![Reply::DeletionList(words)]))
}

async fn delete_selected<S: Store>(
    store: &S,
    external_id: i64,
    token: &str,
) -> BotResult<Transition> {
    let Some(assoc_id) = parse_deletion_token(token) else {
        tracing::warn!("Ignoring malformed deletion token {:?}", token);
        return Ok(Transition::idle(vec![Reply::Menu]));
    };

    let user = store.resolve(external_id).await?;
    if store.remove_association(user.uuid(), &assoc_id).await? {
        tracing::info!("{} deleted association {}", external_id, assoc_id);
    } else {
        tracing::info!(
            "{}: association {} is gone or belongs to someone else",
            external_id,
            assoc_id
        );
    }

    Ok(Transition::idle(vec![Reply::Deleted, Reply::Menu]))
}
