use std::{net::SocketAddr, sync::Arc};

use rand::{rngs::StdRng, SeedableRng};
use teloxide::{
    dispatching::{
        dialogue::{self, InMemStorage},
        Dispatcher, UpdateFilterExt, UpdateHandler,
    },
    dptree,
    error_handlers::LoggingErrorHandler,
    payloads::{AnswerCallbackQuerySetters, SendMessageSetters},
    prelude::Requester,
    types::{CallbackQuery, ChatId, Message, ReplyMarkup, Update},
    update_listeners::webhooks::{self, Options},
    Bot,
};
use tracing::instrument;
use url::Url;

use crate::{
    commands::{cancel, help, start, Command},
    controller::{advance, Event, Reply},
    database::Store,
    keyboard::{deletion_keyboard, menu_keyboard, question_keyboard},
    state::ConversationState,
    HandlerResult, UserDialogue,
};

pub fn schema<S: Store>() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start::<S>))
        .branch(case![Command::Cancel].endpoint(cancel));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .endpoint(receive_message::<S>);

    dialogue::enter::<Update, InMemStorage<ConversationState>, ConversationState, _>()
        .branch(message_handler)
        .branch(Update::filter_callback_query().endpoint(receive_deletion::<S>))
}

/// Runs the bot until ctrl-c, via webhook when `webhook` is set and long polling otherwise.
pub async fn dispatch<S: Store>(
    bot: Bot,
    store: Arc<S>,
    webhook: Option<(Url, SocketAddr)>,
) -> HandlerResult {
    let mut dispatcher = Dispatcher::builder(bot.clone(), schema::<S>())
        .dependencies(dptree::deps![InMemStorage::<ConversationState>::new(), store])
        .enable_ctrlc_handler()
        .build();

    match webhook {
        Some((url, addr)) => {
            tracing::info!("Listening for webhook updates on {} for {}", addr, url);
            let listener = webhooks::axum(bot, Options::new(addr, url)).await?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
        None => {
            tracing::info!("Polling for updates");
            dispatcher.dispatch().await;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, store))]
async fn receive_message<S: Store>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    state: ConversationState,
    store: Arc<S>,
) -> HandlerResult {
    let external_id = msg
        .from
        .as_ref()
        .map(|user| user.id.0 as i64)
        .unwrap_or(msg.chat.id.0);

    let event = match msg.text() {
        Some(text) => Event::Text {
            external_id,
            text: text.to_owned(),
        },
        None => {
            tracing::info!("{}: non-text message", external_id);
            Event::NonText
        }
    };

    let mut rng = StdRng::from_entropy();
    let transition = advance(store.as_ref(), &mut rng, state, event).await?;

    render(&bot, msg.chat.id, transition.replies).await?;
    dialogue.update(transition.next).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, store))]
async fn receive_deletion<S: Store>(
    bot: Bot,
    q: CallbackQuery,
    dialogue: UserDialogue,
    state: ConversationState,
    store: Arc<S>,
) -> HandlerResult {
    let Some(token) = q.data.clone() else {
        bot.answer_callback_query(&q.id).await?;
        return Ok(());
    };

    let mut rng = StdRng::from_entropy();
    let transition = advance(
        store.as_ref(),
        &mut rng,
        state,
        Event::DeletionSelected {
            external_id: q.from.id.0 as i64,
            token,
        },
    )
    .await?;

    let chat_id = dialogue.chat_id();
    if transition.replies.contains(&Reply::Deleted) {
        bot.answer_callback_query(&q.id).text("Word deleted!").await?;
        if let Some(message) = &q.message {
            bot.edit_message_text(chat_id, message.id(), "Word deleted.")
                .await?;
        }
    } else {
        bot.answer_callback_query(&q.id).await?;
    }

    let replies = transition
        .replies
        .into_iter()
        .filter(|reply| reply != &Reply::Deleted)
        .collect();
    render(&bot, chat_id, replies).await?;
    dialogue.update(transition.next).await?;
    Ok(())
}

pub(crate) async fn render(bot: &Bot, chat_id: ChatId, replies: Vec<Reply>) -> HandlerResult {
    for reply in replies {
        match reply {
            Reply::Text(text) => {
                bot.send_message(chat_id, text).await?;
            }
            Reply::Menu => {
                bot.send_message(chat_id, "Choose an action:")
                    .reply_markup(menu_keyboard())
                    .await?;
            }
            Reply::AddPrompt => {
                bot.send_message(
                    chat_id,
                    "Send the Russian word and its English translation separated by a comma (for example: море,sea)",
                )
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            }
            Reply::Question(question) => {
                bot.send_message(chat_id, question.to_string())
                    .reply_markup(question_keyboard(question.options()))
                    .await?;
            }
            Reply::Retry => {
                bot.send_message(chat_id, "❌ Wrong, try again!").await?;
                bot.send_message(chat_id, "Choose the right option once more:")
                    .await?;
            }
            Reply::DeletionList(words) => {
                bot.send_message(chat_id, "Choose a word to delete:")
                    .reply_markup(deletion_keyboard(&words))
                    .await?;
            }
            Reply::Deleted => {
                bot.send_message(chat_id, "Word deleted.").await?;
            }
        }
    }

    Ok(())
}
