use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};
use teloxide::{prelude::Requester, types::Message, utils::command::BotCommands, Bot};
use tracing::instrument;

use crate::{
    controller::{advance, Event, Reply},
    database::Store,
    schema::render,
    state::ConversationState,
    HandlerResult, UserDialogue,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "register and show the menu.")]
    Start,
    #[command(description = "drop the current step and go back to the menu.")]
    Cancel,
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue))]
pub(crate) async fn cancel(bot: Bot, dialogue: UserDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "Cancelling the current step.")
        .await?;
    render(&bot, msg.chat.id, vec![Reply::Menu]).await?;
    dialogue.update(ConversationState::Idle).await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, store))]
pub(crate) async fn start<S: Store>(
    bot: Bot,
    msg: Message,
    dialogue: UserDialogue,
    state: ConversationState,
    store: Arc<S>,
) -> HandlerResult {
    let (external_id, display_name) = match msg.from.as_ref() {
        Some(user) => (
            user.id.0 as i64,
            user.username.clone().unwrap_or_else(|| user.first_name.clone()),
        ),
        None => (msg.chat.id.0, msg.chat.first_name().unwrap_or_default().to_owned()),
    };

    let mut rng = StdRng::from_entropy();
    let transition = advance(
        store.as_ref(),
        &mut rng,
        state,
        Event::Start {
            external_id,
            display_name,
        },
    )
    .await?;

    render(&bot, msg.chat.id, transition.replies).await?;
    dialogue.update(transition.next).await?;
    Ok(())
}
