use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::{
    action::{deletion_token, MenuAction},
    database::word::UserWord,
};

fn action_row(actions: &[MenuAction]) -> Vec<KeyboardButton> {
    actions
        .iter()
        .map(|action| KeyboardButton::new(action.label()))
        .collect()
}

pub(crate) fn menu_keyboard() -> KeyboardMarkup {
    let keyboard = vec![
        action_row(&[MenuAction::TakeQuiz, MenuAction::AddWord]),
        action_row(&[MenuAction::DeleteWord]),
    ];

    KeyboardMarkup::new(keyboard)
}

/// Answer options two per row, followed by the escape buttons.
pub(crate) fn question_keyboard(options: &[String]) -> KeyboardMarkup {
    let mut keyboard: Vec<Vec<KeyboardButton>> = options
        .chunks(2)
        .map(|row| row.iter().map(|option| KeyboardButton::new(option)).collect())
        .collect();

    keyboard.push(action_row(&[MenuAction::Next, MenuAction::AddWord]));
    keyboard.push(action_row(&[MenuAction::DeleteWord]));

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn deletion_keyboard(words: &[UserWord]) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = words
        .iter()
        .map(|word| {
            vec![InlineKeyboardButton::callback(
                word.to_string(),
                deletion_token(word.assoc_id()),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}
