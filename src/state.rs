use crate::quiz::Question;

/// What the bot expects from the next message of a chat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingAddInput,
    AwaitingQuizAnswer {
        question: Question,
    },
}
