use state::ConversationState;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::Dialogue};

pub mod action;
pub mod commands;
pub mod config;
pub mod controller;
pub mod database;
pub mod error;
pub mod keyboard;
pub mod quiz;
pub mod schema;
pub mod state;
pub mod telemetry;

type UserDialogue = Dialogue<ConversationState, InMemStorage<ConversationState>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;
