use std::fmt;

use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    uuid: Uuid,
    external_id: i64,
    display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Word {
    uuid: Uuid,
    source_text: String,
    target_text: String,
}

/// A word as it appears in one user's personal list.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserWord {
    source_text: String,
    target_text: String,
    assoc_id: Uuid,
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source_text, self.target_text)
    }
}

impl fmt::Display for UserWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.source_text, self.target_text)
    }
}

impl User {
    pub fn new(external_id: i64, display_name: String) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            external_id,
            display_name,
        }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn external_id(&self) -> i64 {
        self.external_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl Word {
    pub fn new(source_text: String, target_text: String) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            source_text,
            target_text,
        }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn target_text(&self) -> &str {
        &self.target_text
    }
}

impl UserWord {
    pub fn retreive(source_text: String, target_text: String, assoc_id: Uuid) -> Self {
        Self {
            source_text,
            target_text,
            assoc_id,
        }
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn target_text(&self) -> &str {
        &self.target_text
    }

    pub fn assoc_id(&self) -> &Uuid {
        &self.assoc_id
    }
}
