use uuid::Uuid;

/// Menu buttons. Handlers match on these, never on raw display strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    TakeQuiz,
    AddWord,
    DeleteWord,
    Next,
}

impl MenuAction {
    pub const ALL: [MenuAction; 4] = [
        MenuAction::TakeQuiz,
        MenuAction::AddWord,
        MenuAction::DeleteWord,
        MenuAction::Next,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuAction::TakeQuiz => "Take a quiz📝",
            MenuAction::AddWord => "Add word➕",
            MenuAction::DeleteWord => "Delete word🔙",
            MenuAction::Next => "Next➡️",
        }
    }

    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.label() == text)
    }
}

const DELETE_PREFIX: &str = "del_";

pub fn deletion_token(assoc_id: &Uuid) -> String {
    format!("{DELETE_PREFIX}{assoc_id}")
}

pub fn parse_deletion_token(token: &str) -> Option<Uuid> {
    token
        .strip_prefix(DELETE_PREFIX)
        .and_then(|id| Uuid::parse_str(id).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_map_back_to_actions() {
        for action in MenuAction::ALL {
            assert_eq!(MenuAction::from_label(action.label()), Some(action));
        }
        assert_eq!(MenuAction::from_label("take a quiz"), None);
    }

    #[test]
    fn deletion_token_carries_the_association() {
        let id = Uuid::new_v4();
        assert_eq!(parse_deletion_token(&deletion_token(&id)), Some(id));
        assert_eq!(parse_deletion_token("del_42"), None);
        assert_eq!(parse_deletion_token(&id.to_string()), None);
    }
}
