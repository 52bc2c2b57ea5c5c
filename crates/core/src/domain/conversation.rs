use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::catalog::ItemId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn speaker(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, text: text.into() }
    }
}

/// Chronological chat transcript holding at least one non-blank user turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new(turns: Vec<ConversationTurn>) -> Result<Self, DomainError> {
        if turns.is_empty() {
            return Err(DomainError::EmptyConversation);
        }

        let turns = turns
            .into_iter()
            .map(|turn| ConversationTurn { role: turn.role, text: turn.text.trim().to_string() })
            .filter(|turn| !turn.text.is_empty())
            .collect::<Vec<_>>();

        if !turns.iter().any(|turn| turn.role == Role::User) {
            return Err(DomainError::MissingUserTurn);
        }

        Ok(Self { turns })
    }

    /// Treats every text as a user turn, the shape the analyze endpoint receives.
    pub fn from_user_texts<I, S>(texts: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(ConversationTurn::user).collect())
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// `Speaker: text` lines, one per turn.
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.role.speaker(), turn.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub conversation: Conversation,
    pub excluded_ids: BTreeSet<ItemId>,
}

impl RecommendationRequest {
    pub fn new(conversation: Conversation) -> Self {
        Self { conversation, excluded_ids: BTreeSet::new() }
    }

    pub fn with_excluded_ids<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = ItemId>,
    {
        self.excluded_ids.extend(ids);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Conversation, ConversationTurn, RecommendationRequest};
    use crate::domain::catalog::ItemId;
    use crate::errors::DomainError;

    #[test]
    fn rejects_empty_and_assistant_only_conversations() {
        assert_eq!(Conversation::new(Vec::new()), Err(DomainError::EmptyConversation));
        assert_eq!(
            Conversation::new(vec![ConversationTurn::assistant("Hi, what do you run?")]),
            Err(DomainError::MissingUserTurn)
        );
        assert_eq!(
            Conversation::from_user_texts(["   ", ""]),
            Err(DomainError::MissingUserTurn)
        );
    }

    #[test]
    fn transcript_keeps_order_and_drops_blank_turns() {
        let conversation = Conversation::new(vec![
            ConversationTurn::user("I run a pizza delivery restaurant in Bali"),
            ConversationTurn::assistant("  "),
            ConversationTurn::assistant("What slows you down today?"),
            ConversationTurn::user("Cash handling"),
        ])
        .expect("conversation should be valid");

        assert_eq!(conversation.turns().len(), 3);
        assert_eq!(
            conversation.transcript(),
            "User: I run a pizza delivery restaurant in Bali\n\
             Assistant: What slows you down today?\n\
             User: Cash handling"
        );
    }

    #[test]
    fn request_accumulates_exclusions() {
        let conversation = Conversation::from_user_texts(["gym owner"]).expect("valid");
        let request = RecommendationRequest::new(conversation)
            .with_excluded_ids([ItemId(4), ItemId(2)])
            .with_excluded_ids([ItemId(4)]);

        assert_eq!(request.excluded_ids.into_iter().collect::<Vec<_>>(), vec![ItemId(2), ItemId(4)]);
    }
}
