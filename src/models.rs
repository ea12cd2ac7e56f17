use std::fmt;

use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::amount::Amount;
use crate::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        UserId(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub external_id: i64,
    pub delivery_address: i64,
}

/// Where a user is in the add-expense conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingAmount,
    AwaitingTitle { amount: Amount },
}

impl ConversationState {
    pub fn kind(&self) -> ActionKind {
        match self {
            ConversationState::Idle => ActionKind::None,
            ConversationState::AwaitingAmount => ActionKind::AwaitingAmount,
            ConversationState::AwaitingTitle { .. } => ActionKind::AwaitingTitle,
        }
    }

    pub fn staged_amount(&self) -> Option<Amount> {
        match self {
            ConversationState::AwaitingTitle { amount } => Some(*amount),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    None,
    AwaitingAmount,
    AwaitingTitle,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::None => ACTION_NONE,
            ActionKind::AwaitingAmount => ACTION_AWAIT_AMOUNT,
            ActionKind::AwaitingTitle => ACTION_AWAIT_TITLE,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            ACTION_NONE => Some(ActionKind::None),
            ACTION_AWAIT_AMOUNT => Some(ActionKind::AwaitingAmount),
            ACTION_AWAIT_TITLE => Some(ActionKind::AwaitingTitle),
            _ => None,
        }
    }
}

/// Persisted conversation cursor, one row per owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub owner: UserId,
    pub state: ConversationState,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expense {
    pub amount: Amount,
    pub title: String,
    pub recorded_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyTotal {
    pub owner: UserId,
    pub month_start: Date,
    pub total_cents: i64,
}

/// One inbound text message from the messaging gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub external_id: i64,
    pub delivery_address: i64,
    pub text: String,
}

/// The single outbound message produced for an [`InboundEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Attach the main menu keyboard.
    pub keyboard: bool,
}

impl Reply {
    pub fn with_keyboard(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            keyboard: true,
        }
    }

    pub fn bare(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            keyboard: false,
        }
    }
}
