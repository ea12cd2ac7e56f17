//! Conversation engine: turns one inbound text into one reply and at most one
//! state change.
//!
//! Fixed commands always win over the pending conversation, so issuing
//! `Add expense` mid-flow simply restarts it. Free text is interpreted
//! according to the persisted [`ConversationState`].

use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::amount::{normalize_title, parse_amount};
use crate::constants::*;
use crate::error::{AccessError, DenyReason, StoreError};
use crate::locks::UserLocks;
use crate::models::{ConversationState, InboundEvent, Reply, UserId};
use crate::store::RecordStore;
use crate::users::UserRegistry;
use crate::utils::{day_fragment, month_label, month_start, previous_month_start};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Welcome,
    AddExpense,
    SeeExpenses,
    SeeLastMonth,
}

impl Command {
    /// Recognizes keyboard buttons and the `/start` and `/help` commands.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            BUTTON_ADD_EXPENSE => return Some(Command::AddExpense),
            BUTTON_SEE_EXPENSES => return Some(Command::SeeExpenses),
            BUTTON_SEE_LAST_MONTH => return Some(Command::SeeLastMonth),
            _ => {}
        }

        let first = text.split_whitespace().next()?;
        let command = first.split('@').next().unwrap_or(first);
        if command == COMMAND_START || command == COMMAND_HELP {
            Some(Command::Welcome)
        } else {
            None
        }
    }
}

pub struct Engine<S> {
    store: S,
    registry: UserRegistry,
    locks: UserLocks,
}

impl<S: RecordStore> Engine<S> {
    pub fn new(store: S, registry: UserRegistry) -> Self {
        Self {
            store,
            registry,
            locks: UserLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn handle(&self, event: &InboundEvent) -> Reply {
        self.handle_at(event, OffsetDateTime::now_utc()).await
    }

    /// Same as [`handle`](Self::handle) with an explicit clock.
    pub async fn handle_at(&self, event: &InboundEvent, now: OffsetDateTime) -> Reply {
        let user = match self
            .registry
            .authorize_and_resolve(&self.store, event.external_id, event.delivery_address)
            .await
        {
            Ok(user) => user,
            Err(AccessError::Denied(DenyReason::NotAllowed)) => return Reply::bare(MSG_DENIED),
            Err(AccessError::Denied(DenyReason::NotProvisioned)) => {
                return Reply::bare(MSG_NOT_PROVISIONED);
            }
            Err(AccessError::Store(_)) => return Reply::with_keyboard(MSG_STORE_FAILURE),
        };

        let _guard = self.locks.lock(user).await;

        let text = event.text.trim();
        let outcome = match Command::parse(text) {
            Some(command) => self.run_command(user, command, now).await,
            None => self.continue_conversation(user, text, now).await,
        };

        outcome.unwrap_or_else(|_| Reply::with_keyboard(MSG_STORE_FAILURE))
    }

    async fn run_command(
        &self,
        user: UserId,
        command: Command,
        now: OffsetDateTime,
    ) -> Result<Reply, StoreError> {
        match command {
            Command::Welcome => Ok(Reply::with_keyboard(MSG_WELCOME)),
            Command::AddExpense => {
                self.store
                    .set_state(user, ConversationState::AwaitingAmount)
                    .await?;
                Ok(Reply::with_keyboard(MSG_ASK_AMOUNT))
            }
            Command::SeeExpenses => self.month_to_date_report(user, now).await,
            Command::SeeLastMonth => self.last_month_report(user, now).await,
        }
    }

    async fn continue_conversation(
        &self,
        user: UserId,
        text: &str,
        now: OffsetDateTime,
    ) -> Result<Reply, StoreError> {
        match self.store.current_state(user).await? {
            ConversationState::Idle => Ok(Reply::with_keyboard(MSG_HELP)),
            ConversationState::AwaitingAmount => {
                let Some(amount) = parse_amount(text) else {
                    return Ok(Reply::with_keyboard(MSG_INVALID_AMOUNT));
                };
                self.store
                    .set_state(user, ConversationState::AwaitingTitle { amount })
                    .await?;
                Ok(Reply::with_keyboard(format!(
                    "Amount: {} ✅\n{}",
                    amount, MSG_ASK_TITLE
                )))
            }
            ConversationState::AwaitingTitle { amount } => {
                let Some(title) = normalize_title(text) else {
                    return Ok(Reply::with_keyboard(MSG_EMPTY_TITLE));
                };
                if self
                    .store
                    .insert_expense(user, amount, &title, now)
                    .await
                    .is_err()
                {
                    return Ok(Reply::with_keyboard(MSG_SAVE_FAILED));
                }
                // Best effort: a stale cursor is overwritten by the next `Add expense`.
                let _ = self.store.clear_state(user).await;
                Ok(Reply::with_keyboard(format!(
                    "Saved ✅ {} — \"{}\"",
                    amount, title
                )))
            }
        }
    }

    async fn month_to_date_report(
        &self,
        user: UserId,
        now: OffsetDateTime,
    ) -> Result<Reply, StoreError> {
        let since = month_start(now);
        let items = self
            .store
            .list_recent(user, since, RECENT_EXPENSES_LIMIT)
            .await?;
        let total = self.store.sum_since(user, since).await?;

        let mut lines = vec![format!("This month total: {:.2}", total)];
        if items.is_empty() {
            lines.push(MSG_NO_ITEMS.to_string());
        }
        for item in &items {
            lines.push(format!(
                "• {} — {} ({})",
                item.amount,
                item.title,
                day_fragment(item.recorded_at)
            ));
        }
        Ok(Reply::with_keyboard(lines.join("\n")))
    }

    async fn last_month_report(
        &self,
        user: UserId,
        now: OffsetDateTime,
    ) -> Result<Reply, StoreError> {
        let month = previous_month_start(now);
        let total = self
            .store
            .monthly_total(user, month)
            .await?
            .map_or(Decimal::ZERO, |m| Decimal::new(m.total_cents, 2));

        Ok(Reply::with_keyboard(format!(
            "Your expenses for {}: {:.2}",
            month_label(month),
            total
        )))
    }
}
