use async_trait::async_trait;
use libsql::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::amount::Amount;
use crate::error::StoreError;
use crate::models::{ActionKind, ConversationState, PendingAction, UserId};
use crate::store::{LibsqlStore, StateStore};

pub fn extract_pending_action_from_row(row: libsql::Row) -> Result<PendingAction, StoreError> {
    let owner: String = row.get(0)?;
    let kind: String = row.get(1)?;
    let staged_cents: Option<i64> = row.get(2)?;
    let updated_at: i64 = row.get(3)?;

    let owner = Uuid::parse_str(&owner)
        .map_err(|e| StoreError::Corrupt(format!("invalid owner {:?}: {}", owner, e)))?;
    let kind = ActionKind::parse(&kind)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown action kind {:?}", kind)))?;

    let state = match (kind, staged_cents) {
        (ActionKind::None, None) => ConversationState::Idle,
        (ActionKind::AwaitingAmount, None) => ConversationState::AwaitingAmount,
        (ActionKind::AwaitingTitle, Some(cents)) => ConversationState::AwaitingTitle {
            amount: Amount::from_cents(cents)
                .ok_or_else(|| StoreError::Corrupt(format!("invalid staged amount {}", cents)))?,
        },
        (kind, staged) => {
            return Err(StoreError::Corrupt(format!(
                "staged amount {:?} does not match action {}",
                staged,
                kind.as_str()
            )));
        }
    };

    let updated_at = OffsetDateTime::from_unix_timestamp(updated_at)
        .map_err(|e| StoreError::Corrupt(format!("invalid updated_at: {}", e)))?;

    Ok(PendingAction {
        owner: UserId(owner),
        state,
        updated_at,
    })
}

#[async_trait]
impl StateStore for LibsqlStore {
    async fn set_state(&self, owner: UserId, state: ConversationState) -> Result<(), StoreError> {
        let staged = state
            .staged_amount()
            .map_or(Value::Null, |amount| Value::Integer(amount.cents()));
        let now = OffsetDateTime::now_utc().unix_timestamp();

        let conn = self.db.write().await;
        conn.execute(
            r#"
            INSERT INTO pending_actions (owner, action_kind, staged_cents, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (owner) DO UPDATE SET
                action_kind = excluded.action_kind,
                staged_cents = excluded.staged_cents,
                updated_at = excluded.updated_at
            "#,
            (owner.to_string(), state.kind().as_str(), staged, now),
        )
        .await?;
        Ok(())
    }

    async fn get_state(&self, owner: UserId) -> Result<Option<PendingAction>, StoreError> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query(
                "SELECT owner, action_kind, staged_cents, updated_at FROM pending_actions WHERE owner = ?",
                [owner.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(extract_pending_action_from_row(row)?)),
            None => Ok(None),
        }
    }

    async fn clear_state(&self, owner: UserId) -> Result<(), StoreError> {
        let conn = self.db.write().await;
        conn.execute(
            "DELETE FROM pending_actions WHERE owner = ?",
            [owner.to_string()],
        )
        .await?;
        Ok(())
    }
}
