//! Adapter seams over the record store.
//!
//! Each trait mirrors one adapter contract. [`LibsqlStore`] implements all of
//! them against the shared libSQL connection (see `users`, `state` and
//! `expenses` modules), and [`Logged`] wraps any implementation so that every
//! failed call is reported with a call-site label. Callers above this layer
//! only see `Result<_, StoreError>` and never log themselves.

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};
use tracing::{error, warn};

use crate::amount::Amount;
use crate::database::Db;
use crate::error::StoreError;
use crate::models::{ConversationState, Expense, MonthlyTotal, PendingAction, User, UserId};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, external_id: i64) -> Result<Option<User>, StoreError>;

    async fn update_delivery_address(
        &self,
        id: UserId,
        delivery_address: i64,
    ) -> Result<(), StoreError>;

    async fn insert_user(&self, external_id: i64, delivery_address: i64)
    -> Result<User, StoreError>;
}

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Replaces whatever state `owner` had before.
    async fn set_state(&self, owner: UserId, state: ConversationState) -> Result<(), StoreError>;

    async fn get_state(&self, owner: UserId) -> Result<Option<PendingAction>, StoreError>;

    async fn clear_state(&self, owner: UserId) -> Result<(), StoreError>;

    /// Like [`get_state`](Self::get_state) but with a missing row read as `Idle`.
    async fn current_state(&self, owner: UserId) -> Result<ConversationState, StoreError> {
        Ok(self
            .get_state(owner)
            .await?
            .map(|pending| pending.state)
            .unwrap_or_default())
    }
}

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn insert_expense(
        &self,
        owner: UserId,
        amount: Amount,
        title: &str,
        recorded_at: OffsetDateTime,
    ) -> Result<(), StoreError>;

    /// Newest first, at most `limit` rows recorded at or after `since`.
    async fn list_recent(
        &self,
        owner: UserId,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<Expense>, StoreError>;

    /// Exact sum of every amount recorded at or after `since`, added up here
    /// rather than by the store.
    async fn sum_since(&self, owner: UserId, since: OffsetDateTime) -> Result<Decimal, StoreError>;

    async fn monthly_total(
        &self,
        owner: UserId,
        month_start: Date,
    ) -> Result<Option<MonthlyTotal>, StoreError>;
}

/// Everything the conversation engine needs from the record store.
pub trait RecordStore: UserStore + StateStore + ExpenseStore {}

impl<T: UserStore + StateStore + ExpenseStore> RecordStore for T {}

/// libSQL-backed implementation of every adapter.
#[derive(Clone)]
pub struct LibsqlStore {
    pub(crate) db: Db,
}

impl LibsqlStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }
}

/// Logs failed store calls and passes every result through unchanged.
#[derive(Clone)]
pub struct Logged<S> {
    inner: S,
}

impl<S> Logged<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

fn logged<T>(call: &'static str, result: Result<T, StoreError>) -> Result<T, StoreError> {
    match &result {
        Err(err @ StoreError::Constraint(_)) => {
            warn!(call, error = %err, "record store rejected write")
        }
        Err(err) => error!(call, error = %err, "record store call failed"),
        Ok(_) => {}
    }
    result
}

#[async_trait]
impl<S: UserStore> UserStore for Logged<S> {
    async fn find_user(&self, external_id: i64) -> Result<Option<User>, StoreError> {
        logged("users.select", self.inner.find_user(external_id).await)
    }

    async fn update_delivery_address(
        &self,
        id: UserId,
        delivery_address: i64,
    ) -> Result<(), StoreError> {
        logged(
            "users.update",
            self.inner.update_delivery_address(id, delivery_address).await,
        )
    }

    async fn insert_user(
        &self,
        external_id: i64,
        delivery_address: i64,
    ) -> Result<User, StoreError> {
        logged(
            "users.insert",
            self.inner.insert_user(external_id, delivery_address).await,
        )
    }
}

#[async_trait]
impl<S: StateStore> StateStore for Logged<S> {
    async fn set_state(&self, owner: UserId, state: ConversationState) -> Result<(), StoreError> {
        logged("state.upsert", self.inner.set_state(owner, state).await)
    }

    async fn get_state(&self, owner: UserId) -> Result<Option<PendingAction>, StoreError> {
        logged("state.select", self.inner.get_state(owner).await)
    }

    async fn clear_state(&self, owner: UserId) -> Result<(), StoreError> {
        logged("state.delete", self.inner.clear_state(owner).await)
    }
}

#[async_trait]
impl<S: ExpenseStore> ExpenseStore for Logged<S> {
    async fn insert_expense(
        &self,
        owner: UserId,
        amount: Amount,
        title: &str,
        recorded_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        logged(
            "expenses.insert",
            self.inner
                .insert_expense(owner, amount, title, recorded_at)
                .await,
        )
    }

    async fn list_recent(
        &self,
        owner: UserId,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<Expense>, StoreError> {
        logged(
            "expenses.list_recent",
            self.inner.list_recent(owner, since, limit).await,
        )
    }

    async fn sum_since(&self, owner: UserId, since: OffsetDateTime) -> Result<Decimal, StoreError> {
        logged("expenses.amounts_since", self.inner.sum_since(owner, since).await)
    }

    async fn monthly_total(
        &self,
        owner: UserId,
        month_start: Date,
    ) -> Result<Option<MonthlyTotal>, StoreError> {
        logged(
            "monthly_totals.select",
            self.inner.monthly_total(owner, month_start).await,
        )
    }
}
