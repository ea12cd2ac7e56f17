#![allow(dead_code)]

use async_trait::async_trait;
use expense_bot::amount::Amount;
use expense_bot::database::{init_schema, open, sync_allowed_identities};
use expense_bot::error::StoreError;
use expense_bot::models::{ConversationState, Expense, MonthlyTotal, PendingAction, User, UserId};
use expense_bot::store::{ExpenseStore, LibsqlStore, StateStore, UserStore};
use expense_bot::users::UserRegistry;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::{TempDir, tempdir};
use time::{Date, OffsetDateTime};

/// Allowed in config and provisioned in the store.
pub const ALLOWED_USER: i64 = 1001;
/// Allowed in config but missing from `allowed_identities`.
pub const UNPROVISIONED_USER: i64 = 1002;
/// Not in the allow-list at all.
pub const STRANGER: i64 = 9999;
pub const CHAT_ID: i64 = 5001;

pub async fn setup_test_environment() -> (LibsqlStore, TempDir) {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let path = temp_dir.path().join("expenses.db");
    let path = path.to_str().expect("Failed to convert path to string");

    let db = open(path, None)
        .await
        .unwrap_or_else(|e| panic!("Failed to open test database at {}: {}", path, e));
    init_schema(&db)
        .await
        .unwrap_or_else(|e| panic!("Failed to initialize schema at {}: {}", path, e));
    sync_allowed_identities(&db, &HashSet::from([ALLOWED_USER]))
        .await
        .expect("Failed to provision allowed identities");

    (LibsqlStore::new(db), temp_dir)
}

pub fn test_registry() -> UserRegistry {
    UserRegistry::new(HashSet::from([ALLOWED_USER, UNPROVISIONED_USER]))
}

pub async fn create_test_user(store: &LibsqlStore) -> UserId {
    test_registry()
        .authorize_and_resolve(store, ALLOWED_USER, CHAT_ID)
        .await
        .expect("Failed to create test user")
}

pub fn amount(text: &str) -> Amount {
    expense_bot::amount::parse_amount(text)
        .unwrap_or_else(|| panic!("Invalid test amount {:?}", text))
}

pub async fn count_rows(store: &LibsqlStore, table: &str) -> i64 {
    let conn = store.db().read().await;
    let mut rows = conn
        .query(&format!("SELECT COUNT(*) FROM {}", table), ())
        .await
        .unwrap_or_else(|e| panic!("Failed to count rows in {}: {}", table, e));
    let row = rows
        .next()
        .await
        .expect("Failed to read count row")
        .expect("Count query returned no rows");
    row.get(0).expect("Failed to get count value")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    FindUser,
    UpdateDeliveryAddress,
    InsertUser,
    SetState,
    GetState,
    ClearState,
    InsertExpense,
    ListRecent,
    SumSince,
    MonthlyTotal,
}

/// Delegates to a real store, except for operations marked to fail.
///
/// User lookups can also be slowed down to widen the window between reading
/// and writing, as a remote store round trip would.
pub struct FailingStore {
    pub inner: LibsqlStore,
    failing: Mutex<HashSet<Op>>,
    lookup_delay: Mutex<Option<Duration>>,
}

impl FailingStore {
    pub fn new(inner: LibsqlStore) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
            lookup_delay: Mutex::new(None),
        }
    }

    pub fn delay_lookups(&self, delay: Duration) {
        *self.lookup_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail(&self, op: Op) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn recover(&self) {
        self.failing.lock().unwrap().clear();
    }

    fn check(&self, op: Op) -> Result<(), StoreError> {
        if self.failing.lock().unwrap().contains(&op) {
            Err(StoreError::Database(format!("injected failure in {:?}", op)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserStore for FailingStore {
    async fn find_user(&self, external_id: i64) -> Result<Option<User>, StoreError> {
        self.check(Op::FindUser)?;
        let user = self.inner.find_user(external_id).await;
        let delay = *self.lookup_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        user
    }

    async fn update_delivery_address(
        &self,
        id: UserId,
        delivery_address: i64,
    ) -> Result<(), StoreError> {
        self.check(Op::UpdateDeliveryAddress)?;
        self.inner.update_delivery_address(id, delivery_address).await
    }

    async fn insert_user(
        &self,
        external_id: i64,
        delivery_address: i64,
    ) -> Result<User, StoreError> {
        self.check(Op::InsertUser)?;
        self.inner.insert_user(external_id, delivery_address).await
    }
}

#[async_trait]
impl StateStore for FailingStore {
    async fn set_state(&self, owner: UserId, state: ConversationState) -> Result<(), StoreError> {
        self.check(Op::SetState)?;
        self.inner.set_state(owner, state).await
    }

    async fn get_state(&self, owner: UserId) -> Result<Option<PendingAction>, StoreError> {
        self.check(Op::GetState)?;
        self.inner.get_state(owner).await
    }

    async fn clear_state(&self, owner: UserId) -> Result<(), StoreError> {
        self.check(Op::ClearState)?;
        self.inner.clear_state(owner).await
    }
}

#[async_trait]
impl ExpenseStore for FailingStore {
    async fn insert_expense(
        &self,
        owner: UserId,
        amount: Amount,
        title: &str,
        recorded_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        self.check(Op::InsertExpense)?;
        self.inner
            .insert_expense(owner, amount, title, recorded_at)
            .await
    }

    async fn list_recent(
        &self,
        owner: UserId,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<Expense>, StoreError> {
        self.check(Op::ListRecent)?;
        self.inner.list_recent(owner, since, limit).await
    }

    async fn sum_since(&self, owner: UserId, since: OffsetDateTime) -> Result<Decimal, StoreError> {
        self.check(Op::SumSince)?;
        self.inner.sum_since(owner, since).await
    }

    async fn monthly_total(
        &self,
        owner: UserId,
        month_start: Date,
    ) -> Result<Option<MonthlyTotal>, StoreError> {
        self.check(Op::MonthlyTotal)?;
        self.inner.monthly_total(owner, month_start).await
    }
}
