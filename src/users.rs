use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AccessError, DenyReason, StoreError};
use crate::models::{User, UserId};
use crate::store::{LibsqlStore, UserStore};

pub fn extract_user_from_row(row: libsql::Row) -> Result<User, StoreError> {
    let id: String = row.get(0)?;
    let external_id: i64 = row.get(1)?;
    let delivery_address: i64 = row.get(2)?;

    let id = Uuid::parse_str(&id)
        .map_err(|e| StoreError::Corrupt(format!("invalid user id {:?}: {}", id, e)))?;

    Ok(User {
        id: UserId(id),
        external_id,
        delivery_address,
    })
}

#[async_trait]
impl UserStore for LibsqlStore {
    async fn find_user(&self, external_id: i64) -> Result<Option<User>, StoreError> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query(
                "SELECT id, external_id, delivery_address FROM users WHERE external_id = ?",
                [external_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(extract_user_from_row(row)?)),
            None => Ok(None),
        }
    }

    async fn update_delivery_address(
        &self,
        id: UserId,
        delivery_address: i64,
    ) -> Result<(), StoreError> {
        let conn = self.db.write().await;
        conn.execute(
            "UPDATE users SET delivery_address = ? WHERE id = ?",
            (delivery_address, id.to_string()),
        )
        .await?;
        Ok(())
    }

    async fn insert_user(
        &self,
        external_id: i64,
        delivery_address: i64,
    ) -> Result<User, StoreError> {
        let user = User {
            id: UserId::new(),
            external_id,
            delivery_address,
        };
        let conn = self.db.write().await;
        conn.execute(
            "INSERT INTO users (id, external_id, delivery_address) VALUES (?, ?, ?)",
            (user.id.to_string(), external_id, delivery_address),
        )
        .await?;
        Ok(user)
    }
}

/// Gatekeeper mapping gateway identities to internal users.
///
/// The allow-list is fixed at construction; access is re-checked on every
/// call, so a user removed from config is denied even if their row remains.
#[derive(Debug, Clone)]
pub struct UserRegistry {
    allow_list: Arc<HashSet<i64>>,
}

impl UserRegistry {
    pub fn new(allow_list: HashSet<i64>) -> Self {
        Self {
            allow_list: Arc::new(allow_list),
        }
    }

    pub fn is_allowed(&self, external_id: i64) -> bool {
        self.allow_list.contains(&external_id)
    }

    pub async fn authorize_and_resolve<S: UserStore + ?Sized>(
        &self,
        store: &S,
        external_id: i64,
        delivery_address: i64,
    ) -> Result<UserId, AccessError> {
        if !self.is_allowed(external_id) {
            return Err(AccessError::Denied(DenyReason::NotAllowed));
        }

        if let Some(user) = store.find_user(external_id).await? {
            store
                .update_delivery_address(user.id, delivery_address)
                .await?;
            return Ok(user.id);
        }

        match store.insert_user(external_id, delivery_address).await {
            Ok(user) => Ok(user.id),
            // a concurrent first contact may have created the row in the meantime
            Err(StoreError::Constraint(_)) => match store.find_user(external_id).await? {
                Some(user) => Ok(user.id),
                None => Err(AccessError::Denied(DenyReason::NotProvisioned)),
            },
            Err(e) => Err(e.into()),
        }
    }
}
