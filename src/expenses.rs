use async_trait::async_trait;
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::amount::Amount;
use crate::error::StoreError;
use crate::models::{Expense, MonthlyTotal, UserId};
use crate::store::{ExpenseStore, LibsqlStore};
use crate::utils::month_key;

pub fn extract_expense_from_row(row: libsql::Row) -> Result<Expense, StoreError> {
    let amount_cents: i64 = row.get(0)?;
    let title: String = row.get(1)?;
    let recorded_at: i64 = row.get(2)?;

    let amount = Amount::from_cents(amount_cents)
        .ok_or_else(|| StoreError::Corrupt(format!("invalid expense amount {}", amount_cents)))?;
    let recorded_at = OffsetDateTime::from_unix_timestamp(recorded_at)
        .map_err(|e| StoreError::Corrupt(format!("invalid recorded_at: {}", e)))?;

    Ok(Expense {
        amount,
        title,
        recorded_at,
    })
}

#[async_trait]
impl ExpenseStore for LibsqlStore {
    async fn insert_expense(
        &self,
        owner: UserId,
        amount: Amount,
        title: &str,
        recorded_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let expense_id = Uuid::new_v4().to_string();

        let conn = self.db.write().await;
        conn.execute(
            "INSERT INTO expenses (id, owner, amount_cents, title, recorded_at) VALUES (?, ?, ?, ?, ?)",
            (
                expense_id,
                owner.to_string(),
                amount.cents(),
                title,
                recorded_at.unix_timestamp(),
            ),
        )
        .await?;
        Ok(())
    }

    async fn list_recent(
        &self,
        owner: UserId,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<Expense>, StoreError> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query(
                "SELECT amount_cents, title, recorded_at FROM expenses \
                 WHERE owner = ? AND recorded_at >= ? \
                 ORDER BY recorded_at DESC, rowid DESC LIMIT ?",
                (owner.to_string(), since.unix_timestamp(), limit),
            )
            .await?;

        let mut expenses = Vec::new();
        while let Some(row) = rows.next().await? {
            expenses.push(extract_expense_from_row(row)?);
        }
        Ok(expenses)
    }

    async fn sum_since(&self, owner: UserId, since: OffsetDateTime) -> Result<Decimal, StoreError> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query(
                "SELECT amount_cents FROM expenses WHERE owner = ? AND recorded_at >= ?",
                (owner.to_string(), since.unix_timestamp()),
            )
            .await?;

        let mut total = Decimal::ZERO;
        while let Some(row) = rows.next().await? {
            let cents: i64 = row.get(0)?;
            total += Decimal::new(cents, 2);
        }
        Ok(total)
    }

    async fn monthly_total(
        &self,
        owner: UserId,
        month_start: Date,
    ) -> Result<Option<MonthlyTotal>, StoreError> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query(
                "SELECT total_cents FROM monthly_totals WHERE owner = ? AND month_start = ?",
                (owner.to_string(), month_key(month_start)),
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(MonthlyTotal {
                owner,
                month_start,
                total_cents: row.get(0)?,
            })),
            None => Ok(None),
        }
    }
}
