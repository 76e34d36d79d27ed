use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{Store, StoreError};
use crate::constants::{DELIVERIES_TABLE, USERS_TABLE};
use crate::models::{DeliveryPatch, DeliveryRecord, NewDeliveryRecord, NewUserProfile, UserProfile};

/// Columns selected for a profile row (ids come back as text)
const PROFILE_COLUMNS: &str = "id::text AS id, email, name, plan, plan_active, daily_quota, \
     deliveries_today, credit_balance, free_deliveries_used, last_updated";

/// Columns selected for a delivery row (ids come back as text)
const DELIVERY_COLUMNS: &str = "id::text AS id, user_id::text AS user_id, full_address, \
     recipient_name, original_input, input_type, status, optimized_order, route_id, notes, \
     created_at, updated_at";

/// Store backed by a direct Postgres connection
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_profile(&self, id: &str) -> Result<Option<UserProfile>, StoreError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM {USERS_TABLE} WHERE id = $1::uuid");

        let profile = sqlx::query_as::<_, UserProfile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    async fn insert_profile(&self, profile: NewUserProfile) -> Result<UserProfile, StoreError> {
        let sql = format!(
            "INSERT INTO {USERS_TABLE} (id, email, name, plan, plan_active, daily_quota, \
             deliveries_today, credit_balance, free_deliveries_used, last_updated) \
             VALUES ($1::uuid, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {PROFILE_COLUMNS}"
        );

        let row = sqlx::query_as::<_, UserProfile>(&sql)
            .bind(profile.id)
            .bind(profile.email)
            .bind(profile.name)
            .bind(profile.plan)
            .bind(profile.plan_active)
            .bind(profile.daily_quota)
            .bind(profile.deliveries_today)
            .bind(profile.credit_balance)
            .bind(profile.free_deliveries_used)
            .bind(profile.last_updated)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn insert_deliveries(
        &self,
        records: Vec<NewDeliveryRecord>,
    ) -> Result<Vec<DeliveryRecord>, StoreError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {DELIVERIES_TABLE} (user_id, full_address, recipient_name, \
             original_input, input_type, status, optimized_order, route_id, notes) "
        ));

        builder.push_values(records, |mut row, record| {
            row.push_bind(record.user_id)
                .push_unseparated("::uuid")
                .push_bind(record.full_address)
                .push_bind(record.recipient_name)
                .push_bind(record.original_input)
                .push_bind(record.input_type)
                .push_bind(record.status.as_str())
                .push_bind(record.optimized_order)
                .push_bind(record.route_id)
                .push_bind(record.notes);
        });
        builder.push(" RETURNING ").push(DELIVERY_COLUMNS);

        let rows = builder
            .build_query_as::<DeliveryRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn list_deliveries(&self, owner_id: &str) -> Result<Vec<DeliveryRecord>, StoreError> {
        let sql = format!(
            "SELECT {DELIVERY_COLUMNS} FROM {DELIVERIES_TABLE} \
             WHERE user_id = $1::uuid ORDER BY created_at DESC"
        );

        let rows = sqlx::query_as::<_, DeliveryRecord>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn update_delivery(
        &self,
        id: &str,
        patch: DeliveryPatch,
    ) -> Result<DeliveryRecord, StoreError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("UPDATE {DELIVERIES_TABLE} SET updated_at = now()"));

        if let Some(status) = patch.status {
            builder.push(", status = ").push_bind(status.as_str());
        }
        if let Some(order) = patch.optimized_order {
            builder.push(", optimized_order = ").push_bind(order);
        }
        if let Some(route_id) = patch.route_id {
            builder.push(", route_id = ").push_bind(route_id);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id.to_string())
            .push("::uuid RETURNING ")
            .push(DELIVERY_COLUMNS);

        builder
            .build_query_as::<DeliveryRecord>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete_delivery(&self, id: &str) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {DELIVERIES_TABLE} WHERE id = $1::uuid");

        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        tracing::debug!("Deleted {} delivery row(s) for id {}", result.rows_affected(), id);

        Ok(())
    }
}
