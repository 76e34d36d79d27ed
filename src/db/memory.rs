use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{DeliveryPatch, DeliveryRecord, NewDeliveryRecord, NewUserProfile, UserProfile};

#[derive(Default)]
struct Tables {
    profiles: HashMap<String, UserProfile>,
    /// Insertion order
    deliveries: Vec<DeliveryRecord>,
}

/// In-process store with the same constraints as the managed tables:
/// profile ids are unique and delivery ids are generated on insert.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn profile_count(&self) -> usize {
        self.tables().profiles.len()
    }

    pub fn delivery_count(&self) -> usize {
        self.tables().deliveries.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_profile(&self, id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.tables().profiles.get(id).cloned())
    }

    async fn insert_profile(&self, profile: NewUserProfile) -> Result<UserProfile, StoreError> {
        let mut tables = self.tables();

        if tables.profiles.contains_key(&profile.id) {
            return Err(StoreError::Duplicate(format!(
                "Key (id)=({}) already exists",
                profile.id
            )));
        }

        let row = UserProfile::from(profile);
        tables.profiles.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn insert_deliveries(
        &self,
        records: Vec<NewDeliveryRecord>,
    ) -> Result<Vec<DeliveryRecord>, StoreError> {
        let now = Utc::now();
        let rows: Vec<DeliveryRecord> = records
            .into_iter()
            .map(|r| DeliveryRecord {
                id: Uuid::new_v4().to_string(),
                user_id: r.user_id,
                full_address: r.full_address,
                recipient_name: r.recipient_name,
                original_input: r.original_input,
                input_type: r.input_type,
                status: r.status.as_str().to_string(),
                optimized_order: r.optimized_order,
                route_id: r.route_id,
                notes: r.notes,
                created_at: now,
                updated_at: now,
            })
            .collect();

        self.tables().deliveries.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn list_deliveries(&self, owner_id: &str) -> Result<Vec<DeliveryRecord>, StoreError> {
        // Newest insert first among equal timestamps
        let mut rows: Vec<DeliveryRecord> = self
            .tables()
            .deliveries
            .iter()
            .rev()
            .filter(|r| r.user_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn update_delivery(
        &self,
        id: &str,
        patch: DeliveryPatch,
    ) -> Result<DeliveryRecord, StoreError> {
        let mut tables = self.tables();
        let row = tables
            .deliveries
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound)?;

        if let Some(status) = patch.status {
            row.status = status.as_str().to_string();
        }
        if let Some(order) = patch.optimized_order {
            row.optimized_order = Some(order);
        }
        if let Some(route_id) = patch.route_id {
            row.route_id = Some(route_id);
        }
        row.updated_at = Utc::now();

        Ok(row.clone())
    }

    async fn delete_delivery(&self, id: &str) -> Result<(), StoreError> {
        self.tables().deliveries.retain(|r| r.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeliveryStatus, NewPackage};
    use chrono::NaiveDate;

    fn new_delivery(owner: &str, address: &str) -> NewDeliveryRecord {
        NewPackage::new(owner, address).into()
    }

    #[tokio::test]
    async fn test_duplicate_profile_rejected() {
        let store = MemoryStore::new();
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        store
            .insert_profile(NewUserProfile::with_defaults("u-1", "a@b.com", None, today))
            .await
            .unwrap();
        let err = store
            .insert_profile(NewUserProfile::with_defaults("u-1", "a@b.com", None, today))
            .await
            .unwrap_err();

        assert!(err.is_duplicate());
        assert_eq!(store.profile_count(), 1);
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_newest_first() {
        let store = MemoryStore::new();
        store
            .insert_deliveries(vec![new_delivery("u-1", "first")])
            .await
            .unwrap();
        store
            .insert_deliveries(vec![new_delivery("u-2", "other owner")])
            .await
            .unwrap();
        store
            .insert_deliveries(vec![new_delivery("u-1", "second")])
            .await
            .unwrap();

        let rows = store.list_deliveries("u-1").await.unwrap();
        let addresses: Vec<&str> = rows.iter().map(|r| r.full_address.as_str()).collect();
        assert_eq!(addresses, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::new();
        let rows = store
            .insert_deliveries(vec![new_delivery("u-1", "Rua A")])
            .await
            .unwrap();
        let id = rows[0].id.clone();

        let updated = store
            .update_delivery(
                &id,
                DeliveryPatch {
                    status: Some(DeliveryStatus::Delivered),
                    optimized_order: Some(1),
                    route_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, "entregue");
        assert_eq!(updated.optimized_order, Some(1));

        store.delete_delivery(&id).await.unwrap();
        assert_eq!(store.delivery_count(), 0);
        assert!(matches!(
            store.update_delivery(&id, DeliveryPatch::default()).await,
            Err(StoreError::NotFound)
        ));
    }
}
