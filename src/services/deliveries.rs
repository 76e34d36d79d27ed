use tracing::instrument;

use crate::db::{Db, StoreError};
use crate::models::{
    to_persisted_status, DeliveryPatch, NewDeliveryRecord, NewPackage, OptimizationUpdate,
    PackageInfo, PackageStatus,
};

/// CRUD over the `deliveries` table in application terms.
///
/// Rows are translated to [`PackageInfo`] on the way out and statuses to the
/// persisted vocabulary on the way in. Store errors are passed through as-is.
#[derive(Clone)]
pub struct DeliveryGateway {
    store: Db,
}

impl DeliveryGateway {
    pub fn new(store: Db) -> Self {
        Self { store }
    }

    pub async fn create(&self, package: NewPackage) -> Result<PackageInfo, StoreError> {
        let rows = self
            .store
            .insert_deliveries(vec![NewDeliveryRecord::from(package)])
            .await?;

        rows.into_iter()
            .next()
            .map(PackageInfo::from)
            .ok_or_else(|| StoreError::Parse("Insert returned no delivery row".to_string()))
    }

    pub async fn create_many(
        &self,
        packages: Vec<NewPackage>,
    ) -> Result<Vec<PackageInfo>, StoreError> {
        if packages.is_empty() {
            return Ok(Vec::new());
        }

        let records = packages.into_iter().map(NewDeliveryRecord::from).collect();
        let rows = self.store.insert_deliveries(records).await?;

        tracing::info!("Created {} deliveries", rows.len());

        Ok(rows.into_iter().map(PackageInfo::from).collect())
    }

    /// Deliveries of an owner, most recent first
    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<PackageInfo>, StoreError> {
        let rows = self.store.list_deliveries(owner_id).await?;
        Ok(rows.into_iter().map(PackageInfo::from).collect())
    }

    /// Set the status, and the optimized order when given, in one update
    pub async fn update_status(
        &self,
        id: &str,
        status: PackageStatus,
        optimized_order: Option<i32>,
    ) -> Result<PackageInfo, StoreError> {
        let patch = DeliveryPatch {
            status: Some(to_persisted_status(status)),
            optimized_order,
            route_id: None,
        };

        let row = self.store.update_delivery(id, patch).await?;
        Ok(PackageInfo::from(row))
    }

    /// Apply route optimization results one record at a time.
    ///
    /// A failed update is logged and skipped; earlier updates stay applied.
    /// Returns the rows that were updated, in input order.
    #[instrument(skip(self, updates), fields(count = updates.len()))]
    pub async fn bulk_update_optimization(
        &self,
        updates: Vec<OptimizationUpdate>,
    ) -> Vec<PackageInfo> {
        let mut updated = Vec::with_capacity(updates.len());

        for update in &updates {
            match self
                .store
                .update_delivery(&update.id, DeliveryPatch::from(update))
                .await
            {
                Ok(row) => updated.push(PackageInfo::from(row)),
                Err(e) => {
                    tracing::warn!("Skipping optimization update for {}: {}", update.id, e);
                }
            }
        }

        if updated.len() < updates.len() {
            tracing::warn!(
                "Optimization applied to {}/{} deliveries",
                updated.len(),
                updates.len()
            );
        }

        updated
    }

    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.store.delete_delivery(id).await?;
        tracing::info!("Deleted delivery {}", id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use std::sync::Arc;

    fn gateway() -> (Arc<MemoryStore>, DeliveryGateway) {
        let store = Arc::new(MemoryStore::new());
        let gateway = DeliveryGateway::new(store.clone());
        (store, gateway)
    }

    #[tokio::test]
    async fn test_create_translates_status() {
        let (_, gateway) = gateway();
        let mut package = NewPackage::new("u-1", "Rua A, 1");
        package.status = PackageStatus::InTransit;

        let info = gateway.create(package).await.unwrap();
        assert_eq!(info.status, PackageStatus::InTransit);
        assert_eq!(info.user_id, "u-1");
        assert!(!info.id.is_empty());
    }

    #[tokio::test]
    async fn test_client_only_status_reads_back_as_pending() {
        let (_, gateway) = gateway();
        let mut package = NewPackage::new("u-1", "Rua A, 1");
        package.status = PackageStatus::Error;

        let info = gateway.create(package).await.unwrap();
        assert_eq!(info.status, PackageStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_many_empty() {
        let (store, gateway) = gateway();
        assert!(gateway.create_many(Vec::new()).await.unwrap().is_empty());
        assert_eq!(store.delivery_count(), 0);
    }

    #[tokio::test]
    async fn test_create_many_and_list() {
        let (_, gateway) = gateway();
        let created = gateway
            .create_many(vec![
                NewPackage::new("u-1", "Rua A"),
                NewPackage::new("u-1", "Rua B"),
                NewPackage::new("u-2", "Rua C"),
            ])
            .await
            .unwrap();
        assert_eq!(created.len(), 3);

        let listed = gateway.list_by_owner("u-1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|p| p.user_id == "u-1"));
    }

    #[tokio::test]
    async fn test_update_status_with_order() {
        let (_, gateway) = gateway();
        let info = gateway.create(NewPackage::new("u-1", "Rua A")).await.unwrap();

        let updated = gateway
            .update_status(&info.id, PackageStatus::Delivered, Some(7))
            .await
            .unwrap();
        assert_eq!(updated.status, PackageStatus::Delivered);
        assert_eq!(updated.optimized_order, Some(7));

        let updated = gateway
            .update_status(&info.id, PackageStatus::Cancelled, None)
            .await
            .unwrap();
        assert_eq!(updated.status, PackageStatus::Cancelled);
        assert_eq!(updated.optimized_order, Some(7));
    }

    #[tokio::test]
    async fn test_update_status_missing_row() {
        let (_, gateway) = gateway();
        assert!(matches!(
            gateway.update_status("nope", PackageStatus::Delivered, None).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_bulk_update_skips_failures() {
        let (_, gateway) = gateway();
        let a = gateway.create(NewPackage::new("u-1", "Rua A")).await.unwrap();
        let c = gateway.create(NewPackage::new("u-1", "Rua C")).await.unwrap();

        let updates = vec![
            OptimizationUpdate {
                id: a.id.clone(),
                optimized_order: 1,
                route_id: Some("r-1".to_string()),
                status: Some(PackageStatus::InTransit),
            },
            OptimizationUpdate {
                id: "missing".to_string(),
                optimized_order: 2,
                route_id: Some("r-1".to_string()),
                status: None,
            },
            OptimizationUpdate {
                id: c.id.clone(),
                optimized_order: 3,
                route_id: Some("r-1".to_string()),
                status: None,
            },
        ];

        let updated = gateway.bulk_update_optimization(updates).await;
        let ids: Vec<&str> = updated.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), c.id.as_str()]);
        assert_eq!(updated[0].status, PackageStatus::InTransit);
        assert_eq!(updated[1].status, PackageStatus::Pending);
        assert_eq!(updated[1].optimized_order, Some(3));
        assert_eq!(updated[1].route_id.as_deref(), Some("r-1"));
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, gateway) = gateway();
        let info = gateway.create(NewPackage::new("u-1", "Rua A")).await.unwrap();

        assert!(gateway.delete(&info.id).await.unwrap());
        assert_eq!(store.delivery_count(), 0);
    }
}
