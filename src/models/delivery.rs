use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::status::{
    parse_application_status, to_application_status, to_persisted_status, DeliveryStatus,
    PackageStatus,
};

/// Delivery row as stored in the `deliveries` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryRecord {
    pub id: String,
    /// Owning profile id
    pub user_id: String,
    pub full_address: String,
    pub recipient_name: Option<String>,
    /// Free text the address was parsed from
    pub original_input: Option<String>,
    /// How the input was captured (typed, voice, photo, ...)
    pub input_type: Option<String>,
    /// Raw persisted status; translated on read
    pub status: String,
    pub optimized_order: Option<i32>,
    pub route_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert shape for a delivery row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDeliveryRecord {
    pub user_id: String,
    pub full_address: String,
    pub recipient_name: Option<String>,
    pub original_input: Option<String>,
    pub input_type: Option<String>,
    pub status: DeliveryStatus,
    pub optimized_order: Option<i32>,
    pub route_id: Option<String>,
    pub notes: Option<String>,
}

/// Partial update of a delivery row; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeliveryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeliveryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
}

impl DeliveryPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.optimized_order.is_none() && self.route_id.is_none()
    }
}

/// Delivery as seen by the application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    pub id: String,
    pub user_id: String,
    pub full_address: String,
    pub recipient_name: Option<String>,
    pub original_input: Option<String>,
    pub input_type: Option<String>,
    pub status: PackageStatus,
    pub optimized_order: Option<i32>,
    pub route_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DeliveryRecord> for PackageInfo {
    fn from(r: DeliveryRecord) -> Self {
        Self {
            status: to_application_status(&r.status),
            id: r.id,
            user_id: r.user_id,
            full_address: r.full_address,
            recipient_name: r.recipient_name,
            original_input: r.original_input,
            input_type: r.input_type,
            optimized_order: r.optimized_order,
            route_id: r.route_id,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// A delivery the application wants to create
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPackage {
    pub user_id: String,
    pub full_address: String,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub original_input: Option<String>,
    #[serde(default)]
    pub input_type: Option<String>,
    #[serde(default = "default_status", deserialize_with = "lenient_status")]
    pub status: PackageStatus,
    #[serde(default)]
    pub optimized_order: Option<i32>,
    #[serde(default)]
    pub route_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewPackage {
    /// Minimal pending package for an owner
    pub fn new(user_id: impl Into<String>, full_address: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            full_address: full_address.into(),
            recipient_name: None,
            original_input: None,
            input_type: None,
            status: PackageStatus::Pending,
            optimized_order: None,
            route_id: None,
            notes: None,
        }
    }
}

impl From<NewPackage> for NewDeliveryRecord {
    fn from(p: NewPackage) -> Self {
        Self {
            status: to_persisted_status(p.status),
            user_id: p.user_id,
            full_address: p.full_address,
            recipient_name: p.recipient_name,
            original_input: p.original_input,
            input_type: p.input_type,
            optimized_order: p.optimized_order,
            route_id: p.route_id,
            notes: p.notes,
        }
    }
}

/// One entry of a route optimization result
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationUpdate {
    pub id: String,
    pub optimized_order: i32,
    #[serde(default)]
    pub route_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_status_opt")]
    pub status: Option<PackageStatus>,
}

impl From<&OptimizationUpdate> for DeliveryPatch {
    fn from(u: &OptimizationUpdate) -> Self {
        Self {
            status: u.status.map(to_persisted_status),
            optimized_order: Some(u.optimized_order),
            route_id: u.route_id.clone(),
        }
    }
}

fn default_status() -> PackageStatus {
    PackageStatus::Pending
}

/// Accept any status string, falling back to `pending` for unknown values
pub(crate) fn lenient_status<'de, D>(deserializer: D) -> Result<PackageStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(parse_application_status(&raw))
}

pub(crate) fn lenient_status_opt<'de, D>(deserializer: D) -> Result<Option<PackageStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().map(parse_application_status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(status: &str) -> DeliveryRecord {
        DeliveryRecord {
            id: "d-1".to_string(),
            user_id: "u-1".to_string(),
            full_address: "Rua A, 10".to_string(),
            recipient_name: Some("Maria".to_string()),
            original_input: None,
            input_type: Some("text".to_string()),
            status: status.to_string(),
            optimized_order: Some(3),
            route_id: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_to_package_info_translates_status() {
        let info = PackageInfo::from(record("em_transito"));
        assert_eq!(info.status, PackageStatus::InTransit);
        assert_eq!(info.full_address, "Rua A, 10");
        assert_eq!(info.optimized_order, Some(3));
    }

    #[test]
    fn test_package_info_uses_camel_case() {
        let value = serde_json::to_value(PackageInfo::from(record("entregue"))).unwrap();
        assert_eq!(value["fullAddress"], "Rua A, 10");
        assert_eq!(value["recipientName"], "Maria");
        assert_eq!(value["status"], "delivered");
        assert!(value.get("full_address").is_none());
    }

    #[test]
    fn test_new_package_defaults_to_pending() {
        let package: NewPackage =
            serde_json::from_value(json!({ "userId": "u-1", "fullAddress": "Rua B" })).unwrap();
        assert_eq!(package.status, PackageStatus::Pending);
    }

    #[test]
    fn test_new_package_unknown_status_is_pending() {
        let package: NewPackage = serde_json::from_value(
            json!({ "userId": "u-1", "fullAddress": "Rua B", "status": "teleported" }),
        )
        .unwrap();
        assert_eq!(package.status, PackageStatus::Pending);
    }

    #[test]
    fn test_parsed_package_is_written_as_pending() {
        let mut package = NewPackage::new("u-1", "Rua C");
        package.status = PackageStatus::Parsed;

        let row = NewDeliveryRecord::from(package);
        assert_eq!(row.status, DeliveryStatus::Pending);
        assert_eq!(serde_json::to_value(&row).unwrap()["status"], "pendente");
    }

    #[test]
    fn test_patch_skips_unset_fields() {
        let patch = DeliveryPatch {
            status: Some(DeliveryStatus::Delivered),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "status": "entregue" })
        );
        assert!(DeliveryPatch::default().is_empty());
    }

    #[test]
    fn test_optimization_update_to_patch() {
        let update: OptimizationUpdate = serde_json::from_value(json!({
            "id": "d-1",
            "optimizedOrder": 2,
            "routeId": "r-9",
            "status": "in_transit"
        }))
        .unwrap();

        let patch = DeliveryPatch::from(&update);
        assert_eq!(patch.optimized_order, Some(2));
        assert_eq!(patch.route_id.as_deref(), Some("r-9"));
        assert_eq!(patch.status, Some(DeliveryStatus::InTransit));
    }
}
