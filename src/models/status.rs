//! Translation between the application status vocabulary and the status
//! strings persisted in the `deliveries` table.
//!
//! The application vocabulary is a superset: `parsed` and `error` only exist
//! on the client and are narrowed to `pending` when written. Anything the
//! translator does not recognize also falls back to `pending`, with a
//! warning logged so bad data stays visible.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status as seen by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    Pending,
    InTransit,
    Delivered,
    Cancelled,
    Undeliverable,
    /// Address parsed on the client, not yet saved
    Parsed,
    /// Client-side parsing failed
    Error,
}

impl PackageStatus {
    pub const ALL: [PackageStatus; 7] = [
        PackageStatus::Pending,
        PackageStatus::InTransit,
        PackageStatus::Delivered,
        PackageStatus::Cancelled,
        PackageStatus::Undeliverable,
        PackageStatus::Parsed,
        PackageStatus::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PackageStatus::Pending => "pending",
            PackageStatus::InTransit => "in_transit",
            PackageStatus::Delivered => "delivered",
            PackageStatus::Cancelled => "cancelled",
            PackageStatus::Undeliverable => "undeliverable",
            PackageStatus::Parsed => "parsed",
            PackageStatus::Error => "error",
        }
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Status as stored in the `deliveries.status` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryStatus {
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "em_transito")]
    InTransit,
    #[serde(rename = "entregue")]
    Delivered,
    #[serde(rename = "cancelada")]
    Cancelled,
    #[serde(rename = "nao_entregue")]
    Undeliverable,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 5] = [
        DeliveryStatus::Pending,
        DeliveryStatus::InTransit,
        DeliveryStatus::Delivered,
        DeliveryStatus::Cancelled,
        DeliveryStatus::Undeliverable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pendente",
            DeliveryStatus::InTransit => "em_transito",
            DeliveryStatus::Delivered => "entregue",
            DeliveryStatus::Cancelled => "cancelada",
            DeliveryStatus::Undeliverable => "nao_entregue",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeliveryStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A status string outside the known vocabulary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown status: {0}")]
pub struct UnknownStatus(pub String);

/// Map a persisted status string to the application vocabulary.
///
/// Unrecognized values become `Pending`.
pub fn to_application_status(persisted: &str) -> PackageStatus {
    match persisted.parse::<DeliveryStatus>() {
        Ok(DeliveryStatus::Pending) => PackageStatus::Pending,
        Ok(DeliveryStatus::InTransit) => PackageStatus::InTransit,
        Ok(DeliveryStatus::Delivered) => PackageStatus::Delivered,
        Ok(DeliveryStatus::Cancelled) => PackageStatus::Cancelled,
        Ok(DeliveryStatus::Undeliverable) => PackageStatus::Undeliverable,
        Err(_) => {
            tracing::warn!(
                "Unknown persisted status '{}', defaulting to {}",
                persisted,
                PackageStatus::Pending
            );
            PackageStatus::Pending
        }
    }
}

/// Map an application status to the persisted vocabulary.
///
/// `Parsed` and `Error` have no stored form and are written as `Pending`.
pub fn to_persisted_status(status: PackageStatus) -> DeliveryStatus {
    match status {
        PackageStatus::Pending => DeliveryStatus::Pending,
        PackageStatus::InTransit => DeliveryStatus::InTransit,
        PackageStatus::Delivered => DeliveryStatus::Delivered,
        PackageStatus::Cancelled => DeliveryStatus::Cancelled,
        PackageStatus::Undeliverable => DeliveryStatus::Undeliverable,
        PackageStatus::Parsed | PackageStatus::Error => {
            tracing::debug!(
                "Client-only status '{}' stored as {}",
                status,
                DeliveryStatus::Pending
            );
            DeliveryStatus::Pending
        }
    }
}

/// Parse an untyped application status, defaulting unknown values to `Pending`
pub fn parse_application_status(raw: &str) -> PackageStatus {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(
            "Unknown application status '{}', defaulting to {}",
            raw,
            PackageStatus::Pending
        );
        PackageStatus::Pending
    })
}
