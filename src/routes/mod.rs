pub mod deliveries;
pub mod extract;
pub mod health;
pub mod sync_profile;

pub use deliveries::{
    create_deliveries, create_delivery, delete_delivery, list_deliveries, optimize_deliveries,
    update_delivery_status,
};
pub use health::health_check;
pub use sync_profile::{method_not_allowed, sync_profile};
