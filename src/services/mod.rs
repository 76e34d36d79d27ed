pub mod deliveries;
pub mod profile_sync;

pub use deliveries::DeliveryGateway;
pub use profile_sync::{ProfileSynchronizer, SyncError, SyncOutcome, SyncRequest};
