pub mod delivery;
pub mod profile;
pub mod status;

pub use delivery::{
    DeliveryPatch, DeliveryRecord, NewDeliveryRecord, NewPackage, OptimizationUpdate, PackageInfo,
};
pub use profile::{NewUserProfile, UserProfile};
pub use status::{
    parse_application_status, to_application_status, to_persisted_status, DeliveryStatus,
    PackageStatus,
};
