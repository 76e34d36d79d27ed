/// Table holding one profile row per authenticated user
pub const USERS_TABLE: &str = "users";

/// Table holding delivery records
pub const DELIVERIES_TABLE: &str = "deliveries";

// =============================================================================
// Profile Defaults
// =============================================================================

/// Plan assigned to every freshly synchronized profile
pub const DEFAULT_PLAN: &str = "Start";

/// Whether the default plan starts out active
pub const DEFAULT_PLAN_ACTIVE: bool = true;

/// Deliveries allowed per day on the default plan
pub const DEFAULT_DAILY_QUOTA: i32 = 10;

/// Starting credit balance
pub const DEFAULT_CREDIT_BALANCE: i32 = 0;

// =============================================================================
// Store
// =============================================================================

/// SQLSTATE for unique_violation, reported by both Postgres and PostgREST
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

/// Default timeout for requests to the REST backend
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Error Messages
// =============================================================================

/// Sync request lacks userId or email
pub const ERR_MISSING_FIELDS: &str = "Missing required fields: userId and email";

/// Request body could not be parsed against the expected schema
pub const ERR_INVALID_JSON: &str = "Invalid JSON body";

/// Method other than POST/OPTIONS on the sync endpoint
pub const ERR_METHOD_NOT_ALLOWED: &str = "Method not allowed";

/// Profile lookup hit a store failure
pub const ERR_PROFILE_LOOKUP: &str = "Failed to look up profile";

/// Profile insert hit a store failure
pub const ERR_PROFILE_CREATE: &str = "Failed to create profile";

/// Generic message for unexpected failures
pub const ERR_INTERNAL: &str = "Internal server error";

// =============================================================================
// Success Messages
// =============================================================================

/// Sync created a new profile row
pub const MSG_PROFILE_CREATED: &str = "Profile created";

/// Sync found an existing profile row
pub const MSG_PROFILE_EXISTS: &str = "Profile already exists";
