use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CREDIT_BALANCE, DEFAULT_DAILY_QUOTA, DEFAULT_PLAN, DEFAULT_PLAN_ACTIVE,
};

/// Profile row in the `users` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    /// Auth subject id
    pub id: String,
    pub email: String,
    /// Display name
    pub name: Option<String>,
    pub plan: String,
    pub plan_active: bool,
    /// Deliveries allowed per day
    pub daily_quota: i32,
    /// Deliveries used since `last_updated`
    pub deliveries_today: i32,
    pub credit_balance: i32,
    pub free_deliveries_used: i32,
    /// Day the usage counters were last touched
    pub last_updated: NaiveDate,
}

/// Insert shape for a profile row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUserProfile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub plan: String,
    pub plan_active: bool,
    pub daily_quota: i32,
    pub deliveries_today: i32,
    pub credit_balance: i32,
    pub free_deliveries_used: i32,
    pub last_updated: NaiveDate,
}

impl NewUserProfile {
    /// Build the one-time default row written on first sync
    pub fn with_defaults(
        id: impl Into<String>,
        email: impl Into<String>,
        name: Option<String>,
        today: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name,
            plan: DEFAULT_PLAN.to_string(),
            plan_active: DEFAULT_PLAN_ACTIVE,
            daily_quota: DEFAULT_DAILY_QUOTA,
            deliveries_today: 0,
            credit_balance: DEFAULT_CREDIT_BALANCE,
            free_deliveries_used: 0,
            last_updated: today,
        }
    }
}

impl From<NewUserProfile> for UserProfile {
    fn from(p: NewUserProfile) -> Self {
        Self {
            id: p.id,
            email: p.email,
            name: p.name,
            plan: p.plan,
            plan_active: p.plan_active,
            daily_quota: p.daily_quota,
            deliveries_today: p.deliveries_today,
            credit_balance: p.credit_balance,
            free_deliveries_used: p.free_deliveries_used,
            last_updated: p.last_updated,
        }
    }
}
