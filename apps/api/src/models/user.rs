use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription plan stored on the user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionType {
    Free,
    Pro,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionType::Free => "FREE",
            SubscriptionType::Pro => "PRO",
        }
    }

    /// Unknown values are treated as FREE so a bad row can never grant unlimited use.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PRO" => SubscriptionType::Pro,
            _ => SubscriptionType::Free,
        }
    }
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quota columns of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserQuotaRow {
    pub id: Uuid,
    pub subscription_type: String,
    pub subscription_start_date: Option<DateTime<Utc>>,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub job_based_cvs_used: i32,
    pub profile_based_cvs_used: i32,
}

/// Typed view of a user's plan and lifetime usage counters.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaState {
    pub user_id: Uuid,
    pub subscription_type: SubscriptionType,
    pub subscription_start_date: Option<DateTime<Utc>>,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub job_based_cvs_used: i32,
    pub profile_based_cvs_used: i32,
}

impl QuotaState {
    /// A fresh FREE account with no usage.
    pub fn free(user_id: Uuid) -> Self {
        Self {
            user_id,
            subscription_type: SubscriptionType::Free,
            subscription_start_date: None,
            subscription_end_date: None,
            job_based_cvs_used: 0,
            profile_based_cvs_used: 0,
        }
    }

    /// PRO whose end date has passed at `now`.
    pub fn is_expired_pro(&self, now: DateTime<Utc>) -> bool {
        self.subscription_type == SubscriptionType::Pro
            && self.subscription_end_date.is_some_and(|end| end < now)
    }
}

impl From<UserQuotaRow> for QuotaState {
    fn from(row: UserQuotaRow) -> Self {
        Self {
            user_id: row.id,
            subscription_type: SubscriptionType::parse(&row.subscription_type),
            subscription_start_date: row.subscription_start_date,
            subscription_end_date: row.subscription_end_date,
            job_based_cvs_used: row.job_based_cvs_used,
            profile_based_cvs_used: row.profile_based_cvs_used,
        }
    }
}
