//! Quota Ledger — plan-based limits on CV generations.
//!
//! FREE plans get a lifetime total of 3 job-based and 1 profile-based generation.
//! PRO plans are unlimited until their end date; an expired PRO is downgraded
//! lazily, the first time any decision observes the expiry.

pub mod handlers;
pub mod lock;
pub mod store;

use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::cv::CvType;
use crate::models::user::{QuotaState, SubscriptionType};
use crate::quota::store::QuotaStore;

/// Lifetime job-based generations on the FREE plan.
pub const FREE_JOB_BASED_LIMIT: i32 = 3;
/// Lifetime profile-based generations on the FREE plan.
pub const FREE_PROFILE_BASED_LIMIT: i32 = 1;

/// FREE-plan limit for a CV type.
pub fn free_limit(cv_type: CvType) -> i32 {
    match cv_type {
        CvType::JobBased => FREE_JOB_BASED_LIMIT,
        CvType::ProfileBased => FREE_PROFILE_BASED_LIMIT,
    }
}

/// Slots left under `limit`, never negative.
pub fn remaining(limit: i32, used: i32) -> i32 {
    (limit - used).max(0)
}

/// Result of a permission check. `limit` is `None` for PRO (unlimited).
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub plan: SubscriptionType,
    pub cv_type: CvType,
    pub used: i32,
    pub limit: Option<i32>,
}

impl QuotaDecision {
    /// Converts a denial into the user-facing error.
    pub fn into_result(self) -> Result<Self, AppError> {
        match (self.allowed, self.limit) {
            (false, Some(limit)) => Err(AppError::QuotaExceeded {
                plan: self.plan,
                limit_type: self.cv_type,
                limit,
                used: self.used,
            }),
            _ => Ok(self),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounter {
    pub used: i32,
    pub limit: Option<i32>,
    pub remaining: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageBreakdown {
    #[serde(rename = "jobBasedCVs")]
    pub job_based_cvs: UsageCounter,
    #[serde(rename = "profileBasedCVs")]
    pub profile_based_cvs: UsageCounter,
}

/// Quota status as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub subscription_type: SubscriptionType,
    pub is_active: bool,
    pub subscription_start_date: Option<DateTime<Utc>>,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub usage: UsageBreakdown,
}

#[derive(Clone)]
pub struct QuotaLedger {
    store: Arc<dyn QuotaStore>,
}

impl QuotaLedger {
    pub fn new(store: Arc<dyn QuotaStore>) -> Self {
        Self { store }
    }

    /// Loads the user's state, downgrading an expired PRO to FREE first.
    async fn effective_state(&self, user_id: Uuid) -> Result<QuotaState, AppError> {
        let mut state = self
            .store
            .load(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

        if state.is_expired_pro(Utc::now()) {
            info!(
                "PRO subscription of user {user_id} expired at {:?}; downgrading to FREE",
                state.subscription_end_date
            );
            self.store.downgrade_to_free(user_id, false).await?;
            state.subscription_type = SubscriptionType::Free;
            state.subscription_start_date = None;
            state.subscription_end_date = None;
        }

        Ok(state)
    }

    /// Whether the user may start a generation of `cv_type` right now.
    pub async fn can_generate(
        &self,
        user_id: Uuid,
        cv_type: CvType,
    ) -> Result<QuotaDecision, AppError> {
        let state = self.effective_state(user_id).await?;
        let used = used_for(&state, cv_type);

        let decision = match state.subscription_type {
            SubscriptionType::Pro => QuotaDecision {
                allowed: true,
                plan: SubscriptionType::Pro,
                cv_type,
                used,
                limit: None,
            },
            SubscriptionType::Free => {
                let limit = free_limit(cv_type);
                QuotaDecision {
                    allowed: used < limit,
                    plan: SubscriptionType::Free,
                    cv_type,
                    used,
                    limit: Some(limit),
                }
            }
        };

        Ok(decision)
    }

    /// The plan in force right now, after any lazy downgrade.
    pub async fn effective_plan(&self, user_id: Uuid) -> Result<SubscriptionType, AppError> {
        Ok(self.effective_state(user_id).await?.subscription_type)
    }

    /// Records one completed generation against the plan it was admitted under.
    /// No-op for PRO, even if the grant expired while the generation ran.
    pub async fn increment_usage(
        &self,
        user_id: Uuid,
        decision: &QuotaDecision,
    ) -> Result<(), AppError> {
        if decision.plan == SubscriptionType::Pro {
            return Ok(());
        }

        let cv_type = decision.cv_type;
        let limit = free_limit(cv_type);
        if !self.store.try_increment(user_id, cv_type, limit).await? {
            warn!(
                "Usage counter {cv_type} for user {user_id} already at limit {limit}; increment skipped"
            );
        }
        Ok(())
    }

    pub async fn status(&self, user_id: Uuid) -> Result<QuotaStatus, AppError> {
        let state = self.effective_state(user_id).await?;
        let is_pro = state.subscription_type == SubscriptionType::Pro;

        let counter = |cv_type: CvType| {
            let used = used_for(&state, cv_type);
            if is_pro {
                UsageCounter {
                    used,
                    limit: None,
                    remaining: None,
                }
            } else {
                let limit = free_limit(cv_type);
                UsageCounter {
                    used,
                    limit: Some(limit),
                    remaining: Some(remaining(limit, used)),
                }
            }
        };

        Ok(QuotaStatus {
            subscription_type: state.subscription_type,
            is_active: is_pro,
            subscription_start_date: state.subscription_start_date,
            subscription_end_date: state.subscription_end_date,
            usage: UsageBreakdown {
                job_based_cvs: counter(CvType::JobBased),
                profile_based_cvs: counter(CvType::ProfileBased),
            },
        })
    }

    /// Payment-free upgrade stub: PRO from now for `months`.
    pub async fn upgrade(&self, user_id: Uuid, months: u32) -> Result<QuotaStatus, AppError> {
        if months == 0 {
            return Err(AppError::Validation("months must be at least 1".to_string()));
        }
        let start = Utc::now();
        let end = start
            .checked_add_months(Months::new(months))
            .ok_or_else(|| AppError::Validation(format!("{months} months is out of range")))?;

        self.store.set_pro(user_id, start, end).await?;
        info!("User {user_id} upgraded to PRO until {end}");
        self.status(user_id).await
    }

    /// Explicit downgrade. The only operation that resets usage counters.
    pub async fn downgrade(&self, user_id: Uuid) -> Result<QuotaStatus, AppError> {
        self.effective_state(user_id).await?;
        self.store.downgrade_to_free(user_id, true).await?;
        info!("User {user_id} downgraded to FREE; usage counters reset");
        self.status(user_id).await
    }
}

fn used_for(state: &QuotaState, cv_type: CvType) -> i32 {
    match cv_type {
        CvType::JobBased => state.job_based_cvs_used,
        CvType::ProfileBased => state.profile_based_cvs_used,
    }
}
