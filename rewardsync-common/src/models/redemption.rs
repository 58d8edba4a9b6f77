// File: rewardsync-common/src/models/redemption.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::reward::PermissionTier;

/// Status of a single redemption. One-way lattice: `Unfulfilled` may move to
/// either terminal state; `Fulfilled` and `Canceled` never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
    Unfulfilled,
    Fulfilled,
    Canceled,
}

impl RedemptionStatus {
    /// Parses the status string carried on notifications. Case-insensitive;
    /// anything unrecognized is treated as already fulfilled.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("canceled") {
            RedemptionStatus::Canceled
        } else if s.eq_ignore_ascii_case("unfulfilled") {
            RedemptionStatus::Unfulfilled
        } else {
            RedemptionStatus::Fulfilled
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RedemptionStatus::Unfulfilled => "unfulfilled",
            RedemptionStatus::Fulfilled => "fulfilled",
            RedemptionStatus::Canceled => "canceled",
        }
    }
}

/// The user behind a redemption, as the remote service identifies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    pub user_id: String,
    pub login: String,
    pub display_name: Option<String>,
    pub tier: PermissionTier,
}

/// A single instance of a user spending points on a reward.
#[derive(Debug, Clone)]
pub struct Redemption {
    pub redemption_id: String,
    pub user: UserRef,
    pub user_input: String,
    pub redeemed_at: DateTime<Utc>,
    /// Remote reward id; `None` until the redemption is matched against a
    /// reward this process knows about (unmanaged rewards track no id).
    pub reward_id: Option<String>,
    pub reward_title: String,
    pub status: RedemptionStatus,
}

/// Authoritative redemption record returned by `fetch_redemption`.
#[derive(Debug, Clone, Deserialize)]
pub struct RedemptionDescriptor {
    pub redemption_id: String,
    pub reward_id: String,
    pub user: UserRef,
    pub user_input: String,
    pub status: String,
    pub redeemed_at: DateTime<Utc>,
}

/// Inbound notification: a user redeemed a reward. Carries the full event
/// payload as delivered by the transport.
#[derive(Debug, Clone, Deserialize)]
pub struct RedemptionAdded {
    pub reward_id: String,
    pub reward_title: String,
    pub redemption_id: String,
    pub user: UserRef,
    pub user_input: String,
    pub status: String,
    pub redeemed_at: DateTime<Utc>,
}

/// Inbound notification: a redemption's status changed remotely. The payload
/// is minimal; the authoritative record must be re-fetched.
#[derive(Debug, Clone, Deserialize)]
pub struct RedemptionUpdated {
    pub reward_id: String,
    pub redemption_id: String,
}

/// Session-scoped record of a managed redemption the router dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionUsage {
    pub usage_id: Uuid,
    pub reward_title: String,
    pub user_login: String,
    pub user_input: String,
    pub used_at: DateTime<Utc>,
}
