// File: rewardsync-common/src/models/reward.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum privilege a redeeming user must hold for a reward to be honored.
/// Ordered by increasing privilege so tiers compare directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionTier {
    Everyone,
    Follower,
    Subscriber,
    Moderator,
    Broadcaster,
}

/// A channel-point reward whose definition this process owns and keeps
/// synchronized with the remote channel.
///
/// Identity is the `title` (unique, case-sensitive). `reward_id` is empty
/// until reconciliation binds it to the remote reward; once bound it never
/// changes for the life of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedReward {
    pub title: String,
    pub reward_id: Option<String>,
    pub cost: u64,
    pub is_enabled: bool,
    pub permission: PermissionTier,
    pub auto_fulfill: bool,
    pub requires_input: bool,
    /// Accepted user inputs, matched case-insensitively. An empty set means
    /// any input is accepted.
    pub valid_inputs: Vec<String>,
    pub group: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ManagedReward {
    pub fn new(title: impl Into<String>, cost: u64) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            reward_id: None,
            cost,
            is_enabled: true,
            permission: PermissionTier::Everyone,
            auto_fulfill: false,
            requires_input: false,
            valid_inputs: Vec::new(),
            group: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_permission(mut self, permission: PermissionTier) -> Self {
        self.permission = permission;
        self
    }

    pub fn with_auto_fulfill(mut self, auto_fulfill: bool) -> Self {
        self.auto_fulfill = auto_fulfill;
        self
    }

    pub fn with_valid_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires_input = true;
        self.valid_inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Whether the given input passes this reward's input validation.
    pub fn accepts_input(&self, input: &str) -> bool {
        if !self.requires_input || self.valid_inputs.is_empty() {
            return true;
        }
        self.valid_inputs
            .iter()
            .any(|v| v.eq_ignore_ascii_case(input))
    }
}

/// A named set of managed-reward titles used only to batch enable/disable.
/// Never persisted remotely.
#[derive(Debug, Clone, Default)]
pub struct ManagedRewardGroup {
    pub titles: Vec<String>,
}

/// A reward as the remote channel service reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardDescriptor {
    pub id: String,
    pub title: String,
    pub cost: u64,
    pub is_enabled: bool,
    pub permission: PermissionTier,
    pub auto_fulfill: bool,
}

/// Partial-update body for create/update calls. Only the fields that are
/// `Some` are sent, so a patch never clobbers remote-only metadata.
#[derive(Debug, Clone, Serialize, Default)]
pub struct RewardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<PermissionTier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_fulfill: Option<bool>,
}

impl RewardPatch {
    /// True when the patch carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.cost.is_none()
            && self.is_enabled.is_none()
            && self.permission.is_none()
            && self.auto_fulfill.is_none()
    }
}
