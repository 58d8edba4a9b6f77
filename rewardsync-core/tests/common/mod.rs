// File: rewardsync-core/tests/common/mod.rs
//
// Shared test doubles: a recording ChannelService so tests can assert on
// exactly which remote commands were issued, plus small builders.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use rewardsync_common::error::Error;
use rewardsync_common::models::{
    PermissionTier, RedemptionAdded, RedemptionDescriptor, RedemptionStatus, RewardDescriptor,
    RewardPatch, UserRef,
};
use rewardsync_common::traits::ChannelService;
use rewardsync_core::registry::RewardCallback;

/// One recorded remote command.
#[derive(Debug, Clone)]
pub enum RemoteCall {
    ListRewards,
    CreateReward(RewardPatch),
    UpdateReward(String, RewardPatch),
    UpdateRedemptionStatus {
        reward_id: String,
        redemption_id: String,
        status: RedemptionStatus,
    },
    FetchRedemption {
        reward_id: String,
        redemption_id: String,
    },
}

/// Mock remote channel service backed by an in-memory reward list. Applies
/// creates/updates to that list so a second reconciliation run sees no
/// drift.
#[derive(Default)]
pub struct MockChannelService {
    pub calls: Mutex<Vec<RemoteCall>>,
    pub remote_rewards: Mutex<Vec<RewardDescriptor>>,
    /// Titles for which `create_reward` reports a duplicate.
    pub duplicate_titles: Mutex<Vec<String>>,
    pub fail_creates: Mutex<bool>,
    pub fail_updates: Mutex<bool>,
    pub fetch_result: Mutex<Option<RedemptionDescriptor>>,
    next_id: Mutex<u64>,
}

impl MockChannelService {
    pub fn seed_remote(&self, desc: RewardDescriptor) {
        self.remote_rewards.lock().unwrap().push(desc);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn list_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RemoteCall::ListRewards))
            .count()
    }

    pub fn create_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RemoteCall::CreateReward(_)))
            .count()
    }

    pub fn update_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RemoteCall::UpdateReward(_, _)))
            .count()
    }

    pub fn status_updates(&self) -> Vec<(String, String, RedemptionStatus)> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                RemoteCall::UpdateRedemptionStatus {
                    reward_id,
                    redemption_id,
                    status,
                } => Some((reward_id.clone(), redemption_id.clone(), *status)),
                _ => None,
            })
            .collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RemoteCall::FetchRedemption { .. }))
            .count()
    }

    fn record(&self, call: RemoteCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChannelService for MockChannelService {
    async fn list_rewards(&self) -> Result<Vec<RewardDescriptor>, Error> {
        self.record(RemoteCall::ListRewards);
        Ok(self.remote_rewards.lock().unwrap().clone())
    }

    async fn create_reward(&self, body: &RewardPatch) -> Result<RewardDescriptor, Error> {
        self.record(RemoteCall::CreateReward(body.clone()));
        if *self.fail_creates.lock().unwrap() {
            return Err(Error::Remote("create rejected".into()));
        }
        let title = body.title.clone().unwrap_or_default();
        if self.duplicate_titles.lock().unwrap().iter().any(|t| t == &title) {
            return Err(Error::DuplicateReward(title));
        }
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let desc = RewardDescriptor {
            id: format!("rw-{}", *next),
            title,
            cost: body.cost.unwrap_or(0),
            is_enabled: body.is_enabled.unwrap_or(true),
            permission: body.permission.unwrap_or(PermissionTier::Everyone),
            auto_fulfill: body.auto_fulfill.unwrap_or(false),
        };
        self.remote_rewards.lock().unwrap().push(desc.clone());
        Ok(desc)
    }

    async fn update_reward(
        &self,
        reward_id: &str,
        body: &RewardPatch,
    ) -> Result<RewardDescriptor, Error> {
        self.record(RemoteCall::UpdateReward(reward_id.to_string(), body.clone()));
        if *self.fail_updates.lock().unwrap() {
            return Err(Error::Remote("update rejected".into()));
        }
        let mut rewards = self.remote_rewards.lock().unwrap();
        let Some(desc) = rewards.iter_mut().find(|r| r.id == reward_id) else {
            return Err(Error::NotFound(format!("no remote reward '{reward_id}'")));
        };
        if let Some(cost) = body.cost {
            desc.cost = cost;
        }
        if let Some(enabled) = body.is_enabled {
            desc.is_enabled = enabled;
        }
        if let Some(permission) = body.permission {
            desc.permission = permission;
        }
        if let Some(auto) = body.auto_fulfill {
            desc.auto_fulfill = auto;
        }
        Ok(desc.clone())
    }

    async fn update_redemption_status(
        &self,
        reward_id: &str,
        redemption_id: &str,
        status: RedemptionStatus,
    ) -> Result<(), Error> {
        self.record(RemoteCall::UpdateRedemptionStatus {
            reward_id: reward_id.to_string(),
            redemption_id: redemption_id.to_string(),
            status,
        });
        Ok(())
    }

    async fn fetch_redemption(
        &self,
        reward_id: &str,
        redemption_id: &str,
    ) -> Result<RedemptionDescriptor, Error> {
        self.record(RemoteCall::FetchRedemption {
            reward_id: reward_id.to_string(),
            redemption_id: redemption_id.to_string(),
        });
        self.fetch_result
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::NotFound(format!("no redemption '{redemption_id}'")))
    }
}

pub fn descriptor(id: &str, title: &str, cost: u64, is_enabled: bool) -> RewardDescriptor {
    RewardDescriptor {
        id: id.to_string(),
        title: title.to_string(),
        cost,
        is_enabled,
        permission: PermissionTier::Everyone,
        auto_fulfill: false,
    }
}

pub fn user(login: &str, tier: PermissionTier) -> UserRef {
    UserRef {
        user_id: format!("u-{login}"),
        login: login.to_string(),
        display_name: None,
        tier,
    }
}

pub fn add_event(
    reward_id: &str,
    reward_title: &str,
    redemption_id: &str,
    redeemer: UserRef,
    input: &str,
    status: &str,
) -> RedemptionAdded {
    RedemptionAdded {
        reward_id: reward_id.to_string(),
        reward_title: reward_title.to_string(),
        redemption_id: redemption_id.to_string(),
        user: redeemer,
        user_input: input.to_string(),
        status: status.to_string(),
        redeemed_at: Utc::now(),
    }
}

/// Callback that appends each invocation's status to a shared log.
pub fn recording_callback(log: Arc<Mutex<Vec<RedemptionStatus>>>) -> RewardCallback {
    Box::new(move |_redemption, status| {
        log.lock().unwrap().push(status);
        Ok(())
    })
}
