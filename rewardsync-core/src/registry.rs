//! In-memory registry of declared rewards.
//!
//! The registry is plain owned state: it is constructed by the host, handed
//! to the [`RewardEngine`](crate::dispatch::RewardEngine), and from then on
//! mutated exclusively by the dispatch loop (single-writer invariant). No
//! locking, no globals.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use rewardsync_common::error::Error;
use rewardsync_common::models::{
    ManagedReward, ManagedRewardGroup, Redemption, RedemptionStatus, RedemptionUsage,
};

/// Per-reward callback invoked with each routed redemption and its resolved
/// status. Errors are caught and logged by the router; they never escape the
/// dispatch loop.
pub type RewardCallback =
    Box<dyn FnMut(&Redemption, RedemptionStatus) -> Result<(), Error> + Send>;

/// A declared managed reward together with its callback binding.
pub struct ManagedEntry {
    pub reward: ManagedReward,
    pub(crate) callback: Option<RewardCallback>,
}

/// A reward defined elsewhere that this process only observes.
pub struct UnmanagedEntry {
    pub(crate) callback: RewardCallback,
    pub(crate) fulfilled: Vec<Redemption>,
}

/// Holds the declared set of managed and unmanaged rewards, keyed by title
/// and (once reconciled) by remote identifier.
#[derive(Default)]
pub struct RewardRegistry {
    managed: HashMap<String, ManagedEntry>,
    /// remote reward id -> title
    id_index: HashMap<String, String>,
    unmanaged: HashMap<String, UnmanagedEntry>,
    groups: HashMap<String, ManagedRewardGroup>,
    usage_log: Vec<RedemptionUsage>,
}

impl RewardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a managed reward. Re-declaring an existing title overwrites
    /// the declared fields and callback binding but preserves a remote id
    /// that reconciliation already bound.
    pub fn declare(&mut self, mut reward: ManagedReward, callback: Option<RewardCallback>) {
        if let Some(prev) = self.managed.get(&reward.title) {
            if prev.reward.reward_id.is_some() {
                reward.reward_id = prev.reward.reward_id.clone();
            }
            if let Some(old_group) = &prev.reward.group {
                if reward.group.as_deref() != Some(old_group.as_str()) {
                    if let Some(g) = self.groups.get_mut(old_group) {
                        g.titles.retain(|t| t != &reward.title);
                    }
                }
            }
        }
        if let Some(id) = &reward.reward_id {
            self.id_index.insert(id.clone(), reward.title.clone());
        }
        if let Some(group) = &reward.group {
            let g = self.groups.entry(group.clone()).or_default();
            if !g.titles.contains(&reward.title) {
                g.titles.push(reward.title.clone());
            }
        }
        let title = reward.title.clone();
        self.managed.insert(title, ManagedEntry { reward, callback });
    }

    /// Declares an unmanaged reward. Re-declaring overwrites the callback
    /// binding but keeps the session log already accumulated for the title.
    pub fn declare_unmanaged(&mut self, title: impl Into<String>, callback: RewardCallback) {
        let title = title.into();
        match self.unmanaged.get_mut(&title) {
            Some(entry) => entry.callback = callback,
            None => {
                self.unmanaged.insert(
                    title,
                    UnmanagedEntry {
                        callback,
                        fulfilled: Vec::new(),
                    },
                );
            }
        }
    }

    /// Binds a reconciled remote id to a declared title. A remote id, once
    /// assigned, never changes; a conflicting rebind is ignored with a
    /// warning.
    pub fn bind_reward_id(&mut self, title: &str, reward_id: &str) {
        let Some(entry) = self.managed.get_mut(title) else {
            warn!("bind_reward_id: no managed reward declared with title='{title}'");
            return;
        };
        match &entry.reward.reward_id {
            Some(existing) if existing != reward_id => {
                warn!(
                    "reward '{title}' already bound to id='{existing}' => ignoring rebind to '{reward_id}'"
                );
            }
            Some(_) => {}
            None => {
                entry.reward.reward_id = Some(reward_id.to_string());
                entry.reward.updated_at = Utc::now();
                debug!("bound reward '{title}' => remote id='{reward_id}'");
            }
        }
        self.id_index
            .entry(reward_id.to_string())
            .or_insert_with(|| title.to_string());
    }

    pub fn managed(&self, title: &str) -> Option<&ManagedReward> {
        self.managed.get(title).map(|e| &e.reward)
    }

    pub(crate) fn managed_entry_mut(&mut self, title: &str) -> Option<&mut ManagedEntry> {
        self.managed.get_mut(title)
    }

    pub(crate) fn managed_reward_mut(&mut self, title: &str) -> Option<&mut ManagedReward> {
        self.managed.get_mut(title).map(|e| &mut e.reward)
    }

    /// Resolves a remote reward id to the declared title it is bound to.
    pub fn title_for_id(&self, reward_id: &str) -> Option<&str> {
        self.id_index.get(reward_id).map(String::as_str)
    }

    pub fn managed_rewards(&self) -> impl Iterator<Item = &ManagedReward> {
        self.managed.values().map(|e| &e.reward)
    }

    pub fn managed_len(&self) -> usize {
        self.managed.len()
    }

    pub fn has_unmanaged(&self, title: &str) -> bool {
        self.unmanaged.contains_key(title)
    }

    pub(crate) fn unmanaged_entry_mut(&mut self, title: &str) -> Option<&mut UnmanagedEntry> {
        self.unmanaged.get_mut(title)
    }

    /// Fulfilled redemptions observed this session for an unmanaged title.
    pub fn unmanaged_fulfilled(&self, title: &str) -> Option<&[Redemption]> {
        self.unmanaged.get(title).map(|e| e.fulfilled.as_slice())
    }

    pub fn group(&self, name: &str) -> Option<&ManagedRewardGroup> {
        self.groups.get(name)
    }

    pub(crate) fn record_usage(&mut self, redemption: &Redemption) {
        self.usage_log.push(RedemptionUsage {
            usage_id: Uuid::new_v4(),
            reward_title: redemption.reward_title.clone(),
            user_login: redemption.user.login.clone(),
            user_input: redemption.user_input.clone(),
            used_at: Utc::now(),
        });
    }

    /// Every managed redemption dispatched this session, in arrival order.
    pub fn usage_log(&self) -> &[RedemptionUsage] {
        &self.usage_log
    }
}
