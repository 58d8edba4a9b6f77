//! One-time startup reconciliation of declared rewards against the remote
//! channel's actual reward list.

use tracing::{debug, error, info, warn};

use rewardsync_common::error::Error;
use rewardsync_common::models::{ManagedReward, RewardDescriptor, RewardPatch};
use rewardsync_common::traits::ChannelService;

use crate::registry::RewardRegistry;

/// Output of the planning pass: which declared titles need a remote create,
/// which need a partial update, and which remote ids to bind.
#[derive(Debug, Default)]
pub struct ReconcilePlan {
    pub to_create: Vec<String>,
    /// (title, changed fields only)
    pub to_update: Vec<(String, RewardPatch)>,
    /// (title, remote id)
    pub id_bindings: Vec<(String, String)>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty()
    }
}

/// Diffs the declared rewards against the fetched remote list. Pure; issues
/// no remote calls.
pub fn plan<'a>(
    declared: impl IntoIterator<Item = &'a ManagedReward>,
    remote: &[RewardDescriptor],
) -> ReconcilePlan {
    let mut out = ReconcilePlan::default();

    for reward in declared {
        match remote.iter().find(|r| r.title == reward.title) {
            None => out.to_create.push(reward.title.clone()),
            Some(desc) => {
                out.id_bindings.push((reward.title.clone(), desc.id.clone()));
                let patch = diff_reward(reward, desc);
                if !patch.is_empty() {
                    out.to_update.push((reward.title.clone(), patch));
                }
            }
        }
    }
    out
}

/// Field-level diff between a declared reward and its remote counterpart.
/// Only fields that actually differ are carried, so an update never clobbers
/// remote-only metadata.
fn diff_reward(declared: &ManagedReward, remote: &RewardDescriptor) -> RewardPatch {
    RewardPatch {
        title: None,
        cost: (declared.cost != remote.cost).then_some(declared.cost),
        is_enabled: (declared.is_enabled != remote.is_enabled).then_some(declared.is_enabled),
        permission: (declared.permission != remote.permission).then_some(declared.permission),
        auto_fulfill: (declared.auto_fulfill != remote.auto_fulfill)
            .then_some(declared.auto_fulfill),
    }
}

fn creation_body(reward: &ManagedReward) -> RewardPatch {
    RewardPatch {
        title: Some(reward.title.clone()),
        cost: Some(reward.cost),
        is_enabled: Some(reward.is_enabled),
        permission: Some(reward.permission),
        auto_fulfill: Some(reward.auto_fulfill),
    }
}

/// Case-insensitive title lookup, used only when adopting a reward after a
/// duplicate-create rejection.
fn find_reward_by_title<'a>(
    rewards: &'a [RewardDescriptor],
    title: &str,
) -> Option<&'a RewardDescriptor> {
    let lowered = title.to_lowercase();
    rewards.iter().find(|r| r.title.to_lowercase() == lowered)
}

/// Runs the full reconciliation: fetch, plan, create missing rewards, patch
/// drifted ones, bind remote ids. Called once after the transport signals
/// ready.
///
/// Per-reward failures are logged and skipped; a reward whose create failed
/// stays unbound (degraded until the next process start), a reward whose
/// update failed keeps its last-known local values. Nothing is retried.
pub async fn reconcile(
    registry: &mut RewardRegistry,
    service: &dyn ChannelService,
) -> Result<(), Error> {
    // 1) Fast path: nothing declared => nothing to fetch or diff.
    if registry.managed_len() == 0 {
        debug!("no managed rewards declared => skipping remote reward fetch");
        return Ok(());
    }

    // 2) Fetch the remote list and diff it against the declared set.
    let remote = service.list_rewards().await?;
    info!(
        "reconcile: {} declared managed rewards vs {} remote rewards",
        registry.managed_len(),
        remote.len()
    );

    let declared: Vec<ManagedReward> = registry.managed_rewards().cloned().collect();
    let plan = plan(declared.iter(), &remote);

    // 3) Bind ids for every title the remote side already has.
    for (title, id) in &plan.id_bindings {
        registry.bind_reward_id(title, id);
    }

    // 4) Create rewards absent remotely. A duplicate-title rejection means
    //    the reward exists after all (e.g. created by another client between
    //    fetch and create) => re-fetch and adopt its id instead of failing.
    for title in &plan.to_create {
        let Some(reward) = declared.iter().find(|r| &r.title == title) else {
            continue;
        };
        let body = creation_body(reward);
        match service.create_reward(&body).await {
            Ok(created) => {
                info!("created remote reward '{}' => id='{}'", title, created.id);
                registry.bind_reward_id(title, &created.id);
            }
            Err(Error::DuplicateReward(_)) => {
                warn!("duplicate reward title '{title}' => adopting the existing remote reward");
                match service.list_rewards().await {
                    Ok(refreshed) => match find_reward_by_title(&refreshed, title) {
                        Some(existing) => registry.bind_reward_id(title, &existing.id),
                        None => warn!(
                            "no remote reward matches title='{title}' => cannot resolve duplicate"
                        ),
                    },
                    Err(e) => error!("re-fetch after duplicate create failed: {e}"),
                }
            }
            Err(e) => {
                error!("create_reward('{title}') => {e}");
            }
        }
    }

    // 5) Patch rewards whose declared fields drifted from the remote values.
    for (title, patch) in &plan.to_update {
        let Some(id) = registry.managed(title).and_then(|r| r.reward_id.clone()) else {
            continue;
        };
        debug!("patching remote reward '{title}' (id='{id}') => {patch:?}");
        if let Err(e) = service.update_reward(&id, patch).await {
            error!("update_reward('{title}') => {e}");
        }
    }

    Ok(())
}
