//! Classifies inbound redemption notifications and routes them to user
//! callbacks or back to the remote service as cancel/fulfill commands.

use std::sync::Arc;

use tracing::{debug, error, warn};

use rewardsync_common::error::Error;
use rewardsync_common::models::{
    Redemption, RedemptionAdded, RedemptionStatus, RedemptionUpdated,
};
use rewardsync_common::traits::ChannelService;

use crate::registry::RewardRegistry;

/// Terminal effect of routing one notification. A later "update" for the
/// same redemption re-enters at `Dispatched` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Handled by an unmanaged registration; the managed path never ran.
    Unmanaged,
    /// Reward unknown to this process; dropped without callback or command.
    DroppedUnknown,
    /// Redeeming user below the required tier; one cancel command issued.
    CanceledPermission,
    /// Input failed validation; one cancel command issued.
    CanceledInput,
    /// Auto-fulfill reward; one fulfill command issued, callback bypassed.
    AutoFulfilled,
    /// Callback invoked with the resolved status.
    Dispatched(RedemptionStatus),
}

pub struct RedemptionRouter {
    service: Arc<dyn ChannelService>,
}

impl RedemptionRouter {
    pub fn new(service: Arc<dyn ChannelService>) -> Self {
        Self { service }
    }

    /// Routes a freshly received redemption. Classification order, first
    /// match wins: unmanaged title, unknown reward, permission, input
    /// validation, then status dispatch.
    pub async fn handle_redemption_add(
        &self,
        registry: &mut RewardRegistry,
        evt: RedemptionAdded,
    ) -> Result<RouteOutcome, Error> {
        let status = RedemptionStatus::parse(&evt.status);

        // 1) Unmanaged registrations win on title, even when a managed
        //    reward is bound to the same remote id.
        if registry.has_unmanaged(&evt.reward_title) {
            let redemption = Redemption {
                redemption_id: evt.redemption_id,
                user: evt.user,
                user_input: evt.user_input,
                redeemed_at: evt.redeemed_at,
                reward_id: None,
                reward_title: evt.reward_title.clone(),
                status,
            };
            if let Some(entry) = registry.unmanaged_entry_mut(&evt.reward_title) {
                if let Err(e) = (entry.callback)(&redemption, status) {
                    error!(
                        "callback for unmanaged reward '{}' failed: {e}",
                        evt.reward_title
                    );
                }
                if status == RedemptionStatus::Fulfilled {
                    entry.fulfilled.push(redemption);
                }
            }
            return Ok(RouteOutcome::Unmanaged);
        }

        // 2) Unknown reward id => not ours, drop without callback or command.
        let Some(title) = registry.title_for_id(&evt.reward_id).map(str::to_string) else {
            if registry.managed(&evt.reward_title).is_some() {
                debug!(
                    "redemption for declared reward '{}' before reconciliation bound its id => dropping",
                    evt.reward_title
                );
            } else {
                debug!(
                    "redemption for unknown reward id='{}' title='{}' => dropping",
                    evt.reward_id, evt.reward_title
                );
            }
            return Ok(RouteOutcome::DroppedUnknown);
        };

        let Some(reward) = registry.managed(&title).cloned() else {
            warn!("id index points at missing reward '{title}' => dropping");
            return Ok(RouteOutcome::DroppedUnknown);
        };

        // 3) Permission gate. Canceling refunds the user's points.
        if evt.user.tier < reward.permission {
            debug!(
                "user '{}' below required tier for '{}' => canceling redemption",
                evt.user.login, title
            );
            self.cancel(&evt.reward_id, &evt.redemption_id).await;
            return Ok(RouteOutcome::CanceledPermission);
        }

        // 4) Input validation (case-insensitive membership).
        if !reward.accepts_input(&evt.user_input) {
            debug!(
                "input '{}' not valid for '{}' => canceling redemption",
                evt.user_input, title
            );
            self.cancel(&evt.reward_id, &evt.redemption_id).await;
            return Ok(RouteOutcome::CanceledInput);
        }

        let redemption = Redemption {
            redemption_id: evt.redemption_id.clone(),
            user: evt.user,
            user_input: evt.user_input,
            redeemed_at: evt.redeemed_at,
            reward_id: Some(evt.reward_id.clone()),
            reward_title: title.clone(),
            status,
        };
        registry.record_usage(&redemption);

        // 5) Status dispatch.
        match status {
            // The cancellation already happened remotely; informational only.
            RedemptionStatus::Canceled => {
                invoke_managed_callback(registry, &title, &redemption, status);
                Ok(RouteOutcome::Dispatched(status))
            }
            RedemptionStatus::Unfulfilled if reward.auto_fulfill => {
                if let Err(e) = self
                    .service
                    .update_redemption_status(
                        &evt.reward_id,
                        &evt.redemption_id,
                        RedemptionStatus::Fulfilled,
                    )
                    .await
                {
                    error!("auto-fulfill for '{title}' => {e}");
                }
                Ok(RouteOutcome::AutoFulfilled)
            }
            RedemptionStatus::Unfulfilled => {
                invoke_managed_callback(registry, &title, &redemption, status);
                Ok(RouteOutcome::Dispatched(status))
            }
            RedemptionStatus::Fulfilled => {
                invoke_managed_callback(registry, &title, &redemption, status);
                Ok(RouteOutcome::Dispatched(status))
            }
        }
    }

    /// Routes a minimal "update" notification: re-fetches the authoritative
    /// redemption record and re-invokes the callback with the resolved
    /// status. No permission/input re-validation; the action already
    /// happened remotely.
    pub async fn handle_redemption_update(
        &self,
        registry: &mut RewardRegistry,
        evt: RedemptionUpdated,
    ) -> Result<RouteOutcome, Error> {
        let Some(title) = registry.title_for_id(&evt.reward_id).map(str::to_string) else {
            debug!(
                "redemption update for unknown reward id='{}' => dropping",
                evt.reward_id
            );
            return Ok(RouteOutcome::DroppedUnknown);
        };

        let desc = self
            .service
            .fetch_redemption(&evt.reward_id, &evt.redemption_id)
            .await?;
        let status = RedemptionStatus::parse(&desc.status);
        let redemption = Redemption {
            redemption_id: desc.redemption_id,
            user: desc.user,
            user_input: desc.user_input,
            redeemed_at: desc.redeemed_at,
            reward_id: Some(desc.reward_id),
            reward_title: title.clone(),
            status,
        };
        invoke_managed_callback(registry, &title, &redemption, status);
        Ok(RouteOutcome::Dispatched(status))
    }

    /// Fire-and-forget cancel. Failure is logged; the redemption keeps its
    /// last-known remote state.
    async fn cancel(&self, reward_id: &str, redemption_id: &str) {
        if let Err(e) = self
            .service
            .update_redemption_status(reward_id, redemption_id, RedemptionStatus::Canceled)
            .await
        {
            error!("cancel redemption '{redemption_id}' => {e}");
        }
    }
}

/// Invokes a managed reward's callback, isolating failures so one bad
/// callback never stalls the dispatch loop.
fn invoke_managed_callback(
    registry: &mut RewardRegistry,
    title: &str,
    redemption: &Redemption,
    status: RedemptionStatus,
) {
    let Some(entry) = registry.managed_entry_mut(title) else {
        return;
    };
    if let Some(cb) = entry.callback.as_mut() {
        if let Err(e) = cb(redemption, status) {
            error!("callback for managed reward '{title}' failed: {e}");
        }
    }
}
