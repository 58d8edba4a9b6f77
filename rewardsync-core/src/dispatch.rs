//! Single-threaded cooperative event queue that drives the engine.
//!
//! All registry and redemption state is mutated on one logical task: the
//! loop in [`RewardEngine::run`]. Remote calls are awaited inline, so their
//! completions land on the same task and no locking is needed anywhere.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use rewardsync_common::error::Error;
use rewardsync_common::models::{ManagedReward, RedemptionAdded, RedemptionUpdated, RewardPatch};
use rewardsync_common::traits::ChannelService;

use crate::reconcile;
use crate::registry::{RewardCallback, RewardRegistry};
use crate::router::{RedemptionRouter, RouteOutcome};

/// Everything the transport collaborator can deliver to the engine.
#[derive(Debug)]
pub enum EngineEvent {
    /// One-time signal that the transport is connected; gates reconciliation.
    Ready,
    RedemptionAdded(RedemptionAdded),
    RedemptionUpdated(RedemptionUpdated),
}

/// Owns the registry and drains the notification queue. Constructed once,
/// then moved into [`RewardEngine::run`].
pub struct RewardEngine {
    registry: RewardRegistry,
    router: RedemptionRouter,
    service: Arc<dyn ChannelService>,
    reconciled: bool,
}

impl RewardEngine {
    pub fn new(service: Arc<dyn ChannelService>) -> Self {
        Self {
            registry: RewardRegistry::new(),
            router: RedemptionRouter::new(service.clone()),
            service,
            reconciled: false,
        }
    }

    /// Creates the notification queue the transport feeds. The receiver goes
    /// to [`RewardEngine::run`]; the cloneable handle goes to the transport.
    pub fn channel(capacity: usize) -> (EngineHandle, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (EngineHandle { tx }, rx)
    }

    // ------------------------------------------------------------------
    // Declaration API (configuration time, before `run`)
    // ------------------------------------------------------------------

    pub fn declare_managed(&mut self, reward: ManagedReward, callback: Option<RewardCallback>) {
        self.registry.declare(reward, callback);
    }

    pub fn declare_unmanaged(&mut self, title: impl Into<String>, callback: RewardCallback) {
        self.registry.declare_unmanaged(title, callback);
    }

    pub fn registry(&self) -> &RewardRegistry {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Explicit update operations. Remote command first, local mutation only
    // on success; failures are logged and the local value stays put.
    // ------------------------------------------------------------------

    pub async fn set_reward_enabled(&mut self, title: &str, enabled: bool) -> Result<(), Error> {
        let Some(reward) = self.registry.managed(title) else {
            warn!("set_reward_enabled: no managed reward '{title}'");
            return Ok(());
        };
        if reward.is_enabled == enabled {
            warn!(
                "reward '{title}' already {} => no-op",
                if enabled { "enabled" } else { "disabled" }
            );
            return Ok(());
        }
        if let Some(id) = reward.reward_id.clone() {
            let body = RewardPatch {
                is_enabled: Some(enabled),
                ..Default::default()
            };
            if let Err(e) = self.service.update_reward(&id, &body).await {
                error!("update_reward('{title}', is_enabled={enabled}) => {e}");
                return Ok(());
            }
        } else {
            debug!("reward '{title}' has no remote id yet => local change only");
        }
        if let Some(reward) = self.registry.managed_reward_mut(title) {
            reward.is_enabled = enabled;
            reward.updated_at = Utc::now();
        }
        Ok(())
    }

    pub async fn update_reward_cost(&mut self, title: &str, cost: u64) -> Result<(), Error> {
        let Some(reward) = self.registry.managed(title) else {
            warn!("update_reward_cost: no managed reward '{title}'");
            return Ok(());
        };
        if reward.cost == cost {
            warn!("reward '{title}' already costs {cost} => no-op");
            return Ok(());
        }
        if let Some(id) = reward.reward_id.clone() {
            let body = RewardPatch {
                cost: Some(cost),
                ..Default::default()
            };
            if let Err(e) = self.service.update_reward(&id, &body).await {
                error!("update_reward('{title}', cost={cost}) => {e}");
                return Ok(());
            }
        } else {
            debug!("reward '{title}' has no remote id yet => local change only");
        }
        if let Some(reward) = self.registry.managed_reward_mut(title) {
            reward.cost = cost;
            reward.updated_at = Utc::now();
        }
        Ok(())
    }

    pub async fn enable_group(&mut self, name: &str) -> Result<(), Error> {
        self.set_group_enabled(name, true).await
    }

    pub async fn disable_group(&mut self, name: &str) -> Result<(), Error> {
        self.set_group_enabled(name, false).await
    }

    async fn set_group_enabled(&mut self, name: &str, enabled: bool) -> Result<(), Error> {
        let Some(group) = self.registry.group(name) else {
            warn!("no reward group named '{name}'");
            return Ok(());
        };
        let titles = group.titles.clone();
        for title in titles {
            self.set_reward_enabled(&title, enabled).await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Event handling
    // ------------------------------------------------------------------

    /// Handles one queued event. Errors are logged here so the loop never
    /// stops on a bad notification or a failed remote call.
    pub async fn handle(&mut self, event: EngineEvent) -> Option<RouteOutcome> {
        match event {
            EngineEvent::Ready => {
                if self.reconciled {
                    warn!("duplicate ready signal => reconciliation already ran, ignoring");
                    return None;
                }
                self.reconciled = true;
                if let Err(e) = reconcile::reconcile(&mut self.registry, self.service.as_ref()).await
                {
                    error!("reward reconciliation failed: {e:?}");
                }
                None
            }
            EngineEvent::RedemptionAdded(evt) => {
                match self.router.handle_redemption_add(&mut self.registry, evt).await {
                    Ok(outcome) => Some(outcome),
                    Err(e) => {
                        error!("error routing redemption add: {e:?}");
                        None
                    }
                }
            }
            EngineEvent::RedemptionUpdated(evt) => {
                match self
                    .router
                    .handle_redemption_update(&mut self.registry, evt)
                    .await
                {
                    Ok(outcome) => Some(outcome),
                    Err(e) => {
                        error!("error routing redemption update: {e:?}");
                        None
                    }
                }
            }
        }
    }

    /// Drains the queue until every sender handle is dropped.
    pub async fn run(mut self, mut rx: mpsc::Receiver<EngineEvent>) {
        info!("reward engine started, draining notification queue.");
        while let Some(event) = rx.recv().await {
            self.handle(event).await;
        }
        info!("notification queue closed => reward engine stopping.");
    }
}

/// The explicit interface the transport collaborator calls into. Cloneable;
/// every method just enqueues onto the engine's single dispatch task.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineEvent>,
}

impl EngineHandle {
    pub async fn ready(&self) -> Result<(), Error> {
        self.send(EngineEvent::Ready).await
    }

    pub async fn redemption_added(&self, evt: RedemptionAdded) -> Result<(), Error> {
        self.send(EngineEvent::RedemptionAdded(evt)).await
    }

    pub async fn redemption_updated(&self, evt: RedemptionUpdated) -> Result<(), Error> {
        self.send(EngineEvent::RedemptionUpdated(evt)).await
    }

    async fn send(&self, event: EngineEvent) -> Result<(), Error> {
        self.tx
            .send(event)
            .await
            .map_err(|e| Error::Queue(format!("engine queue closed: {e}")))
    }
}
