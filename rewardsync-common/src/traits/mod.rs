// File: rewardsync-common/src/traits/mod.rs

use async_trait::async_trait;

use crate::error::Error;
use crate::models::redemption::{RedemptionDescriptor, RedemptionStatus};
use crate::models::reward::{RewardDescriptor, RewardPatch};

/// The remote channel service: source of truth for reward definitions and
/// redemption status. Implementations wrap whatever transport/API client the
/// host application uses; this crate only ever holds it as
/// `Arc<dyn ChannelService + Send + Sync>`.
#[async_trait]
pub trait ChannelService: Send + Sync {
    /// Lists every custom reward currently defined on the channel.
    async fn list_rewards(&self) -> Result<Vec<RewardDescriptor>, Error>;

    /// Creates a reward. `body.title` and `body.cost` must be set.
    /// Fails with [`Error::DuplicateReward`] when the title already exists.
    async fn create_reward(&self, body: &RewardPatch) -> Result<RewardDescriptor, Error>;

    /// Patches an existing reward; only the fields present in `body` change.
    async fn update_reward(
        &self,
        reward_id: &str,
        body: &RewardPatch,
    ) -> Result<RewardDescriptor, Error>;

    /// Marks a redemption fulfilled or canceled. Canceling refunds the
    /// user's points on the remote side.
    async fn update_redemption_status(
        &self,
        reward_id: &str,
        redemption_id: &str,
        status: RedemptionStatus,
    ) -> Result<(), Error>;

    /// Fetches the authoritative record for a single redemption.
    async fn fetch_redemption(
        &self,
        reward_id: &str,
        redemption_id: &str,
    ) -> Result<RedemptionDescriptor, Error>;
}
