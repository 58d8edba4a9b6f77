// File: rewardsync-common/src/models/mod.rs
pub mod reward;
pub mod redemption;

pub use reward::{
    ManagedReward, ManagedRewardGroup, PermissionTier, RewardDescriptor, RewardPatch,
};
pub use redemption::{
    Redemption, RedemptionAdded, RedemptionDescriptor, RedemptionStatus, RedemptionUpdated,
    RedemptionUsage, UserRef,
};
