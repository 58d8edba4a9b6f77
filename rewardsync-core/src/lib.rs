// src/lib.rs

pub mod dispatch;
pub mod reconcile;
pub mod registry;
pub mod router;

pub use dispatch::{EngineEvent, EngineHandle, RewardEngine};
pub use registry::{RewardCallback, RewardRegistry};
pub use rewardsync_common::error::Error;
pub use router::RouteOutcome;
