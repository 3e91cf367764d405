//! Data models for IBC end-to-end testing
//!
//! This module contains all data structures shared by the harness, the
//! collaborator traits and the runner.

mod channel;
mod contract;
mod relay;
mod scenario;

pub use channel::{ChannelDescriptor, ChannelEnd, ChannelInfo, Ordering, Side};
pub use contract::{ContractDescriptor, ContractSet, DeployedContract, DeployedContracts};
pub use relay::{AckRecord, RelayOutcome};
pub use scenario::{RunSummary, Scenario, ScenarioResult, ScenarioStatus, StageTiming};
