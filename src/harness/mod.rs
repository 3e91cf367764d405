//! Orchestration core
//!
//! Stage sequence of every end-to-end test: deploy contracts, bring up a
//! channel between their ports, trigger an operation, relay, then assert on
//! packet counts and acknowledgements.

pub mod ack;
pub mod assertions;
pub mod bringup;
pub mod error;
pub mod registry;

pub use ack::{AckDecoder, PathStep};
pub use assertions::{expect_relayed, parse_ack_success};
pub use bringup::create_channel;
pub use error::HarnessError;
pub use registry::{deploy_all, ContractRegistry};
