//! # ClassLedger - Classroom assignments on a key-value ledger
//!
//! ClassLedger records classroom assignments as JSON records in a flat
//! key-value world state. Each record is a single assignment issued by an
//! instructor to one student; ownership moves between them as the
//! assignment is posted, handed in, and graded.
//!
//! ## Core Concepts
//!
//! - **Asset**: one assignment record, keyed by its ID (`title ++ student`)
//! - **World state**: the key-value store the contract reads and writes
//! - **Contract**: the operations over the world state, each one
//!   read-modify-write
//! - **Invocation**: a function name plus string arguments, as a client
//!   sends it
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use classledger::{assignment_id, AssignmentContract, InMemoryWorldState};
//!
//! let contract = AssignmentContract::new(Arc::new(InMemoryWorldState::new()));
//! let id = assignment_id("Essay", "alice");
//!
//! contract.create_asset(&id, "Essay", 0, "bob", "5/1", "Why Rust?", "CS101")?;
//! contract.transfer_asset(&id, "alice")?;
//!
//! let mine = contract.get_all_assignments("alice", "CS101")?;
//! assert_eq!(mine.len(), 1);
//! # Ok::<(), classledger::ContractError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod asset;
pub mod config;
pub mod contract;
pub mod error;
pub mod invoke;
pub mod storage;
pub mod workflow;

pub use asset::{assignment_id, Asset, AssignmentStatus};
pub use config::{LedgerConfig, PersistentConfig};
pub use contract::{AssignmentContract, ContractResult};
pub use error::{ContractError, InvocationError, LedgerError, LedgerResult};
pub use invoke::{Invocation, Operation, Response};
pub use storage::{InMemoryWorldState, StateEntry, StorageError, WorldState};
pub use workflow::{grade_submission, hand_in, post_assignment, WorkflowError, WorkflowStep};

#[cfg(feature = "persistent")]
pub use storage::{open_world_state, PersistentWorldState};
