//! The record store contract.
//!
//! [`AssignmentContract`] exposes every ledger operation over an injected
//! [`WorldState`]. Each operation is one read-modify-write: it checks its
//! precondition, applies its change, and fails fast on the first violated
//! precondition with nothing written. Nothing is cached between calls.

mod mutations;
mod queries;

pub use queries::{
    is_class_member, is_open_assignment, is_submitted_by, is_unassigned_for,
};

use std::sync::Arc;

use crate::asset::Asset;
use crate::error::ContractError;
use crate::storage::WorldState;

/// Result type alias for contract operations.
pub type ContractResult<T> = Result<T, ContractError>;

/// Assignment ledger operations over a key-value world state.
#[derive(Clone)]
pub struct AssignmentContract {
    state: Arc<dyn WorldState>,
}

impl std::fmt::Debug for AssignmentContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignmentContract").finish_non_exhaustive()
    }
}

impl AssignmentContract {
    /// Create a contract over `state`.
    #[must_use]
    pub fn new(state: Arc<dyn WorldState>) -> Self {
        Self { state }
    }

    /// The world state this contract reads and writes.
    #[must_use]
    pub fn state(&self) -> &Arc<dyn WorldState> {
        &self.state
    }

    /// Bootstrap hook called once by clients after deployment.
    ///
    /// The ledger starts empty, so there is nothing to seed.
    pub fn init_ledger(&self) -> ContractResult<()> {
        tracing::debug!("init_ledger: no seed records");
        Ok(())
    }

    /// Returns true when a non-empty value is stored under `id`.
    pub fn asset_exists(&self, id: &str) -> ContractResult<bool> {
        let value = self.state.get_state(id)?;
        Ok(value.is_some_and(|v| !v.is_empty()))
    }

    /// Look up one record.
    ///
    /// # Errors
    /// - `NotFound` if nothing is stored under `id`
    /// - `Decode` if the stored value is not a record
    pub fn read_asset(&self, id: &str) -> ContractResult<Asset> {
        match self.state.get_state(id)? {
            Some(bytes) if !bytes.is_empty() => decode_asset(id, &bytes),
            _ => Err(ContractError::not_found(id)),
        }
    }

    fn require_exists(&self, id: &str) -> ContractResult<()> {
        if self.asset_exists(id)? {
            Ok(())
        } else {
            Err(ContractError::not_found(id))
        }
    }

    fn put_asset(&self, asset: &Asset) -> ContractResult<()> {
        let bytes = serde_json::to_vec(asset).map_err(|e| ContractError::Encode {
            message: e.to_string(),
        })?;
        self.state.put_state(&asset.id, bytes)?;
        Ok(())
    }
}

pub(crate) fn decode_asset(key: &str, bytes: &[u8]) -> ContractResult<Asset> {
    serde_json::from_slice(bytes).map_err(|e| ContractError::Decode {
        key: key.to_string(),
        message: e.to_string(),
    })
}
