//! Named-operation interface.
//!
//! Clients address the ledger by function name with positional string
//! arguments. An [`Invocation`] is parsed into a typed [`Operation`] (local
//! validation, nothing touches the world state), executed against an
//! [`AssignmentContract`], and the [`Response`] is encoded as UTF-8 JSON.

mod operation;
mod response;

pub use operation::{AssetFields, Invocation, Operation, MAX_ARGUMENT_LEN};
pub use response::Response;

use crate::contract::{AssignmentContract, ContractResult};
use crate::error::LedgerResult;

impl AssignmentContract {
    /// Execute a parsed operation.
    pub fn execute(&self, op: &Operation) -> ContractResult<Response> {
        let response = match op {
            Operation::InitLedger => {
                self.init_ledger()?;
                Response::Empty
            }
            Operation::CreateAsset(f) => {
                self.create_asset(
                    &f.id,
                    &f.title,
                    f.grade,
                    &f.owner,
                    &f.date,
                    &f.description,
                    &f.class_id,
                )?;
                Response::Empty
            }
            Operation::ReadAsset { id } => Response::Asset(self.read_asset(id)?),
            Operation::UpdateAsset(f) => {
                self.update_asset(
                    &f.id,
                    &f.title,
                    f.grade,
                    &f.owner,
                    &f.date,
                    &f.description,
                    &f.class_id,
                )?;
                Response::Empty
            }
            Operation::DeleteAsset { id } => {
                self.delete_asset(id)?;
                Response::Empty
            }
            Operation::AssetExists { id } => Response::Exists(self.asset_exists(id)?),
            Operation::TransferAsset { id, new_owner } => {
                Response::Owner(self.transfer_asset(id, new_owner)?)
            }
            Operation::GradeAssignment { id, grade } => {
                Response::Grade(self.grade_assignment(id, *grade)?)
            }
            Operation::SubmitAssignment { id, work } => {
                self.submit_assignment(id, work)?;
                Response::Empty
            }
            Operation::SubmitAndReturn { id, work } => {
                Response::Owner(self.submit_and_return(id, work)?)
            }
            Operation::GetAllAssets { user, class } => {
                Response::Assets(self.get_all_assets(user, class)?)
            }
            Operation::GetAllClasses { user } => Response::Classes(self.get_all_classes(user)?),
            Operation::GetAllAssignments { user, class } => {
                Response::Assets(self.get_all_assignments(user, class)?)
            }
            Operation::GetSubmittedAssignments { user, class } => {
                Response::Assets(self.get_submitted_assignments(user, class)?)
            }
        };
        Ok(response)
    }

    /// Parse and execute a named invocation.
    pub fn invoke(&self, invocation: &Invocation) -> LedgerResult<Response> {
        let span = tracing::debug_span!(
            "invoke",
            request_id = %invocation.request_id,
            function = %invocation.function
        );
        let _guard = span.enter();

        let op = invocation.parse().inspect_err(|e| {
            tracing::debug!(error = %e, "rejected invocation");
        })?;

        match self.execute(&op) {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::debug!(error = %e, "operation failed");
                Err(e.into())
            }
        }
    }

    /// Parse, execute, and encode a named invocation as its JSON payload.
    pub fn invoke_payload(&self, invocation: &Invocation) -> LedgerResult<Vec<u8>> {
        Ok(self.invoke(invocation)?.to_payload()?)
    }
}
