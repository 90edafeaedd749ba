//! Multi-call protocols run by the instructor and student clients.
//!
//! Each helper here is a sequence of independent contract calls, exactly as
//! a remote client would issue them. Nothing makes the sequence atomic: if a
//! later call fails, the earlier ones stay applied and the error reports
//! which step failed. [`AssignmentContract::submit_and_return`] is the
//! single-write alternative to [`hand_in`].

use crate::asset::{assignment_id, Asset};
use crate::contract::AssignmentContract;
use crate::error::ContractError;

/// Step of a multi-call workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    /// Creating the record.
    Create,
    /// Reading the record before acting on it.
    Read,
    /// Writing the student's work.
    Submit,
    /// Moving ownership.
    Transfer,
    /// Setting the grade.
    Grade,
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Submit => "submit",
            Self::Transfer => "transfer",
            Self::Grade => "grade",
        };
        f.write_str(name)
    }
}

/// A workflow call failed after `completed` earlier steps were applied.
#[derive(Debug, thiserror::Error)]
#[error("workflow failed at {step} step ({} earlier step(s) already applied): {source}", .completed.len())]
pub struct WorkflowError {
    /// The step that failed.
    pub step: WorkflowStep,
    /// Steps that succeeded before it and were not rolled back.
    pub completed: Vec<WorkflowStep>,
    /// The contract error from the failing step.
    #[source]
    pub source: ContractError,
}

struct Steps {
    completed: Vec<WorkflowStep>,
}

impl Steps {
    fn new() -> Self {
        Self {
            completed: Vec::new(),
        }
    }

    fn run<T>(
        &mut self,
        step: WorkflowStep,
        call: impl FnOnce() -> Result<T, ContractError>,
    ) -> Result<T, WorkflowError> {
        match call() {
            Ok(value) => {
                self.completed.push(step);
                Ok(value)
            }
            Err(source) => {
                if !self.completed.is_empty() {
                    tracing::warn!(
                        %step,
                        completed = ?self.completed,
                        error = %source,
                        "workflow stopped part way; earlier steps remain applied"
                    );
                }
                Err(WorkflowError {
                    step,
                    completed: std::mem::take(&mut self.completed),
                    source,
                })
            }
        }
    }
}

/// Instructor posts an assignment to one student.
///
/// Creates `title ++ student` owned by `instructor`, then transfers it to
/// `student`. Returns the new record's ID.
pub fn post_assignment(
    contract: &AssignmentContract,
    instructor: &str,
    class_id: &str,
    title: &str,
    student: &str,
    date: &str,
    description: &str,
) -> Result<String, WorkflowError> {
    let id = assignment_id(title, student);
    let mut steps = Steps::new();

    steps.run(WorkflowStep::Create, || {
        contract.create_asset(&id, title, 0, instructor, date, description, class_id)
    })?;
    steps.run(WorkflowStep::Transfer, || contract.transfer_asset(&id, student))?;

    tracing::info!(id = %id, instructor, student, class_id, "posted assignment");
    Ok(id)
}

/// Student hands in work for `title`.
///
/// Reads `title ++ student`, submits `work`, then transfers the record to
/// its `InstructorID`. Returns the record as it was before handing in.
pub fn hand_in(
    contract: &AssignmentContract,
    student: &str,
    title: &str,
    work: &str,
) -> Result<Asset, WorkflowError> {
    let id = assignment_id(title, student);
    let mut steps = Steps::new();

    let before = steps.run(WorkflowStep::Read, || contract.read_asset(&id))?;
    steps.run(WorkflowStep::Submit, || contract.submit_assignment(&id, work))?;
    steps.run(WorkflowStep::Transfer, || {
        contract.transfer_asset(&id, &before.instructor_id)
    })?;

    tracing::info!(id = %id, student, instructor = %before.instructor_id, "handed in assignment");
    Ok(before)
}

/// Instructor grades a handed-in record, returning the previous grade.
pub fn grade_submission(
    contract: &AssignmentContract,
    id: &str,
    grade: i64,
) -> Result<i64, WorkflowError> {
    let mut steps = Steps::new();
    steps.run(WorkflowStep::Grade, || contract.grade_assignment(id, grade))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use super::*;
    use crate::asset::AssignmentStatus;
    use crate::contract::test_support::{contract, FlakyWorldState};
    use crate::storage::WorldState;

    #[test]
    fn test_full_lifecycle() {
        let (contract, _) = contract();

        let id = post_assignment(&contract, "bob", "CS101", "Essay", "alice", "5/1", "Why Rust?")
            .unwrap();
        assert_eq!(id, "Essayalice");
        assert_eq!(contract.read_asset(&id).unwrap().status(), AssignmentStatus::Outstanding);

        let before = hand_in(&contract, "alice", "Essay", "Because.").unwrap();
        assert_eq!(before.owner, "alice");
        let asset = contract.read_asset(&id).unwrap();
        assert_eq!(asset.status(), AssignmentStatus::Submitted);
        assert_eq!(asset.owner, "bob");

        assert_eq!(grade_submission(&contract, &id, 95).unwrap(), 0);
        assert_eq!(contract.read_asset(&id).unwrap().status(), AssignmentStatus::Graded);
    }

    #[test]
    fn test_post_duplicate_fails_at_create() {
        let (contract, _) = contract();
        post_assignment(&contract, "bob", "CS101", "Essay", "alice", "", "").unwrap();

        let err = post_assignment(&contract, "bob", "CS101", "Essay", "alice", "", "").unwrap_err();
        assert_eq!(err.step, WorkflowStep::Create);
        assert!(err.completed.is_empty());
        assert!(matches!(err.source, ContractError::AlreadyExists { .. }));
    }

    #[test]
    fn test_hand_in_unknown_assignment() {
        let (contract, _) = contract();
        let err = hand_in(&contract, "alice", "Missing", "work").unwrap_err();
        assert_eq!(err.step, WorkflowStep::Read);
        assert!(matches!(err.source, ContractError::NotFound { .. }));
    }

    /// Fails every write after the first `allowed` writes.
    struct FailAfter {
        inner: FlakyWorldState,
        allowed: std::sync::atomic::AtomicUsize,
    }

    impl WorldState for FailAfter {
        fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, crate::storage::StorageError> {
            self.inner.get_state(key)
        }

        fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), crate::storage::StorageError> {
            if self.allowed.load(Ordering::SeqCst) == 0 {
                self.inner.fail_writes.store(true, Ordering::SeqCst);
            } else {
                self.allowed.fetch_sub(1, Ordering::SeqCst);
            }
            self.inner.put_state(key, value)
        }

        fn del_state(&self, key: &str) -> Result<(), crate::storage::StorageError> {
            self.inner.del_state(key)
        }

        fn get_state_by_range(
            &self,
            start: &str,
            end: &str,
        ) -> Result<Vec<crate::storage::StateEntry>, crate::storage::StorageError> {
            self.inner.get_state_by_range(start, end)
        }
    }

    #[test]
    fn test_hand_in_can_leave_half_submitted_record() {
        // create + transfer + submit succeed, the hand-back transfer fails.
        let state = Arc::new(FailAfter {
            inner: FlakyWorldState::default(),
            allowed: std::sync::atomic::AtomicUsize::new(3),
        });
        let contract = AssignmentContract::new(state);
        post_assignment(&contract, "bob", "CS101", "Essay", "alice", "", "").unwrap();

        let err = hand_in(&contract, "alice", "Essay", "answer").unwrap_err();
        assert_eq!(err.step, WorkflowStep::Transfer);
        assert_eq!(err.completed, vec![WorkflowStep::Read, WorkflowStep::Submit]);

        let asset = contract.read_asset("Essayalice").unwrap();
        assert_eq!(asset.work, "answer");
        assert_eq!(asset.owner, "alice");
        assert!(contract.get_submitted_assignments("alice", "CS101").unwrap().is_empty());
        assert_eq!(contract.get_all_assignments("alice", "CS101").unwrap().len(), 1);
    }

    #[test]
    fn test_error_message_names_step() {
        let (contract, _) = contract();
        let err = hand_in(&contract, "alice", "Missing", "work").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("read step"));
        assert!(msg.contains("does not exist"));
    }
}
