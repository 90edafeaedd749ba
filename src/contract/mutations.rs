//! Write operations of the contract.

use crate::asset::Asset;
use crate::error::ContractError;

use super::{AssignmentContract, ContractResult};

impl AssignmentContract {
    /// Issue a new record authored by `owner`.
    ///
    /// The creator becomes both `InstructorID` and `Owner`; `Work` starts
    /// empty.
    ///
    /// # Errors
    /// `AlreadyExists` if `id` is taken; the stored record is left untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn create_asset(
        &self,
        id: &str,
        title: &str,
        grade: i64,
        owner: &str,
        date: &str,
        description: &str,
        class_id: &str,
    ) -> ContractResult<()> {
        if self.asset_exists(id)? {
            return Err(ContractError::already_exists(id));
        }

        let asset = Asset {
            title: title.to_string(),
            date: date.to_string(),
            description: description.to_string(),
            grade,
            id: id.to_string(),
            instructor_id: owner.to_string(),
            work: String::new(),
            owner: owner.to_string(),
            class_id: class_id.to_string(),
        };
        self.put_asset(&asset)?;

        tracing::debug!(id, owner, class_id, "created asset");
        Ok(())
    }

    /// Overwrite an existing record.
    ///
    /// This replaces the record wholesale rather than merging: `Work` and
    /// `InstructorID` are reset to empty whatever they held before.
    ///
    /// # Errors
    /// `NotFound` if `id` is absent.
    #[allow(clippy::too_many_arguments)]
    pub fn update_asset(
        &self,
        id: &str,
        title: &str,
        grade: i64,
        owner: &str,
        date: &str,
        description: &str,
        class_id: &str,
    ) -> ContractResult<()> {
        self.require_exists(id)?;

        let asset = Asset {
            title: title.to_string(),
            date: date.to_string(),
            description: description.to_string(),
            grade,
            id: id.to_string(),
            instructor_id: String::new(),
            work: String::new(),
            owner: owner.to_string(),
            class_id: class_id.to_string(),
        };
        self.put_asset(&asset)?;

        tracing::debug!(id, owner, class_id, "overwrote asset");
        Ok(())
    }

    /// Remove a record.
    ///
    /// # Errors
    /// `NotFound` if `id` is absent.
    pub fn delete_asset(&self, id: &str) -> ContractResult<()> {
        self.require_exists(id)?;
        self.state.del_state(id)?;

        tracing::debug!(id, "deleted asset");
        Ok(())
    }

    /// Hand a record to `new_owner`, returning the previous owner.
    pub fn transfer_asset(&self, id: &str, new_owner: &str) -> ContractResult<String> {
        let mut asset = self.read_asset(id)?;
        let old_owner = std::mem::replace(&mut asset.owner, new_owner.to_string());
        self.put_asset(&asset)?;

        tracing::debug!(id, from = %old_owner, to = new_owner, "transferred asset");
        Ok(old_owner)
    }

    /// Set the grade, returning the previous grade. Owner and work are kept.
    pub fn grade_assignment(&self, id: &str, grade: i64) -> ContractResult<i64> {
        let mut asset = self.read_asset(id)?;
        let old_grade = std::mem::replace(&mut asset.grade, grade);
        self.put_asset(&asset)?;

        tracing::debug!(id, old_grade, grade, "graded assignment");
        Ok(old_grade)
    }

    /// Record the student's work. Owner and grade are kept.
    ///
    /// Handing the record back to the instructor is a separate
    /// [`transfer_asset`](Self::transfer_asset) call; until it happens the
    /// record holds work while still owned by the student.
    pub fn submit_assignment(&self, id: &str, work: &str) -> ContractResult<()> {
        let mut asset = self.read_asset(id)?;
        asset.work = work.to_string();
        self.put_asset(&asset)?;

        tracing::debug!(id, work_len = work.len(), "submitted work");
        Ok(())
    }

    /// Record the work and hand the record back to its instructor in a
    /// single write, returning the previous owner.
    ///
    /// Equivalent to [`submit_assignment`](Self::submit_assignment) followed
    /// by a transfer to `InstructorID`, without the window in between.
    pub fn submit_and_return(&self, id: &str, work: &str) -> ContractResult<String> {
        let mut asset = self.read_asset(id)?;
        asset.work = work.to_string();
        let instructor = asset.instructor_id.clone();
        let old_owner = std::mem::replace(&mut asset.owner, instructor);
        self.put_asset(&asset)?;

        tracing::debug!(id, from = %old_owner, to = %asset.owner, "submitted and returned");
        Ok(old_owner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use crate::asset::assignment_id;
    use crate::contract::test_support::{contract, FlakyWorldState};
    use crate::contract::AssignmentContract;
    use crate::error::ContractError;
    use crate::storage::WorldState;

    fn create_essay(contract: &AssignmentContract) -> String {
        let id = assignment_id("Essay", "alice");
        contract
            .create_asset(&id, "Essay", 0, "bob", "5/1", "Describe ownership", "CS101")
            .unwrap();
        id
    }

    #[test]
    fn test_create_sets_instructor_and_owner() {
        let (contract, _) = contract();
        let id = create_essay(&contract);

        let asset = contract.read_asset(&id).unwrap();
        assert_eq!(asset.instructor_id, "bob");
        assert_eq!(asset.owner, "bob");
        assert_eq!(asset.work, "");
        assert_eq!(asset.grade, 0);
        assert_eq!(asset.title, "Essay");
        assert_eq!(asset.class_id, "CS101");
    }

    #[test]
    fn test_duplicate_create_keeps_original() {
        let (contract, _) = contract();
        let id = create_essay(&contract);
        let before = contract.read_asset(&id).unwrap();

        let err = contract
            .create_asset(&id, "Other", 5, "mallory", "", "", "CS999")
            .unwrap_err();
        assert!(matches!(err, ContractError::AlreadyExists { .. }));
        assert_eq!(contract.read_asset(&id).unwrap(), before);
    }

    #[test]
    fn test_update_resets_work_and_instructor() {
        let (contract, _) = contract();
        let id = create_essay(&contract);
        contract.submit_assignment(&id, "draft").unwrap();

        contract
            .update_asset(&id, "Essay v2", 3, "carol", "6/1", "Revised", "CS102")
            .unwrap();

        let asset = contract.read_asset(&id).unwrap();
        assert_eq!(asset.title, "Essay v2");
        assert_eq!(asset.grade, 3);
        assert_eq!(asset.owner, "carol");
        assert_eq!(asset.class_id, "CS102");
        assert_eq!(asset.work, "");
        assert_eq!(asset.instructor_id, "");
    }

    #[test]
    fn test_transfer_returns_previous_owner() {
        let (contract, _) = contract();
        let id = create_essay(&contract);
        let before = contract.read_asset(&id).unwrap();

        assert_eq!(contract.transfer_asset(&id, "alice").unwrap(), "bob");
        let after = contract.read_asset(&id).unwrap();
        assert_eq!(after.owner, "alice");
        assert_eq!(
            crate::asset::Asset {
                owner: "bob".to_string(),
                ..after
            },
            before
        );
    }

    #[test]
    fn test_grade_returns_previous_grade() {
        let (contract, _) = contract();
        let id = create_essay(&contract);
        contract.transfer_asset(&id, "alice").unwrap();
        contract.submit_assignment(&id, "answer").unwrap();

        assert_eq!(contract.grade_assignment(&id, 88).unwrap(), 0);
        assert_eq!(contract.grade_assignment(&id, 91).unwrap(), 88);

        let asset = contract.read_asset(&id).unwrap();
        assert_eq!(asset.grade, 91);
        assert_eq!(asset.owner, "alice");
        assert_eq!(asset.work, "answer");
    }

    #[test]
    fn test_submit_leaves_owner_and_grade() {
        let (contract, _) = contract();
        let id = create_essay(&contract);
        contract.transfer_asset(&id, "alice").unwrap();

        contract.submit_assignment(&id, "my answer").unwrap();
        let asset = contract.read_asset(&id).unwrap();
        assert_eq!(asset.work, "my answer");
        assert_eq!(asset.owner, "alice");
        assert_eq!(asset.grade, 0);
    }

    #[test]
    fn test_submit_and_return_hands_back_in_one_write() {
        let (contract, _) = contract();
        let id = create_essay(&contract);
        contract.transfer_asset(&id, "alice").unwrap();

        assert_eq!(contract.submit_and_return(&id, "final").unwrap(), "alice");
        let asset = contract.read_asset(&id).unwrap();
        assert_eq!(asset.work, "final");
        assert_eq!(asset.owner, "bob");
        assert_eq!(asset.grade, 0);
    }

    #[test]
    fn test_mutators_on_missing_id() {
        let (contract, _) = contract();
        let not_found = |r: Result<(), ContractError>| {
            assert!(matches!(r, Err(ContractError::NotFound { .. })), "{r:?}");
        };

        not_found(contract.update_asset("ghost", "", 0, "", "", "", ""));
        not_found(contract.delete_asset("ghost"));
        not_found(contract.transfer_asset("ghost", "x").map(|_| ()));
        not_found(contract.grade_assignment("ghost", 1).map(|_| ()));
        not_found(contract.submit_assignment("ghost", "w"));
        not_found(contract.submit_and_return("ghost", "w").map(|_| ()));
        not_found(contract.read_asset("ghost").map(|_| ()));
    }

    #[test]
    fn test_delete_is_final() {
        let (contract, state) = contract();
        let id = create_essay(&contract);

        contract.delete_asset(&id).unwrap();
        assert!(state.get_state(&id).unwrap().is_none());
        assert!(!contract.asset_exists(&id).unwrap());
        assert!(matches!(
            contract.delete_asset(&id),
            Err(ContractError::NotFound { .. })
        ));
    }

    #[test]
    fn test_failed_write_leaves_record_unchanged() {
        let state = Arc::new(FlakyWorldState::default());
        let contract = AssignmentContract::new(state.clone());
        let id = create_essay(&contract);

        state.fail_writes.store(true, Ordering::SeqCst);
        assert!(matches!(
            contract.transfer_asset(&id, "alice"),
            Err(ContractError::Store(_))
        ));

        state.fail_writes.store(false, Ordering::SeqCst);
        assert_eq!(contract.read_asset(&id).unwrap().owner, "bob");
    }
}
