//! Assignment records stored in the ledger.
//!
//! An [`Asset`] is one assignment instance. Its JSON layout is the persisted
//! format: one flat map from record ID to the JSON object below, with no
//! schema version field.
//!
//! ```text
//! {"Title":..,"Date":..,"Description":..,"Grade":0,"ID":..,
//!  "InstructorID":..,"Work":..,"Owner":..,"ClassID":..}
//! ```

use serde::{Deserialize, Serialize};

/// Builds the ledger ID for an assignment posted to a student.
///
/// IDs are `title ++ student`. The student's username being the ID suffix is
/// what lets queries recover "records belonging to this student" after the
/// record's `Owner` has moved back to the instructor.
#[must_use]
pub fn assignment_id(title: &str, student: &str) -> String {
    let mut id = String::with_capacity(title.len() + student.len());
    id.push_str(title);
    id.push_str(student);
    id
}

/// A single assignment record.
///
/// Field order matches the ledger's wire layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Assignment title; also the ID prefix.
    #[serde(rename = "Title")]
    pub title: String,

    /// Due date. Opaque, never parsed.
    #[serde(rename = "Date")]
    pub date: String,

    /// Free-text prompt.
    #[serde(rename = "Description")]
    pub description: String,

    /// Numeric grade, `0` while ungraded.
    #[serde(rename = "Grade")]
    pub grade: i64,

    /// Unique key in the world state.
    #[serde(rename = "ID")]
    pub id: String,

    /// Username of the creator/grader.
    #[serde(rename = "InstructorID")]
    pub instructor_id: String,

    /// Student response, empty until submission.
    #[serde(rename = "Work")]
    pub work: String,

    /// Current holder of the record.
    #[serde(rename = "Owner")]
    pub owner: String,

    /// Class grouping key.
    #[serde(rename = "ClassID")]
    pub class_id: String,
}

impl Asset {
    /// Returns true if this record's ID ends with `username`.
    ///
    /// Byte-wise suffix match, kept exactly as the ledger has always applied
    /// it: an empty username matches every ID, and `"al"` matches `"EssayHal"`.
    #[must_use]
    pub fn id_has_suffix(&self, username: &str) -> bool {
        self.id.len() >= username.len() && self.id.ends_with(username)
    }

    /// Derives the workflow state from `Owner`, `InstructorID`, `Work` and
    /// `Grade`. Nothing stores this; it is recomputed on every call.
    #[must_use]
    pub fn status(&self) -> AssignmentStatus {
        if self.owner != self.instructor_id {
            AssignmentStatus::Outstanding
        } else if self.work.is_empty() {
            AssignmentStatus::Authored
        } else if self.grade != 0 {
            AssignmentStatus::Graded
        } else {
            AssignmentStatus::Submitted
        }
    }
}

/// Workflow position of an assignment, inferred from its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Held by its instructor, not yet handed out.
    Authored,
    /// Held by someone other than the instructor (normally the student).
    Outstanding,
    /// Back with the instructor carrying work, not yet graded.
    Submitted,
    /// Back with the instructor carrying work and a non-zero grade.
    Graded,
}
