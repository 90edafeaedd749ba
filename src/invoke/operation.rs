//! Named invocations and the typed operations they parse into.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InvocationError;

/// Upper bound on the size of a single argument.
///
/// Submitted work is the only field expected to be large.
pub const MAX_ARGUMENT_LEN: usize = 1024 * 1024;

/// A function name plus positional string arguments, as sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Unique identifier for this request, carried in log events.
    pub request_id: Uuid,

    /// Exposed function name, e.g. `"TransferAsset"`.
    pub function: String,

    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Invocation {
    /// Creates an invocation with a fresh request ID.
    pub fn new<I, S>(function: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            request_id: Uuid::new_v4(),
            function: function.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets a custom request ID (useful for correlation).
    #[must_use]
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Check arity, sizes and integer arguments, producing a typed operation.
    pub fn parse(&self) -> Result<Operation, InvocationError> {
        Operation::parse(&self.function, &self.args)
    }
}

/// Fields shared by `CreateAsset` and `UpdateAsset`, in argument order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct AssetFields {
    pub id: String,
    pub title: String,
    pub grade: i64,
    pub owner: String,
    pub date: String,
    pub description: String,
    pub class_id: String,
}

/// Every operation the ledger exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "payload", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Operation {
    InitLedger,
    CreateAsset(AssetFields),
    ReadAsset { id: String },
    UpdateAsset(AssetFields),
    DeleteAsset { id: String },
    AssetExists { id: String },
    TransferAsset { id: String, new_owner: String },
    GradeAssignment { id: String, grade: i64 },
    SubmitAssignment { id: String, work: String },
    SubmitAndReturn { id: String, work: String },
    GetAllAssets { user: String, class: String },
    GetAllClasses { user: String },
    GetAllAssignments { user: String, class: String },
    GetSubmittedAssignments { user: String, class: String },
}

/// Exposed function names with their parameter names, in argument order.
const SIGNATURES: &[(&str, &[&str])] = &[
    ("InitLedger", &[]),
    (
        "CreateAsset",
        &["id", "title", "grade", "owner", "date", "description", "classID"],
    ),
    ("ReadAsset", &["id"]),
    (
        "UpdateAsset",
        &["id", "title", "grade", "owner", "date", "description", "classID"],
    ),
    ("DeleteAsset", &["id"]),
    ("AssetExists", &["id"]),
    ("TransferAsset", &["id", "newOwner"]),
    ("GradeAssignment", &["id", "newGrade"]),
    ("SubmitAssignment", &["id", "newWork"]),
    ("SubmitAndReturn", &["id", "newWork"]),
    ("GetAllAssets", &["username", "classID"]),
    ("GetAllClasses", &["username"]),
    ("GetAllAssignments", &["username", "classID"]),
    ("GetSubmittedAssignments", &["username", "classID"]),
];

impl Operation {
    /// Names of every exposed function, in declaration order.
    pub fn function_names() -> impl Iterator<Item = &'static str> {
        SIGNATURES.iter().map(|(name, _)| *name)
    }

    /// Parameter names of `function`, or `None` if it is not exposed.
    #[must_use]
    pub fn parameters(function: &str) -> Option<&'static [&'static str]> {
        SIGNATURES
            .iter()
            .find(|(name, _)| *name == function)
            .map(|(_, params)| *params)
    }

    /// Exposed function name of this operation.
    #[must_use]
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::InitLedger => "InitLedger",
            Self::CreateAsset(_) => "CreateAsset",
            Self::ReadAsset { .. } => "ReadAsset",
            Self::UpdateAsset(_) => "UpdateAsset",
            Self::DeleteAsset { .. } => "DeleteAsset",
            Self::AssetExists { .. } => "AssetExists",
            Self::TransferAsset { .. } => "TransferAsset",
            Self::GradeAssignment { .. } => "GradeAssignment",
            Self::SubmitAssignment { .. } => "SubmitAssignment",
            Self::SubmitAndReturn { .. } => "SubmitAndReturn",
            Self::GetAllAssets { .. } => "GetAllAssets",
            Self::GetAllClasses { .. } => "GetAllClasses",
            Self::GetAllAssignments { .. } => "GetAllAssignments",
            Self::GetSubmittedAssignments { .. } => "GetSubmittedAssignments",
        }
    }

    /// Returns true for operations that never write.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::ReadAsset { .. }
                | Self::AssetExists { .. }
                | Self::GetAllAssets { .. }
                | Self::GetAllClasses { .. }
                | Self::GetAllAssignments { .. }
                | Self::GetSubmittedAssignments { .. }
        )
    }

    /// Parse a function name and positional arguments.
    pub fn parse(function: &str, args: &[String]) -> Result<Self, InvocationError> {
        let params = Self::parameters(function).ok_or_else(|| InvocationError::UnknownFunction {
            function: function.to_string(),
        })?;

        if args.len() != params.len() {
            return Err(InvocationError::Arity {
                function: function.to_string(),
                expected: params.len(),
                actual: args.len(),
            });
        }

        for (param, arg) in params.iter().zip(args) {
            if arg.len() > MAX_ARGUMENT_LEN {
                return Err(InvocationError::ArgumentTooLarge {
                    argument: *param,
                    size: arg.len(),
                    max: MAX_ARGUMENT_LEN,
                });
            }
        }

        let arg = |i: usize| args[i].clone();

        let op = match function {
            "InitLedger" => Self::InitLedger,
            "CreateAsset" => Self::CreateAsset(asset_fields(args)?),
            "ReadAsset" => Self::ReadAsset { id: arg(0) },
            "UpdateAsset" => Self::UpdateAsset(asset_fields(args)?),
            "DeleteAsset" => Self::DeleteAsset { id: arg(0) },
            "AssetExists" => Self::AssetExists { id: arg(0) },
            "TransferAsset" => Self::TransferAsset {
                id: arg(0),
                new_owner: arg(1),
            },
            "GradeAssignment" => Self::GradeAssignment {
                id: arg(0),
                grade: parse_integer("newGrade", &args[1])?,
            },
            "SubmitAssignment" => Self::SubmitAssignment {
                id: arg(0),
                work: arg(1),
            },
            "SubmitAndReturn" => Self::SubmitAndReturn {
                id: arg(0),
                work: arg(1),
            },
            "GetAllAssets" => Self::GetAllAssets {
                user: arg(0),
                class: arg(1),
            },
            "GetAllClasses" => Self::GetAllClasses { user: arg(0) },
            "GetAllAssignments" => Self::GetAllAssignments {
                user: arg(0),
                class: arg(1),
            },
            "GetSubmittedAssignments" => Self::GetSubmittedAssignments {
                user: arg(0),
                class: arg(1),
            },
            other => {
                return Err(InvocationError::UnknownFunction {
                    function: other.to_string(),
                })
            }
        };
        Ok(op)
    }
}

fn asset_fields(args: &[String]) -> Result<AssetFields, InvocationError> {
    Ok(AssetFields {
        id: args[0].clone(),
        title: args[1].clone(),
        grade: parse_integer("grade", &args[2])?,
        owner: args[3].clone(),
        date: args[4].clone(),
        description: args[5].clone(),
        class_id: args[6].clone(),
    })
}

fn parse_integer(argument: &'static str, value: &str) -> Result<i64, InvocationError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| InvocationError::InvalidInteger {
            argument,
            value: value.to_string(),
        })
}
