//! Interpretation of raw stack status strings.
//!
//! Classifiers fail closed: any status outside the known vocabulary is
//! neither healthy nor complete, so `Wait` stops polling and reports it.

const COMPLETE_STATUSES: &[&str] = &[
    "CREATE_COMPLETE",
    "ROLLBACK_COMPLETE",
    "DELETE_COMPLETE",
    "UPDATE_COMPLETE",
    "UPDATE_ROLLBACK_COMPLETE",
];

const UPSERT_HEALTHY_STATUSES: &[&str] = &[
    "CREATE_IN_PROGRESS",
    "CREATE_COMPLETE",
    "UPDATE_IN_PROGRESS",
    "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
    "UPDATE_COMPLETE",
];

const DELETE_HEALTHY_STATUSES: &[&str] = &["DELETE_IN_PROGRESS", "DELETE_COMPLETE"];

/// Strategy deciding whether a polled stack status is acceptable and final.
pub trait StatusClassifier {
    /// Returns `true` while the stack is moving in the intended direction.
    fn is_healthy(&self, status: &str) -> bool;

    /// Returns `true` once the provider has stopped mutating the stack.
    fn is_complete(&self, status: &str) -> bool {
        COMPLETE_STATUSES.contains(&status)
    }

    /// Returns `true` when a stack that no longer exists satisfies the wait.
    fn accepts_missing(&self) -> bool {
        false
    }
}

/// Classifier for create-or-update operations.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UpsertClassifier;

impl StatusClassifier for UpsertClassifier {
    fn is_healthy(&self, status: &str) -> bool {
        UPSERT_HEALTHY_STATUSES.contains(&status)
    }
}

/// Classifier for delete operations.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DeleteClassifier;

impl StatusClassifier for DeleteClassifier {
    fn is_healthy(&self, status: &str) -> bool {
        DELETE_HEALTHY_STATUSES.contains(&status)
    }

    fn accepts_missing(&self) -> bool {
        true
    }
}
