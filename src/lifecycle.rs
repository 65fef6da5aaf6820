//! Entity lifecycle policy shared by departments, students, and instructors.
//!
//! Each status-bearing entity declares its status set as an enum implementing
//! [`LifecycleStatus`]. The allowed-transition table and the
//! status-to-credential-access mapping are exhaustive `match` expressions, so
//! adding a status without extending the tables is a compile error. Terminal
//! states declare an empty transition set.

use crate::utils::errors::AppError;

pub trait LifecycleStatus: Copy + Eq + Sized + 'static {
    /// Entity name used in error messages.
    const ENTITY: &'static str;

    /// Every declared status value.
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    /// Statuses reachable from this one.
    fn allowed_transitions(self) -> &'static [Self];

    /// Whether a linked credential record may authenticate in this status.
    fn grants_access(self) -> bool;

    fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

/// Validates a status transition against the entity's table.
///
/// The target being absent from the current status's row covers both illegal
/// moves and terminal states; unknown status strings never reach this point
/// (request deserialization rejects them).
pub fn ensure_transition<S: LifecycleStatus>(current: S, target: S) -> Result<(), AppError> {
    if current.allowed_transitions().contains(&target) {
        return Ok(());
    }

    Err(AppError::bad_request(anyhow::anyhow!(
        "{} status cannot change from {} to {}",
        S::ENTITY,
        current.as_str(),
        target.as_str()
    )))
}
