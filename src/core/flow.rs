//! Per-form flow state machine
//!
//! Every controller walks the same path:
//! `Idle → Validating → (NeedsPassphrase) → Executing → Success | Error`,
//! and returns to `Idle` on clear.

use serde::{Deserialize, Serialize};

use crate::core::error::PgpError;

/// Where a form currently is in its operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowState {
    Idle,
    Validating,
    NeedsPassphrase,
    Executing,
    Success,
    Error,
}

impl FlowState {
    fn can_transition_to(self, next: FlowState) -> bool {
        use FlowState::*;
        match (self, next) {
            (_, Idle) => true,
            (Idle | Success | Error | NeedsPassphrase, Validating) => true,
            (Validating, NeedsPassphrase | Executing | Error) => true,
            (NeedsPassphrase, Executing | Error) => true,
            (Executing, Success | Error) => true,
            _ => false,
        }
    }
}

/// State holder shared by all controllers.
#[derive(Debug, Clone)]
pub struct Flow {
    state: FlowState,
    last_error: Option<PgpError>,
}

impl Default for Flow {
    fn default() -> Self {
        Self::new()
    }
}

impl Flow {
    pub fn new() -> Self {
        Self {
            state: FlowState::Idle,
            last_error: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn last_error(&self) -> Option<&PgpError> {
        self.last_error.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.state == FlowState::Executing
    }

    fn transition(&mut self, next: FlowState) -> Result<(), PgpError> {
        if !self.state.can_transition_to(next) {
            tracing::error!("Invalid flow transition {:?} -> {:?}", self.state, next);
            return Err(PgpError::Internal);
        }
        tracing::trace!("Flow transition {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Start a new run. Fails with `Busy` while an operation is executing.
    pub fn begin_validation(&mut self) -> Result<(), PgpError> {
        if self.is_busy() {
            return Err(PgpError::Busy);
        }
        self.last_error = None;
        self.transition(FlowState::Validating)
    }

    /// Park the flow until the user supplies a passphrase.
    pub fn require_passphrase(&mut self) -> Result<(), PgpError> {
        self.transition(FlowState::NeedsPassphrase)?;
        self.last_error = Some(PgpError::missing_passphrase());
        Ok(())
    }

    pub fn begin_execution(&mut self) -> Result<(), PgpError> {
        self.transition(FlowState::Executing)
    }

    pub fn succeed(&mut self) -> Result<(), PgpError> {
        self.transition(FlowState::Success)?;
        self.last_error = None;
        Ok(())
    }

    /// Record a failure and move to `Error`; hands the error back for `?` chaining.
    pub fn fail(&mut self, err: PgpError) -> PgpError {
        // An out-of-order fail is already logged by `transition`; the error is still kept.
        let _ = self.transition(FlowState::Error);
        self.last_error = Some(err.clone());
        err
    }

    pub fn reset(&mut self) {
        self.state = FlowState::Idle;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorCategory;

    #[test]
    fn test_happy_path() {
        let mut flow = Flow::new();
        assert_eq!(flow.state(), FlowState::Idle);

        flow.begin_validation().unwrap();
        flow.begin_execution().unwrap();
        flow.succeed().unwrap();

        assert_eq!(flow.state(), FlowState::Success);
        assert!(flow.last_error().is_none());
    }

    #[test]
    fn test_passphrase_detour_and_resume() {
        let mut flow = Flow::new();
        flow.begin_validation().unwrap();
        flow.require_passphrase().unwrap();

        assert_eq!(flow.state(), FlowState::NeedsPassphrase);
        assert_eq!(
            flow.last_error().map(PgpError::category),
            Some(ErrorCategory::Passphrase)
        );

        // Resuming re-validates with the new passphrase
        flow.begin_validation().unwrap();
        assert!(flow.last_error().is_none());
        flow.begin_execution().unwrap();
        flow.succeed().unwrap();
    }

    #[test]
    fn test_busy_while_executing() {
        let mut flow = Flow::new();
        flow.begin_validation().unwrap();
        flow.begin_execution().unwrap();

        assert_eq!(flow.begin_validation(), Err(PgpError::Busy));
        assert_eq!(flow.state(), FlowState::Executing);
    }

    #[test]
    fn test_invalid_transition_is_rejected() {
        let mut flow = Flow::new();
        assert_eq!(flow.begin_execution(), Err(PgpError::Internal));
        assert_eq!(flow.state(), FlowState::Idle);

        assert_eq!(flow.succeed(), Err(PgpError::Internal));
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[test]
    fn test_error_is_retryable() {
        let mut flow = Flow::new();
        flow.begin_validation().unwrap();
        let err = flow.fail(PgpError::wrong_passphrase());

        assert_eq!(err, PgpError::wrong_passphrase());
        assert_eq!(flow.state(), FlowState::Error);

        flow.begin_validation().unwrap();
        assert_eq!(flow.state(), FlowState::Validating);
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut flow = Flow::new();
        flow.begin_validation().unwrap();
        flow.begin_execution().unwrap();
        flow.reset();

        assert_eq!(flow.state(), FlowState::Idle);
        assert!(flow.last_error().is_none());
    }
}
