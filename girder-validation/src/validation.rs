// Per-request validation sink

use crate::{ValidationError, ValidationErrors};
use parking_lot::Mutex;
use std::sync::Arc;

/// Collects the violations found while binding one request.
///
/// Cloning yields another handle to the same sink.
#[derive(Debug, Clone, Default)]
pub struct Validation {
    errors: Arc<Mutex<ValidationErrors>>,
}

impl Validation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_violation(&self, error: ValidationError) {
        self.errors.lock().add(error);
    }

    /// Record a free-form message against `field`.
    pub fn add_field_violation(&self, field: impl Into<String>, message: impl Into<String>) {
        self.add_violation(ValidationError::new(field, message));
    }

    pub fn has_violations(&self) -> bool {
        !self.errors.lock().is_empty()
    }

    pub fn has_field_violation(&self, field: &str) -> bool {
        self.errors.lock().errors.iter().any(|e| e.field == field)
    }

    pub fn field_violations(&self, field: &str) -> Vec<ValidationError> {
        self.errors
            .lock()
            .get_field_errors(field)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Snapshot of everything recorded so far.
    pub fn violations(&self) -> ValidationErrors {
        self.errors.lock().clone()
    }

    /// Fail with all recorded violations, if there are any.
    pub fn ensure_valid(&self) -> Result<(), ValidationErrors> {
        let errors = self.violations();
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
