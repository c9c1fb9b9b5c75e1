use std::fmt;

/// Field-scoped rejection of a form submission. Carried through `anyhow` and
/// downcast at the HTTP boundary to pick the client-error status.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: &'static str,
    pub detail: String,
}

impl ValidationError {
    pub fn new(field: &'static str, detail: impl Into<String>) -> Self {
        Self {
            field,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.detail)
    }
}

impl std::error::Error for ValidationError {}
