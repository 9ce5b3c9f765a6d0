#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid rule table: {0}")]
    InvalidRuleTable(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
