//! # Operator Prompt Port
//!
//! The one interactive touch point of a run: the pre-flight size
//! confirmation. Injected so tests and unattended runs can answer
//! without a terminal.

pub trait OperatorPrompt: Send + Sync {
    /// Asks the operator a yes/no question. Implementations must default
    /// to `false` on EOF or unreadable input.
    fn confirm(&self, question: &str) -> bool;
}

/// Prompt that always answers yes, for `--yes` runs.
pub struct AlwaysYes;

impl OperatorPrompt for AlwaysYes {
    fn confirm(&self, _question: &str) -> bool {
        true
    }
}
