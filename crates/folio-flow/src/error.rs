//! Error types for conversation flows

/// Errors raised by the session store
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FlowError {
    /// The user already has a conversation in progress
    #[error("a guided dialog is already active; finish it or send /cancel first")]
    AlreadyActive,
}
