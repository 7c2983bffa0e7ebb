//! Guided-input conversation flows
//!
//! Case studies are created and edited through a linear prompt-per-field
//! dialog. This crate holds the two pieces behind that dialog:
//! - [`Conversation`]: the per-user state machine that consumes one
//!   message at a time and either advances, rejects, or completes with a
//!   finished [`folio_content::CaseRecord`]
//! - [`SessionStore`]: the keyed store of active conversations, injected
//!   into message handlers instead of living as module-global state
//!
//! The flows do no I/O: the caller supplies the current document for the
//! duplicate-id check and persists the record on completion.

mod error;
mod flow;
mod session;

pub use error::FlowError;
pub use flow::{
    Conversation, FlowKind, FlowOutcome, Step, CANCEL_COMMAND, KEEP_COMMAND, SKIP_COMMAND,
};
pub use session::{InMemorySessions, SessionStore, UserId, INACTIVITY_WINDOW};
