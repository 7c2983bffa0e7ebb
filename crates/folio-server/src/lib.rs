//! HTTP surface over the content store
//!
//! Two route groups:
//! - `/content`: bearer-authorized admin API (read, replace, patch) with
//!   a CORS preflight responder
//! - `/session`: public per-visitor view keyed by access code
//!
//! Handlers are thin adapters over [`folio_store::ContentStore`]; all
//! policy (validation, backups, rotation) lives there.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{router, AppState, PatchRequest, ServerConfig};
