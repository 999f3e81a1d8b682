//! In-memory state of the relying party
//!
//! - [`store`] - Per-browser sessions keyed by the session cookie value
//! - [`pending`] - Login attempts awaiting their callback, keyed by `state`
//!
//! Both live only for the lifetime of the process.

pub mod pending;
pub mod store;

pub use pending::{PendingAuthorization, PendingAuthorizations};
pub use store::{Session, SessionHandle, SessionStore};
