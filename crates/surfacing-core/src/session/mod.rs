//! Session domain module.
//!
//! - `model`: the session fields, the read-only [`SessionSnapshot`] and the
//!   derived [`SessionPhase`]
//! - `store`: [`SessionStore`], the only place session fields change

mod model;
mod store;

pub use model::{PendingPrompt, SessionPhase, SessionSnapshot, Visibility};
pub use store::SessionStore;
