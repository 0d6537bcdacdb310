//! Portal authentication.
//!
//! Two independent roles sign in separately. [`SessionStore`] holds which
//! identity (if any) is bound to each role and persists every change through
//! a [`SessionBackend`]; [`IdentityService`] is the only component that
//! mutates it.

mod backend;
mod identity;
mod session;

pub use backend::{DbSessionBackend, MemorySessionBackend, SessionBackend};
pub use identity::{HrCredential, IdentityService, Registration};
pub use session::{Role, Session, SessionStore};
