//! Authentication collaborator.
//!
//! The front proxy trusts an upstream component to authenticate callers; this
//! module turns what that component asserts into an [`AuthenticatedUser`]
//! request extension and derives the rate-limit [`Identity`] from it.

mod header;
mod identity;

pub use header::HeaderAuthenticator;
pub use identity::{AuthenticatedUser, Identity};
