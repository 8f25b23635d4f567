//! Signup hooks for the two ways an account gets created.
//!
//! - [`account`]: password signup. The form email is validated against the
//!   allowed domain and becomes the username.
//! - [`social`]: social login (Google and friends). Off-domain or missing emails
//!   send the user back to the login page with `invalid_domain=1`.
//!
//! Both take the username lookup as a closure so they stay storage-agnostic.

pub mod account;
pub mod social;
