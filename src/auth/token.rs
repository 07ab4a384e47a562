//! Grant values and redacted token secrets.

pub mod grant;
pub mod secret;
