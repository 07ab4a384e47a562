//! Auth-domain identifiers, scope sets, and grant models.

pub mod id;
pub mod scope;
pub mod token;

pub use id::*;
pub use scope::*;
pub use token::{grant::*, secret::*};
