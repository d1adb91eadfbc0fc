//! Auth-domain identifiers, authorization codes, and token models.

pub mod code;
pub mod id;
pub mod token;

pub use code::*;
pub use id::*;
pub use token::{record::*, secret::*};
