//! Flow orchestrators built on the OAuth client, the API client, and a [`TokenStore`].
//!
//! Each flow operates on a store owned by the current request (web) or invocation (console),
//! so no flow takes locks or keeps state between calls.
//!
//! [`TokenStore`]: crate::store::TokenStore

pub mod authorize;
pub mod limits;
pub mod refresh;

pub use authorize::*;
pub use limits::*;
pub use refresh::*;
