//! Access tokens, token sources, and the credentials provider consulted before every request.

pub mod credentials;
pub mod oauth;
pub mod source;
pub mod token;

pub use credentials::*;
pub use oauth::{ClientAuthMethod, RefreshTokenSource, RefreshTokenSourceBuilder};
pub use source::*;
pub use token::*;
