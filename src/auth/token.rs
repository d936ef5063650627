//! Token secrets and the token values issued by the OAuth flows.

pub mod record;
pub mod secret;
