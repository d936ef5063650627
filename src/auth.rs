//! Scope and token models shared by the OAuth flows and the dispatcher.

pub mod scope;
pub mod token;

pub use scope::*;
pub use token::{record::*, secret::*};
