//! HTTP Handlers

mod function;
mod openapi;
mod ping;

pub use function::*;
pub use openapi::*;
pub use ping::*;
