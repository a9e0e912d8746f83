//! Command Handlers 实现

mod bundle_handlers;
mod invoke_handlers;

pub use bundle_handlers::*;
pub use invoke_handlers::*;
