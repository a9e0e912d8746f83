//! Query Handlers 实现

mod bundle_handlers;

pub use bundle_handlers::*;
