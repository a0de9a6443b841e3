//! Bot module - Core bot functionality.

pub mod dispatcher;
mod runtime;
pub mod webhook;

pub use dispatcher::{build_dispatcher, AppState, ThrottledBot};
pub use runtime::run;
