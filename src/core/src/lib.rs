//! Notification auto-expansion logic for the SystemUI process.
//!
//! Host objects are reached only through the traits in [`reflect`]; the
//! JNI bridge provides the on-device implementation.

pub mod capability;
pub mod clock;
pub mod collapse;
pub mod config;
pub mod gate;
pub mod gesture;
pub mod hooks;
pub mod identity;
pub mod marker;
pub mod reflect;

#[cfg(test)]
mod testing;

pub use clock::{Clock, SystemClock};
pub use config::Feature;
pub use hooks::{HookContext, HookId, Phase};
