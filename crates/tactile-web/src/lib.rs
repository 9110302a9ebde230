#![forbid(unsafe_code)]

//! Browser shell for Tactile.
//!
//! On `wasm32` the `start` export boots everything: it installs the console
//! logger and panic hook, builds a [`tactile_core::TactileEngine`] backed by
//! the web haptics bridge, wires pointer listeners on every `[data-zone]`
//! element, registers the offline worker, and starts the animation-frame
//! loop. Loaded inside the offline worker it does nothing, and the worker
//! script uses the `isSkipWaiting` and `staleCaches` exports instead. The
//! DOM-free pieces ([`console`], [`shell`]) also build natively so they can
//! be tested without a browser.

pub mod console;
pub mod shell;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{is_skip_waiting, stale_caches, start};
