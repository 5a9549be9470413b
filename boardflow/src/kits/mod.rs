//! Built-in kits.

mod core;

pub use core::core_kit;
