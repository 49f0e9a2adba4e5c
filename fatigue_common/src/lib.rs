//! Fatigue Common Library
//!
//! Shared models for the fatigue workspace: the load-class quantizer,
//! the Wöhler (S–N) damage model, the Haigh mean-stress amplitude
//! transform, count-configuration flags, error types, and the TOML
//! configuration layer.
//!
//! # Module Structure
//!
//! - [`class`] - Load-class quantizer
//! - [`wohler`] - Wöhler curve and per-cycle damage
//! - [`haigh`] - Mean-stress amplitude transformation
//! - [`flags`] - Count-configuration bitflags
//! - [`methods`] - Algorithm selection enums
//! - [`config`] - TOML configuration loading and validation
//! - [`consts`] - Numeric limits and count units
//! - [`error`] - Engine error type
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! Add to your `Cargo.toml` with alias for shorter imports:
//! ```toml
//! [dependencies]
//! fatigue = { package = "fatigue_common", path = "../fatigue_common" }
//! ```

pub mod class;
pub mod config;
pub mod consts;
pub mod error;
pub mod flags;
pub mod haigh;
pub mod methods;
pub mod prelude;
pub mod wohler;
