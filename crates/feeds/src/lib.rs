//! Big-deal feed collection.
//!
//! ## Architecture
//!
//! - `rest` - HTTP client for the big-deal endpoint and response decoding
//! - `cycle` - one fetch → dedup → filter → format pass
//! - `error` - feed error taxonomy

pub mod cycle;
pub mod error;
pub mod rest;

pub use cycle::*;
pub use error::*;
pub use rest::*;
