//! Core data types for the big-deal alert bot.

pub mod deal;
pub mod format;
pub mod threshold;
pub mod watermark;

pub use deal::*;
pub use format::*;
pub use threshold::*;
pub use watermark::*;
