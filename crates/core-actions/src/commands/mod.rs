//! Command implementations, grouped by what they touch.

pub mod complete;
pub mod edit;
pub mod mode;
pub mod motion;
pub mod operator;
