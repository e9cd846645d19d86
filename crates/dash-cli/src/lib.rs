//! CLI library components for the analytics dashboard.

pub mod logging;
pub mod render;
