//! Language-specific items.

pub mod jpn;
