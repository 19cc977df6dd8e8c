//! Theme definitions and per-element classification.

mod themes;

pub use themes::{GeomType, Mapping, Theme};
