//! Configuration file parsing
//!
//! - [`pipeline`] - the `shipyard.yml` pipeline file

pub mod pipeline;
