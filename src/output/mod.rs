//! Output module for reporting on harvested data
//!
//! This module handles loading and printing statistics about the categories
//! and products stored in the database.

pub mod stats;

pub use stats::{load_statistics, print_statistics, print_summary, CatalogStatistics};
