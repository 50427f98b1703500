//! Shared domain types for the Facemark attendance client.

pub mod activity;
pub mod capture;
pub mod config;
pub mod outcome;
pub mod records;
pub mod ui;

mod errors;

pub use errors::{FacemarkError, Result};
