//! Serialization collaborators.

pub mod graphml;

pub use graphml::{load_from_file, save_to_file, GraphMlError, GraphMlResult};
