//! HTTP protocol layer module
//!
//! Protocol-level helpers shared by the API and the static file responder.

pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_404_response, build_405_response, build_413_response, build_file_response,
    build_options_response,
};
