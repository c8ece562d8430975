//! Utility functions shared by the library and the CLI.
//!
//! - **URL validation**: http(s)-only checks for feed and repository URLs

mod url_validator;

pub use url_validator::{is_remote_source, validate_url, UrlValidationError};
