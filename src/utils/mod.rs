pub mod atomic_file;
pub mod scratch;
pub mod url_validation;

pub use url_validation::{UrlValidationError, validate_asset_url, validate_endpoint_url};
