//! Names and versions published in the API document and `/api/v1/version`.

pub const SOLUTION_NAME: &str = "CCG";
pub const API_VERSION: &str = "v1";
pub const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");
