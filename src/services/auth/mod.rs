pub mod access_jwt;
pub mod policy;
pub mod token_source;

pub use access_jwt::AuthService;
