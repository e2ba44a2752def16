pub mod token_manager;

pub use token_manager::{DEFAULT_TOKEN_VARIABLE, SecureTokenManager};
