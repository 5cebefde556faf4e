mod cart;
mod passwords;

pub use cart::canonical_cart;
pub use passwords::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
