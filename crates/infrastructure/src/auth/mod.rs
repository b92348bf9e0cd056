mod jwt;

pub use jwt::{Claims, JwtAuthenticator};
