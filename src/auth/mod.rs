//! Authentication primitives: JWT issuance/validation, password hashing,
//! and the request-authentication middleware

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{AccessClaims, JwtService, RefreshClaims, TokenError, TokenPair};
pub use middleware::{jwt_auth_middleware, AuthContext};
pub use password::PasswordHasher;
