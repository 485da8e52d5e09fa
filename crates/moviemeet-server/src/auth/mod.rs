mod jwt;
mod middleware;
mod password;

pub use jwt::{
    create_access_token, create_refresh_token, verify_token, Claims, IssuedToken, TokenKind,
};
pub use middleware::{auth_middleware, optional_auth_middleware, AuthUser};
pub use password::{hash_password, validate_password_strength, verify_password};
