//! Authentication and authorization for Greenway
//!
//! Provides:
//! - JWT token verification (identity arrives as bearer claims; token
//!   issuance lives in the identity provider, not here)
//! - The ordered account role hierarchy used for operation authorization

pub mod jwt;
pub mod roles;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenInput, TokenValidationResult};
pub use roles::{RequestedRole, Role};
