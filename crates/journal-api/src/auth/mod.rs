//! JWT 인증.
//!
//! 토큰 발급은 외부 인증 서버가 담당하며, 이 크레이트는 검증만 수행합니다.

pub mod jwt;
pub mod middleware;

pub use jwt::{create_token, decode_token, Claims, JwtError};
pub use middleware::{JwtAuth, JwtAuthError, JwtConfig, OptionalJwtAuth};
