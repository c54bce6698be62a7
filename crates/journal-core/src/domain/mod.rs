//! 저널 도메인 모델.
//!
//! 거래 기록, 매매법, 통계, 심리 진단 등 저널의 핵심 타입을 정의합니다.

pub mod calculations;
pub mod method;
pub mod psychology;
pub mod scoring;
pub mod statistics;
pub mod trade;

pub use calculations::*;
pub use method::*;
pub use psychology::*;
pub use scoring::*;
pub use statistics::*;
pub use trade::*;
