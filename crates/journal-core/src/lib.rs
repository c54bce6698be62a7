//! # Journal Core
//!
//! 트레이딩 저널의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 저널 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 거래 기록 및 라이프사이클 (진입 → 청산)
//! - 매매 기법(method) 정의
//! - 거래 통계 계산
//! - 트레이딩 심리 자가진단 채점
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
