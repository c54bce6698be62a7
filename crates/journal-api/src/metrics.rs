//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭과 매매일지 비즈니스 메트릭을 수집하고
//! `/metrics` 엔드포인트로 노출합니다.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Prometheus 메트릭 레코더를 설정하고 핸들을 반환합니다.
///
/// # 패닉
///
/// 레코더가 이미 설치되어 있으면 패닉합니다.
pub fn setup_metrics_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        // HTTP 요청 지속 시간 히스토그램 버킷 설정
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )
        .expect("히스토그램 버킷 설정 실패")
        .install_recorder()
        .expect("Prometheus 레코더 설치 실패")
}

// ============================================================================
// HTTP 메트릭 헬퍼 함수
// ============================================================================

/// HTTP 요청 카운터 증가.
pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

/// HTTP 응답 카운터 증가.
pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// HTTP 요청 지속 시간 기록.
pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

// ============================================================================
// 비즈니스 메트릭 헬퍼 함수
// ============================================================================

/// 거래 기록 카운터 증가.
pub fn record_trade_created(side: &str) {
    counter!("journal_trades_created_total", "side" => side.to_string()).increment(1);
}

/// 거래 청산 카운터 증가.
pub fn record_trade_closed(outcome: &str) {
    counter!("journal_trades_closed_total", "outcome" => outcome.to_string()).increment(1);
}

/// 심리 테스트 제출 카운터 증가.
pub fn record_assessment_submitted(passed: bool) {
    counter!(
        "journal_assessments_total",
        "passed" => passed.to_string()
    )
    .increment(1);
}

/// AI 분석 요청 카운터 증가.
pub fn record_ai_analysis(status: &str) {
    counter!("journal_ai_analysis_total", "status" => status.to_string()).increment(1);
}

// ============================================================================
// 경로 정규화 유틸리티
// ============================================================================

/// 경로에서 동적 파라미터를 정규화합니다.
///
/// 예: `/trades/123e4567-e89b-12d3-a456-426614174000` → `/trades/:id`
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let normalized: Vec<String> = segments
        .iter()
        .map(|segment| {
            // UUID 패턴 또는 숫자만 있는 경우 :id로 대체
            let is_uuid = segment.len() == 36 && segment.chars().filter(|c| *c == '-').count() == 4;
            let is_numeric = !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit());

            if is_uuid || is_numeric {
                ":id".to_string()
            } else {
                (*segment).to_string()
            }
        })
        .collect();
    normalized.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/trades/123e4567-e89b-12d3-a456-426614174000";
        assert_eq!(normalize_path(path), "/api/v1/trades/:id");
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/trades/12345";
        assert_eq!(normalize_path(path), "/api/v1/trades/:id");
    }

    #[test]
    fn test_normalize_path_no_params() {
        let path = "/api/v1/methods";
        assert_eq!(normalize_path(path), "/api/v1/methods");
    }

    #[test]
    fn test_normalize_path_mixed() {
        let path = "/api/v1/trades/123e4567-e89b-12d3-a456-426614174000/close";
        assert_eq!(normalize_path(path), "/api/v1/trades/:id/close");
    }
}
