//! 트레이딩 심리 진단.
//!
//! 이 모듈은 심리 진단 관련 타입을 정의합니다:
//! - `AssessmentCategory` - 진단 카테고리 (리스크 관리, 감정 통제 등)
//! - `AssessmentQuestion` / `AnswerOption` - 문항과 선택지
//! - `SubmittedAnswer` - 사용자가 제출한 응답
//! - `AssessmentResult` - 저장되는 진단 결과

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::JournalError;

/// 심리 진단 카테고리.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum AssessmentCategory {
    /// 리스크 관리
    RiskManagement,
    /// 감정 통제
    EmotionalControl,
    /// 원칙 준수
    Discipline,
    /// 매매 준비
    TradingPreparation,
    /// 트레이딩 마인드셋
    TradingMindset,
    /// 자기 개선
    SelfImprovement,
}

impl AssessmentCategory {
    /// 전체 카테고리 목록 (고정 순서).
    pub fn all() -> [AssessmentCategory; 6] {
        [
            AssessmentCategory::RiskManagement,
            AssessmentCategory::EmotionalControl,
            AssessmentCategory::Discipline,
            AssessmentCategory::TradingPreparation,
            AssessmentCategory::TradingMindset,
            AssessmentCategory::SelfImprovement,
        ]
    }

    /// 문자열 표현을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentCategory::RiskManagement => "risk_management",
            AssessmentCategory::EmotionalControl => "emotional_control",
            AssessmentCategory::Discipline => "discipline",
            AssessmentCategory::TradingPreparation => "trading_preparation",
            AssessmentCategory::TradingMindset => "trading_mindset",
            AssessmentCategory::SelfImprovement => "self_improvement",
        }
    }

    /// 사용자에게 표시할 한글 이름.
    pub fn label(&self) -> &'static str {
        match self {
            AssessmentCategory::RiskManagement => "리스크 관리",
            AssessmentCategory::EmotionalControl => "감정 통제",
            AssessmentCategory::Discipline => "원칙 준수",
            AssessmentCategory::TradingPreparation => "매매 준비",
            AssessmentCategory::TradingMindset => "트레이딩 마인드셋",
            AssessmentCategory::SelfImprovement => "자기 개선",
        }
    }

    /// 카테고리 점수가 낮을 때 분석문에 들어갈 고정 문장.
    pub fn low_score_comment(&self) -> &'static str {
        match self {
            AssessmentCategory::RiskManagement => {
                "리스크 관리가 취약하여 한 번의 손실이 계좌에 큰 타격을 줄 수 있습니다."
            }
            AssessmentCategory::EmotionalControl => {
                "감정 통제가 부족하여 손실 후 충동적인 매매로 이어질 위험이 있습니다."
            }
            AssessmentCategory::Discipline => {
                "원칙 준수가 약해 세운 규칙과 실제 매매가 어긋나고 있습니다."
            }
            AssessmentCategory::TradingPreparation => {
                "매매 준비가 부족하여 계획 없이 시장 상황에 끌려가기 쉽습니다."
            }
            AssessmentCategory::TradingMindset => {
                "트레이딩 마인드셋이 단기 손익에 치우쳐 장기 기대값을 놓치고 있습니다."
            }
            AssessmentCategory::SelfImprovement => {
                "자기 개선 활동이 부족하여 같은 실수가 반복될 가능성이 높습니다."
            }
        }
    }

    /// 카테고리 점수가 낮을 때 제시할 개선 권고 목록.
    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            AssessmentCategory::RiskManagement => &[
                "거래당 손실 한도를 계좌의 1~2% 이내로 정하고 기록하세요",
                "진입 전에 손절 가격을 먼저 정하는 습관을 들이세요",
                "포지션 크기를 변동성에 맞춰 조절하는 규칙을 만드세요",
            ],
            AssessmentCategory::EmotionalControl => &[
                "연속 손실 후에는 정해진 휴식 시간을 가지세요",
                "거래 중 느낀 감정을 저널에 함께 기록하세요",
                "손실 복구를 위한 충동적 재진입(복수 매매)을 경계하세요",
            ],
            AssessmentCategory::Discipline => &[
                "매매법의 진입/청산 규칙을 체크리스트로 만들어 매 거래마다 확인하세요",
                "규칙을 어긴 거래는 수익 여부와 관계없이 위반으로 기록하세요",
            ],
            AssessmentCategory::TradingPreparation => &[
                "장 시작 전 시나리오(상승/하락/횡보)별 대응 계획을 작성하세요",
                "주요 경제 지표 발표 일정을 미리 확인하세요",
                "전일 거래 복기를 다음 거래 준비의 첫 단계로 삼으세요",
            ],
            AssessmentCategory::TradingMindset => &[
                "개별 거래의 손익보다 장기 기대값에 집중하세요",
                "손실은 비용이라는 관점으로 받아들이는 연습을 하세요",
            ],
            AssessmentCategory::SelfImprovement => &[
                "주 단위로 거래 통계를 복기하고 반복되는 실수를 찾아보세요",
                "매매법을 정기적으로 검증하고 기록으로 개선하세요",
            ],
        }
    }
}

impl std::fmt::Display for AssessmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AssessmentCategory {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "risk_management" => Ok(AssessmentCategory::RiskManagement),
            "emotional_control" => Ok(AssessmentCategory::EmotionalControl),
            "discipline" => Ok(AssessmentCategory::Discipline),
            "trading_preparation" => Ok(AssessmentCategory::TradingPreparation),
            "trading_mindset" => Ok(AssessmentCategory::TradingMindset),
            "self_improvement" => Ok(AssessmentCategory::SelfImprovement),
            other => Err(JournalError::InvalidInput(format!(
                "알 수 없는 진단 카테고리: {}",
                other
            ))),
        }
    }
}

/// 문항의 선택지.
///
/// `score` 는 0~100 정규화 척도입니다. 0~5 가중치로 작성된 문항은
/// 적재 시 20을 곱해 정규화합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct AnswerOption {
    /// 선택지 문구
    pub text: String,
    /// 선택지 점수 (0~100)
    pub score: i32,
}

impl AnswerOption {
    /// 0~5 가중치를 0~100 척도로 정규화하여 선택지를 생성합니다.
    pub fn from_weight(text: impl Into<String>, weight: i32) -> Self {
        Self {
            text: text.into(),
            score: weight * 20,
        }
    }
}

/// 심리 진단 문항.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct AssessmentQuestion {
    /// 문항 ID (예: "risk_management_1")
    pub id: String,
    /// 소속 카테고리
    pub category: AssessmentCategory,
    /// 문항 내용
    pub text: String,
    /// 선택지 목록
    pub options: Vec<AnswerOption>,
}

/// 사용자가 제출한 개별 응답.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct SubmittedAnswer {
    /// 응답한 문항 ID
    pub question_id: String,
    /// 선택한 선택지 인덱스 (0부터 시작)
    pub answer_index: usize,
}

/// 저장되는 심리 진단 결과.
///
/// 결과는 추가 전용(append-only)으로 기록되어 시간에 따른 변화를
/// 추적할 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct AssessmentResult {
    /// 결과 ID
    pub id: Uuid,
    /// 소유자 사용자 ID
    pub user_id: Uuid,
    /// 총점 (0~100)
    pub total_score: i32,
    /// 카테고리별 점수 (0~100)
    pub category_scores: BTreeMap<AssessmentCategory, i32>,
    /// 종합 분석 메시지
    pub analysis: String,
    /// 개선 권고 목록
    pub recommendations: Vec<String>,
    /// 진단 시각
    pub taken_at: DateTime<Utc>,
}

/// 기본 문항 세트.
///
/// 카테고리당 3문항, 선택지는 0~5 가중치를 0~100 척도로 정규화합니다.
pub fn default_question_set() -> Vec<AssessmentQuestion> {
    let mut questions = Vec::new();

    let frequency_options = || {
        vec![
            AnswerOption::from_weight("전혀 아니다", 0),
            AnswerOption::from_weight("거의 아니다", 1),
            AnswerOption::from_weight("가끔 그렇다", 2),
            AnswerOption::from_weight("자주 그렇다", 3),
            AnswerOption::from_weight("대부분 그렇다", 4),
            AnswerOption::from_weight("항상 그렇다", 5),
        ]
    };

    let texts: [(AssessmentCategory, [&str; 3]); 6] = [
        (
            AssessmentCategory::RiskManagement,
            [
                "진입 전에 거래당 최대 손실 금액을 정한다",
                "손절 가격에 도달하면 망설이지 않고 청산한다",
                "포지션 크기를 계좌 대비 일정 비율 이내로 유지한다",
            ],
        ),
        (
            AssessmentCategory::EmotionalControl,
            [
                "손실 후에도 계획한 대로 다음 거래를 진행한다",
                "수익이 나도 흥분하지 않고 규칙대로 청산한다",
                "손실을 복구하려는 충동적 매매를 하지 않는다",
            ],
        ),
        (
            AssessmentCategory::Discipline,
            [
                "정한 매매 규칙을 거래마다 동일하게 적용한다",
                "규칙에 맞지 않는 기회는 아무리 좋아 보여도 넘긴다",
                "거래 후 규칙 준수 여부를 점검한다",
            ],
        ),
        (
            AssessmentCategory::TradingPreparation,
            [
                "장 시작 전 당일 시나리오를 작성한다",
                "주요 경제 일정과 뉴스를 미리 확인한다",
                "전일 거래를 복기한 후 새 거래를 시작한다",
            ],
        ),
        (
            AssessmentCategory::TradingMindset,
            [
                "개별 거래보다 장기 성과에 집중한다",
                "손실을 트레이딩의 비용으로 받아들인다",
                "시장을 예측하기보다 대응한다는 자세를 유지한다",
            ],
        ),
        (
            AssessmentCategory::SelfImprovement,
            [
                "거래 기록을 꾸준히 작성한다",
                "주기적으로 통계를 확인하고 약점을 찾는다",
                "매매법을 검증하고 개선한다",
            ],
        ),
    ];

    for (category, items) in texts {
        for (idx, text) in items.iter().enumerate() {
            questions.push(AssessmentQuestion {
                id: format!("{}_{}", category.as_str(), idx + 1),
                category,
                text: (*text).to_string(),
                options: frequency_options(),
            });
        }
    }

    questions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for category in AssessmentCategory::all() {
            let parsed: AssessmentCategory = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert!("unknown".parse::<AssessmentCategory>().is_err());
    }

    #[test]
    fn test_weight_normalization() {
        let option = AnswerOption::from_weight("항상 그렇다", 5);
        assert_eq!(option.score, 100);

        let option = AnswerOption::from_weight("전혀 아니다", 0);
        assert_eq!(option.score, 0);
    }

    #[test]
    fn test_default_question_set_shape() {
        let questions = default_question_set();

        // 카테고리당 3문항
        assert_eq!(questions.len(), 18);

        for category in AssessmentCategory::all() {
            let count = questions.iter().filter(|q| q.category == category).count();
            assert_eq!(count, 3, "category {} question count", category);
        }

        // 모든 선택지 점수는 0~100 범위
        for question in &questions {
            assert!(!question.options.is_empty());
            for option in &question.options {
                assert!((0..=100).contains(&option.score));
            }
        }
    }

    #[test]
    fn test_every_category_has_recommendations() {
        for category in AssessmentCategory::all() {
            let recs = category.recommendations();
            assert!(
                (2..=3).contains(&recs.len()),
                "category {} recommendation count",
                category
            );
        }
    }
}
