//! 심리 진단 채점 엔진.
//!
//! 제출된 응답을 문항 세트와 대조하여 총점, 카테고리별 점수,
//! 분석 메시지, 개선 권고를 계산합니다.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::warn;

use super::psychology::{AssessmentCategory, AssessmentQuestion, SubmittedAnswer};

/// 합격 기준 점수 (0~100 척도).
pub const PASS_THRESHOLD: i32 = 60;

/// 채점 실패 원인.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoringError {
    /// 채점할 응답이 하나도 없음
    #[error("채점할 응답이 없습니다")]
    NoAnswers,

    /// 선택지 인덱스가 문항의 선택지 범위를 벗어남
    #[error("문항 {question_id}의 선택지 인덱스 {index}가 범위를 벗어났습니다 (선택지 {available}개)")]
    AnswerIndexOutOfRange {
        /// 문항 ID
        question_id: String,
        /// 제출된 인덱스
        index: usize,
        /// 해당 문항의 선택지 개수
        available: usize,
    },
}

/// 채점 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct ScoredAssessment {
    /// 총점 (0~100, 응답한 전체 문항 점수의 평균)
    pub total_score: i32,
    /// 카테고리별 점수 (응답이 있었던 카테고리만 포함)
    pub category_scores: BTreeMap<AssessmentCategory, i32>,
    /// 종합 분석 메시지
    pub analysis: String,
    /// 개선 권고 목록
    pub recommendations: Vec<String>,
}

impl ScoredAssessment {
    /// 합격 기준 충족 여부.
    pub fn meets_threshold(&self) -> bool {
        self.total_score >= PASS_THRESHOLD
    }
}

/// 제출된 응답을 채점합니다.
///
/// 알 수 없는 문항 ID는 경고 로그를 남기고 건너뜁니다 (클라이언트와
/// 서버의 문항 세트 버전이 다를 수 있음). 선택지 인덱스가 범위를
/// 벗어나면 즉시 실패합니다.
///
/// # Errors
///
/// - 응답이 비어 있거나 유효한 응답이 하나도 없으면 `NoAnswers`
/// - 선택지 인덱스가 범위를 벗어나면 `AnswerIndexOutOfRange`
pub fn score_assessment(
    answers: &[SubmittedAnswer],
    questions: &[AssessmentQuestion],
) -> Result<ScoredAssessment, ScoringError> {
    if answers.is_empty() {
        return Err(ScoringError::NoAnswers);
    }

    let by_id: HashMap<&str, &AssessmentQuestion> =
        questions.iter().map(|q| (q.id.as_str(), q)).collect();

    let mut all_scores: Vec<i32> = Vec::new();
    let mut category_buckets: BTreeMap<AssessmentCategory, Vec<i32>> = BTreeMap::new();

    for answer in answers {
        let Some(question) = by_id.get(answer.question_id.as_str()) else {
            warn!(question_id = %answer.question_id, "알 수 없는 문항 ID, 응답을 건너뜁니다");
            continue;
        };

        let Some(option) = question.options.get(answer.answer_index) else {
            return Err(ScoringError::AnswerIndexOutOfRange {
                question_id: answer.question_id.clone(),
                index: answer.answer_index,
                available: question.options.len(),
            });
        };

        all_scores.push(option.score);
        category_buckets
            .entry(question.category)
            .or_default()
            .push(option.score);
    }

    // 모든 응답이 알 수 없는 문항이었던 경우
    if all_scores.is_empty() {
        return Err(ScoringError::NoAnswers);
    }

    let total_score = rounded_mean(&all_scores);
    let category_scores: BTreeMap<AssessmentCategory, i32> = category_buckets
        .iter()
        .map(|(category, scores)| (*category, rounded_mean(scores)))
        .collect();

    let low_categories: Vec<AssessmentCategory> = category_scores
        .iter()
        .filter(|(_, score)| **score < PASS_THRESHOLD)
        .map(|(category, _)| *category)
        .collect();

    let analysis = build_analysis(&low_categories);
    let recommendations = build_recommendations(&low_categories);

    Ok(ScoredAssessment {
        total_score,
        category_scores,
        analysis,
        recommendations,
    })
}

/// 정수 점수의 반올림 평균.
fn rounded_mean(scores: &[i32]) -> i32 {
    if scores.is_empty() {
        return 0;
    }
    let sum: i64 = scores.iter().map(|s| *s as i64).sum();
    let mean = Decimal::from(sum) / Decimal::from(scores.len() as i64);
    mean.round().to_i32().unwrap_or(0)
}

/// 취약 카테고리별 고정 문장을 선언 순서대로 이어 붙입니다.
fn build_analysis(low_categories: &[AssessmentCategory]) -> String {
    if low_categories.is_empty() {
        return "모든 영역에서 안정적인 트레이딩 심리를 유지하고 있습니다.".to_string();
    }

    low_categories
        .iter()
        .map(|category| category.low_score_comment())
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_recommendations(low_categories: &[AssessmentCategory]) -> Vec<String> {
    if low_categories.is_empty() {
        return vec!["현재 수준을 유지하세요. 정기적인 재진단으로 변화를 추적하세요".to_string()];
    }

    low_categories
        .iter()
        .flat_map(|category| {
            category
                .recommendations()
                .iter()
                .map(|r| (*r).to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::psychology::{default_question_set, AnswerOption};

    fn question(id: &str, category: AssessmentCategory, scores: &[i32]) -> AssessmentQuestion {
        AssessmentQuestion {
            id: id.to_string(),
            category,
            text: format!("{} 문항", id),
            options: scores
                .iter()
                .map(|s| AnswerOption {
                    text: format!("선택지 {}", s),
                    score: *s,
                })
                .collect(),
        }
    }

    fn answer(question_id: &str, index: usize) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: question_id.to_string(),
            answer_index: index,
        }
    }

    #[test]
    fn test_empty_answers_rejected() {
        let questions = default_question_set();
        let err = score_assessment(&[], &questions).unwrap_err();
        assert_eq!(err, ScoringError::NoAnswers);
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let questions = vec![question(
            "q1",
            AssessmentCategory::RiskManagement,
            &[0, 50, 100],
        )];

        let err = score_assessment(&[answer("q1", 3)], &questions).unwrap_err();
        assert_eq!(
            err,
            ScoringError::AnswerIndexOutOfRange {
                question_id: "q1".to_string(),
                index: 3,
                available: 3,
            }
        );
    }

    #[test]
    fn test_unknown_question_skipped() {
        let questions = vec![question(
            "q1",
            AssessmentCategory::RiskManagement,
            &[0, 100],
        )];

        let answers = vec![answer("q1", 1), answer("ghost", 0)];
        let result = score_assessment(&answers, &questions).unwrap();

        // 알 수 없는 문항은 제외하고 채점
        assert_eq!(result.total_score, 100);
        assert_eq!(result.category_scores.len(), 1);
    }

    #[test]
    fn test_all_answers_unknown_is_error() {
        let questions = vec![question("q1", AssessmentCategory::Discipline, &[0, 100])];

        let err = score_assessment(&[answer("ghost", 0)], &questions).unwrap_err();
        assert_eq!(err, ScoringError::NoAnswers);
    }

    #[test]
    fn test_category_and_total_averages() {
        let questions = vec![
            question("rm1", AssessmentCategory::RiskManagement, &[0, 100]),
            question("rm2", AssessmentCategory::RiskManagement, &[0, 100]),
            question("ec1", AssessmentCategory::EmotionalControl, &[0, 40, 100]),
        ];

        let answers = vec![answer("rm1", 1), answer("rm2", 0), answer("ec1", 1)];
        let result = score_assessment(&answers, &questions).unwrap();

        // 카테고리 평균: 리스크 관리 (100+0)/2 = 50, 감정 통제 40
        assert_eq!(
            result.category_scores[&AssessmentCategory::RiskManagement],
            50
        );
        assert_eq!(
            result.category_scores[&AssessmentCategory::EmotionalControl],
            40
        );

        // 총점: (100+0+40)/3 = 46.67 → 47
        assert_eq!(result.total_score, 47);
        assert!(!result.meets_threshold());
    }

    #[test]
    fn test_low_categories_drive_recommendations() {
        let questions = vec![
            question("rm1", AssessmentCategory::RiskManagement, &[0, 100]),
            question("ec1", AssessmentCategory::EmotionalControl, &[0, 100]),
        ];

        // 리스크 관리 0점 (취약), 감정 통제 100점
        let answers = vec![answer("rm1", 0), answer("ec1", 1)];
        let result = score_assessment(&answers, &questions).unwrap();

        let rm_recs = AssessmentCategory::RiskManagement.recommendations();
        assert_eq!(result.recommendations.len(), rm_recs.len());
        assert!(result.analysis.contains("리스크 관리"));
        // 양호한 카테고리의 권고는 포함되지 않음
        for rec in &result.recommendations {
            assert!(rm_recs.contains(&rec.as_str()));
        }
    }

    #[test]
    fn test_no_low_categories_default_message() {
        let questions = vec![question("rm1", AssessmentCategory::RiskManagement, &[0, 100])];

        let result = score_assessment(&[answer("rm1", 1)], &questions).unwrap();

        assert_eq!(result.total_score, 100);
        assert!(result.meets_threshold());
        assert_eq!(result.recommendations.len(), 1);
        assert!(result.recommendations[0].contains("유지"));
    }

    // 분석문은 취약 카테고리별 고정 문장을 선언 순서대로 이어 붙인다
    #[test]
    fn test_analysis_concatenates_fixed_sentences_in_order() {
        let questions = vec![
            question("si1", AssessmentCategory::SelfImprovement, &[0, 100]),
            question("rm1", AssessmentCategory::RiskManagement, &[0, 100]),
            question("dc1", AssessmentCategory::Discipline, &[0, 100]),
        ];

        // 제출 순서와 무관하게 카테고리 선언 순서로 조합
        let answers = vec![answer("si1", 0), answer("rm1", 0), answer("dc1", 0)];
        let result = score_assessment(&answers, &questions).unwrap();

        let expected = [
            AssessmentCategory::RiskManagement.low_score_comment(),
            AssessmentCategory::Discipline.low_score_comment(),
            AssessmentCategory::SelfImprovement.low_score_comment(),
        ]
        .join(" ");
        assert_eq!(result.analysis, expected);
    }

    #[test]
    fn test_analysis_positive_sentence_when_no_low_category() {
        let questions = vec![question("rm1", AssessmentCategory::RiskManagement, &[0, 100])];

        let result = score_assessment(&[answer("rm1", 1)], &questions).unwrap();

        assert!(result.analysis.contains("안정적인"));
    }

    #[test]
    fn test_full_default_set_all_max() {
        let questions = default_question_set();
        let answers: Vec<SubmittedAnswer> = questions
            .iter()
            .map(|q| answer(&q.id, q.options.len() - 1))
            .collect();

        let result = score_assessment(&answers, &questions).unwrap();

        assert_eq!(result.total_score, 100);
        assert_eq!(result.category_scores.len(), 6);
        for score in result.category_scores.values() {
            assert_eq!(*score, 100);
        }
    }
}
