//! 심리 테스트 저장소.
//!
//! 문항(assessment_questions)과 결과(assessment_results)를 관리합니다.
//! 결과는 append-only로 저장하여 심리 변화 추이를 추적할 수 있습니다.

use chrono::{DateTime, Utc};
use journal_core::{
    AssessmentCategory, AssessmentQuestion, AssessmentResult, JournalError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

/// 심리 테스트 문항 레코드.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionRecord {
    pub id: String,
    pub category: String,
    pub text: String,
    /// 선택지 배열 (JSONB)
    pub options: Value,
    pub sort_order: i32,
}

impl TryFrom<QuestionRecord> for AssessmentQuestion {
    type Error = JournalError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        Ok(AssessmentQuestion {
            id: record.id,
            category: AssessmentCategory::from_str(&record.category)?,
            text: record.text,
            options: serde_json::from_value(record.options)?,
        })
    }
}

/// 심리 테스트 결과 레코드.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssessmentResultRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_score: i32,
    /// 카테고리별 점수 (JSONB)
    pub category_scores: Value,
    pub analysis: String,
    /// 추천 행동 목록 (JSONB)
    pub recommendations: Value,
    pub taken_at: DateTime<Utc>,
}

impl TryFrom<AssessmentResultRecord> for AssessmentResult {
    type Error = JournalError;

    fn try_from(record: AssessmentResultRecord) -> Result<Self, Self::Error> {
        let category_scores: BTreeMap<AssessmentCategory, i32> =
            serde_json::from_value(record.category_scores)?;
        let recommendations: Vec<String> = serde_json::from_value(record.recommendations)?;

        Ok(AssessmentResult {
            id: record.id,
            user_id: record.user_id,
            total_score: record.total_score,
            category_scores,
            analysis: record.analysis,
            recommendations,
            taken_at: record.taken_at,
        })
    }
}

/// 심리 테스트 결과 저장 입력.
#[derive(Debug, Clone)]
pub struct AssessmentResultInput {
    pub user_id: Uuid,
    pub total_score: i32,
    pub category_scores: BTreeMap<AssessmentCategory, i32>,
    pub analysis: String,
    pub recommendations: Vec<String>,
}

/// 심리 테스트 저장소.
pub struct PsychologyRepository;

impl PsychologyRepository {
    /// 문항 수 조회.
    pub async fn count_questions(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM assessment_questions")
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// 기본 문항 세트를 DB에 시딩합니다.
    ///
    /// 서버 기동 시 호출되며, 문항 테이블이 비어 있을 때만 삽입합니다.
    /// 운영 중 수정된 문항을 덮어쓰지 않습니다.
    pub async fn seed_questions(
        pool: &PgPool,
        questions: &[AssessmentQuestion],
    ) -> Result<u64, JournalError> {
        if Self::count_questions(pool).await? > 0 {
            return Ok(0);
        }

        let mut seeded = 0;

        for (order, question) in questions.iter().enumerate() {
            let options = serde_json::to_value(&question.options)?;

            sqlx::query(
                r#"
                INSERT INTO assessment_questions (id, category, text, options, sort_order)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(&question.id)
            .bind(question.category.as_str())
            .bind(&question.text)
            .bind(options)
            .bind(order as i32)
            .execute(pool)
            .await?;

            seeded += 1;
        }

        Ok(seeded)
    }

    /// 전체 문항 조회 (표시 순서대로).
    pub async fn list_questions(pool: &PgPool) -> Result<Vec<QuestionRecord>, sqlx::Error> {
        let records = sqlx::query_as::<_, QuestionRecord>(
            "SELECT * FROM assessment_questions ORDER BY sort_order ASC",
        )
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// 테스트 결과 저장 (append-only).
    pub async fn insert_result(
        pool: &PgPool,
        input: AssessmentResultInput,
    ) -> Result<AssessmentResultRecord, JournalError> {
        let category_scores = serde_json::to_value(&input.category_scores)?;
        let recommendations = serde_json::to_value(&input.recommendations)?;

        let record = sqlx::query_as::<_, AssessmentResultRecord>(
            r#"
            INSERT INTO assessment_results (
                user_id, total_score, category_scores, analysis, recommendations, taken_at
            )
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(input.total_score)
        .bind(category_scores)
        .bind(&input.analysis)
        .bind(recommendations)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// 테스트 결과 이력 조회 (최신순).
    pub async fn list_results(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AssessmentResultRecord>, sqlx::Error> {
        let records = sqlx::query_as::<_, AssessmentResultRecord>(
            r#"
            SELECT *
            FROM assessment_results
            WHERE user_id = $1
            ORDER BY taken_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// 테스트 결과 단건 조회.
    ///
    /// 다른 사용자의 결과는 조회되지 않습니다.
    pub async fn get_result(
        pool: &PgPool,
        user_id: Uuid,
        result_id: Uuid,
    ) -> Result<Option<AssessmentResultRecord>, sqlx::Error> {
        let record = sqlx::query_as::<_, AssessmentResultRecord>(
            "SELECT * FROM assessment_results WHERE id = $1 AND user_id = $2",
        )
        .bind(result_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// 가장 최근 테스트 결과 조회.
    pub async fn latest_result(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<AssessmentResultRecord>, sqlx::Error> {
        let record = sqlx::query_as::<_, AssessmentResultRecord>(
            r#"
            SELECT *
            FROM assessment_results
            WHERE user_id = $1
            ORDER BY taken_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use journal_core::default_question_set;

    #[test]
    fn test_question_record_to_domain() {
        let question = &default_question_set()[0];
        let record = QuestionRecord {
            id: question.id.clone(),
            category: question.category.as_str().to_string(),
            text: question.text.clone(),
            options: serde_json::to_value(&question.options).unwrap(),
            sort_order: 0,
        };

        let converted = AssessmentQuestion::try_from(record).unwrap();
        assert_eq!(converted.id, question.id);
        assert_eq!(converted.category, question.category);
        assert_eq!(converted.options.len(), question.options.len());
    }

    #[test]
    fn test_result_record_to_domain() {
        let mut scores = BTreeMap::new();
        scores.insert(AssessmentCategory::RiskManagement, 80);
        scores.insert(AssessmentCategory::Discipline, 60);

        let record = AssessmentResultRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            total_score: 70,
            category_scores: serde_json::to_value(&scores).unwrap(),
            analysis: "양호".to_string(),
            recommendations: serde_json::json!(["손절 기준을 기록하세요"]),
            taken_at: Utc::now(),
        };

        let result = AssessmentResult::try_from(record).unwrap();
        assert_eq!(result.total_score, 70);
        assert_eq!(
            result.category_scores.get(&AssessmentCategory::RiskManagement),
            Some(&80)
        );
        assert_eq!(result.recommendations.len(), 1);
    }

    #[test]
    fn test_invalid_category_rejected() {
        let record = QuestionRecord {
            id: "bogus_1".to_string(),
            category: "astrology".to_string(),
            text: "문항".to_string(),
            options: serde_json::json!([]),
            sort_order: 0,
        };

        assert!(AssessmentQuestion::try_from(record).is_err());
    }
}
