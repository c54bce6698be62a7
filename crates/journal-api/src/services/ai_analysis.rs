//! AI 거래 분석 서비스.
//!
//! 거래 통계와 심리 테스트 결과를 LLM에 전달하여 매매 습관에 대한
//! 서술형 분석을 생성하고, 차트 이미지에서 구조화된 매매 추정을 추출합니다.
//! OpenAI 호환 chat completions API를 사용합니다.

use async_trait::async_trait;
use base64::Engine;
use journal_core::{AiConfig, AssessmentResult, JournalError, JournalResult, Trade, TradeStatistics};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

/// 분석 입력 컨텍스트.
///
/// 프롬프트 구성에 필요한 사용자의 거래 이력 요약입니다.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    /// 전체 거래 통계
    pub statistics: TradeStatistics,
    /// 최근 거래 목록 (최신순)
    pub recent_trades: Vec<Trade>,
    /// 가장 최근 심리 테스트 결과
    pub latest_assessment: Option<AssessmentResult>,
}

/// 차트 이미지 분석 결과.
///
/// 모델의 JSON 응답에서 파싱한 매매 추정입니다. 모델이 식별하지 못한
/// 필드는 None으로 남습니다.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChartAnalysis {
    /// 식별된 종목 심볼
    #[serde(default)]
    pub symbol: Option<String>,
    /// 추정 포지션 방향 ("long" | "short")
    #[serde(default)]
    pub side: Option<String>,
    /// 추정 진입 가격
    #[serde(default)]
    pub entry_price: Option<String>,
    /// 추정 신뢰도 (0.0 ~ 1.0)
    #[serde(default)]
    pub confidence: Option<f64>,
    /// 차트 상황 요약
    pub summary: String,
}

/// AI 분석기 인터페이스.
///
/// 테스트에서는 mock 구현으로 대체할 수 있습니다.
#[async_trait]
pub trait AiAnalyzer: Send + Sync {
    /// 프롬프트에 대한 서술형 응답을 반환합니다.
    async fn complete(&self, prompt: &str) -> JournalResult<String>;

    /// 차트 이미지를 분석하여 구조화된 매매 추정을 반환합니다.
    async fn analyze_chart(&self, image: &[u8], mime: &str) -> JournalResult<ChartAnalysis>;
}

// =====================================================
// OpenAI 호환 구현
// =====================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<RequestMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct RequestMessage {
    role: String,
    content: MessageContent,
}

/// 텍스트 또는 멀티모달 콘텐츠.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// OpenAI 호환 chat completions 기반 분석기.
pub struct OpenAiAnalyzer {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiAnalyzer {
    /// 새 분석기 생성.
    pub fn new(api_url: String, api_key: String, model: String, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_url,
            api_key,
            model,
        }
    }

    /// 설정에서 분석기 생성. 비활성화되었거나 API 키가 없으면 None.
    pub fn from_config(config: &AiConfig) -> Option<Self> {
        if !config.enabled || config.api_key.is_empty() {
            return None;
        }
        Some(Self::new(
            config.api_url.clone(),
            config.api_key.clone(),
            config.model.clone(),
            config.timeout_secs,
        ))
    }

    /// chat completions 요청 공통 처리.
    async fn send_chat(&self, messages: Vec<RequestMessage>) -> JournalResult<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: 0.4,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| JournalError::External(format!("AI API 요청 실패: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(JournalError::External(format!(
                "AI API 오류 ({status}): {body}"
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| JournalError::External(format!("AI API 응답 파싱 실패: {e}")))?;

        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| JournalError::External("AI API 응답에 choices가 없습니다".to_string()))
    }
}

/// 시장 분석 시스템 프롬프트. 분석 관점과 출력 형식을 고정합니다.
const SYSTEM_PROMPT: &str = "당신은 트레이딩 코치입니다. 주어진 거래 통계와 심리 테스트 결과를 \
바탕으로 매매 습관의 강점과 약점을 분석하고, 구체적인 개선 행동을 한국어로 제안하세요. \
투자 권유나 종목 추천은 하지 마세요.";

/// 차트 분석 시스템 프롬프트. JSON 전용 출력을 요구합니다.
const CHART_SYSTEM_PROMPT: &str = "주어진 차트 이미지를 분석하여 다음 필드를 가진 JSON 객체만 \
출력하세요: symbol (종목 심볼, 불명확하면 null), side (\"long\" 또는 \"short\", 불명확하면 null), \
entry_price (추정 진입 가격 문자열, 불명확하면 null), confidence (0.0~1.0 숫자), \
summary (차트 상황 요약, 한국어). JSON 외의 텍스트는 출력하지 마세요.";

/// 분석 프롬프트 구성.
pub fn build_prompt(context: &AnalysisContext) -> String {
    let stats = &context.statistics;
    let mut prompt = format!(
        "## 거래 통계\n\
         - 전체 거래: {}건 (청산 {}건)\n\
         - 승률: {}% ({}승 {}패)\n\
         - 총 손익: {}\n\
         - 평균 손익: {}\n\
         - 손익비(profit factor): {}\n\
         - 최대 수익: {} / 최대 손실: {}\n",
        stats.total_trades,
        stats.closed_trades,
        stats.win_rate_pct,
        stats.winning_trades,
        stats.losing_trades,
        stats.total_profit,
        stats.avg_profit,
        stats.profit_factor,
        stats.largest_win,
        stats.largest_loss,
    );

    if !context.recent_trades.is_empty() {
        prompt.push_str("\n## 최근 거래\n");
        for trade in context.recent_trades.iter().take(10) {
            let profit = trade
                .profit
                .map(|p| p.to_string())
                .unwrap_or_else(|| "미청산".to_string());
            prompt.push_str(&format!(
                "- {} {} 수량 {} 진입가 {} 손익 {}\n",
                trade.symbol,
                trade.side.as_str(),
                trade.quantity,
                trade.entry_price,
                profit,
            ));
        }
    }

    if let Some(assessment) = &context.latest_assessment {
        prompt.push_str(&format!(
            "\n## 최근 심리 테스트\n- 총점: {}\n",
            assessment.total_score
        ));
        for (category, score) in &assessment.category_scores {
            prompt.push_str(&format!("- {}: {}\n", category.label(), score));
        }
    }

    prompt
}

/// 모델 응답에서 JSON을 추출하여 파싱합니다.
///
/// 모델이 마크다운 코드 펜스로 감싸는 경우를 처리합니다.
fn parse_chart_reply(reply: &str) -> JournalResult<ChartAnalysis> {
    let trimmed = reply.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(json)
        .map_err(|e| JournalError::External(format!("차트 분석 응답 파싱 실패: {e}")))
}

#[async_trait]
impl AiAnalyzer for OpenAiAnalyzer {
    async fn complete(&self, prompt: &str) -> JournalResult<String> {
        let messages = vec![
            RequestMessage {
                role: "system".to_string(),
                content: MessageContent::Text(SYSTEM_PROMPT.to_string()),
            },
            RequestMessage {
                role: "user".to_string(),
                content: MessageContent::Text(prompt.to_string()),
            },
        ];

        self.send_chat(messages).await
    }

    async fn analyze_chart(&self, image: &[u8], mime: &str) -> JournalResult<ChartAnalysis> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let data_url = format!("data:{mime};base64,{encoded}");

        let messages = vec![
            RequestMessage {
                role: "system".to_string(),
                content: MessageContent::Text(CHART_SYSTEM_PROMPT.to_string()),
            },
            RequestMessage {
                role: "user".to_string(),
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: "이 차트를 분석해 주세요.".to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ]),
            },
        ];

        let reply = self.send_chat(messages).await?;
        parse_chart_reply(&reply)
    }
}
