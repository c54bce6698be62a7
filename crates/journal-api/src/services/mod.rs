//! 외부 서비스 연동.

pub mod ai_analysis;

pub use ai_analysis::{build_prompt, AiAnalyzer, AnalysisContext, ChartAnalysis, OpenAiAnalyzer};
