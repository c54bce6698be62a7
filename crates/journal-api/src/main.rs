//! 매매일지 API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.
//! 거래 기록, 매매 기법, 심리 테스트, AI 분석 엔드포인트를 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, middleware, routing::get, Extension, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use journal_api::auth::JwtConfig;
use journal_api::metrics::setup_metrics_recorder;
use journal_api::middleware::metrics_layer;
use journal_api::openapi::swagger_ui_router;
use journal_api::repository::PsychologyRepository;
use journal_api::routes::create_api_router;
use journal_api::services::OpenAiAnalyzer;
use journal_api::state::AppState;
use journal_core::{default_question_set, AppConfig};

/// 소켓 주소 구성.
///
/// # Errors
/// `host:port` 형식이 유효하지 않으면 `AddrParseError`를 반환합니다.
fn socket_addr(config: &AppConfig) -> Result<SocketAddr, std::net::AddrParseError> {
    format!("{}:{}", config.server.host, config.server.port).parse()
}

/// AppState 초기화.
///
/// DB 연결과 AI 분석기 설정은 선택적입니다. 설정이 없거나 연결에 실패해도
/// 서버는 기동되며, 해당 기능의 엔드포인트만 degraded 응답을 반환합니다.
async fn create_app_state(config: &AppConfig) -> AppState {
    let jwt_secret = if config.auth.jwt_secret.is_empty() {
        warn!("JWT secret not set, using default (INSECURE for development only)");
        "development-secret-key-change-in-production".to_string()
    } else {
        config.auth.jwt_secret.clone()
    };

    let mut state = AppState::new(jwt_secret);

    // DB 연결 설정 (설정 파일에 없으면 DATABASE_URL 환경변수로 대체)
    let database_url = if config.database.url.is_empty() {
        std::env::var("DATABASE_URL").unwrap_or_default()
    } else {
        config.database.url.clone()
    };

    if database_url.is_empty() {
        warn!("Database URL not set, database features will be disabled");
    } else {
        match PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.database.idle_timeout_secs))
            .connect(&database_url)
            .await
        {
            Ok(pool) => {
                if sqlx::query("SELECT 1").fetch_one(&pool).await.is_ok() {
                    info!("Connected to PostgreSQL successfully");

                    // 기본 심리 테스트 문항 시딩
                    match PsychologyRepository::seed_questions(&pool, &default_question_set()).await
                    {
                        Ok(count) => info!(count, "Assessment questions seeded"),
                        Err(e) => warn!(error = %e, "Failed to seed assessment questions"),
                    }

                    state = state.with_db_pool(pool);
                } else {
                    error!("Failed to verify database connection");
                }
            }
            Err(e) => {
                error!("Failed to connect to database: {}", e);
            }
        }
    }

    // AI 분석기 설정
    match OpenAiAnalyzer::from_config(&config.ai) {
        Some(analyzer) => {
            info!(model = %config.ai.model, "AI analyzer initialized");
            state = state.with_ai_analyzer(Arc::new(analyzer));
        }
        None => {
            warn!("AI analyzer not configured, analysis endpoint will be disabled");
        }
    }

    state
}

/// CORS 미들웨어 구성.
///
/// CORS_ORIGINS 환경변수가 설정되어 있으면 해당 origin만 허용합니다.
/// 설정되지 않으면 개발 모드로 간주하여 모든 origin을 허용합니다.
///
/// # 환경변수
///
/// - `CORS_ORIGINS`: 쉼표로 구분된 허용 origin 목록
///   예: `https://journal.example.com,https://admin.example.com`
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            // 프로덕션: 특정 origin만 허용
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => {
            // 개발: 모든 origin 허용
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        // 자격 증명 포함 허용 (CORS_ORIGINS 설정 시에만)
        .allow_credentials(std::env::var("CORS_ORIGINS").is_ok())
        .max_age(Duration::from_secs(3600))
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    request_timeout_secs: u64,
) -> Router {
    // 메트릭 라우터 (별도 상태)
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let jwt_config = JwtConfig {
        secret: state.jwt_secret.clone(),
    };

    let api_router = create_api_router()
        .with_state(state)
        .layer(Extension(jwt_config));

    Router::new()
        .merge(metrics_router)
        .merge(api_router)
        // OpenAPI 문서 및 Swagger UI
        .merge(swagger_ui_router())
        // 메트릭 미들웨어 (모든 요청에 적용)
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_secs),
        ))
        .layer(cors_layer())
}

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그 또는 `EXPORT_OPENAPI` 환경변수가 설정된 경우
/// OpenAPI JSON 스펙을 stdout으로 출력하고 종료합니다.
fn handle_export_openapi() -> Result<(), Box<dyn std::error::Error>> {
    use journal_api::openapi::ApiDoc;
    use utoipa::OpenApi as _;

    let export_flag = std::env::args().any(|arg| arg == "--export-openapi");
    let export_env = std::env::var("EXPORT_OPENAPI")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    if export_flag || export_env {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&spec)?;
        println!("{}", json);
        std::process::exit(0);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // OpenAPI 내보내기 처리 (서버 시작 전)
    handle_export_openapi()?;

    // tracing 초기화
    journal_core::logging::init_logging_from_env()?;

    info!("Starting Trading Journal API server...");

    // Prometheus 메트릭 레코더 설정
    let metrics_handle = setup_metrics_recorder();
    info!("Prometheus metrics recorder initialized");

    // 설정 로드 (config/default.toml + JOURNAL__* 환경변수)
    let config = AppConfig::load_default()?;
    let addr = socket_addr(&config).map_err(|e| {
        error!(
            host = %config.server.host,
            port = config.server.port,
            error = %e,
            "소켓 주소 설정이 유효하지 않습니다. JOURNAL__SERVER__HOST, JOURNAL__SERVER__PORT를 확인하세요."
        );
        e
    })?;

    // AppState 생성 (DB 연결, 문항 시딩, AI 분석기 초기화 포함)
    let state = Arc::new(create_app_state(&config).await);

    info!(version = %state.version, "Application state initialized");
    info!(
        has_db = state.has_db(),
        has_ai_analyzer = state.has_ai_analyzer(),
        "Service connections status"
    );

    // 라우터 생성
    let app = create_router(state, metrics_handle, config.server.request_timeout_secs);

    // 서버 시작
    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown 처리
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 서버 종료를 시작합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
