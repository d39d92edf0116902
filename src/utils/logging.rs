/// 로그 유틸 모듈
///
/// 로그 초기화와 출력 보조 함수 제공
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 전역 로그 초기화
///
/// `RUST_LOG` 환경변수로 레벨 제어 (기본 info). 이미 초기화돼 있으면
/// 조용히 넘어간다 (테스트에서 반복 호출 대비).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 채점 시작 정보 기록
pub fn log_startup(model_name: &str) {
    info!("{}", "=".repeat(60));
    info!("채점 엔진 시작 - {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("판정 모델: {}", model_name);
    info!("{}", "=".repeat(60));
}

/// 긴 텍스트를 로그 표시용으로 자른다
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
