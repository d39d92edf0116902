use thiserror::Error;

/// 채점 엔진 에러 타입
///
/// 채점 코어 자체는 입력이 아무리 이상해도 에러를 내지 않는다 (조용히
/// 강등). 에러가 나는 곳은 바깥 경계뿐이다: LLM 호출, 설정/파일 로딩,
/// JSON 직렬화.
#[derive(Debug, Error)]
pub enum GradeError {
    /// LLM API 호출 실패
    #[error("LLM 호출 실패 (모델: {model}): {source}")]
    Llm {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// LLM 응답에 내용이 없음
    #[error("LLM 응답이 비어 있음 (모델: {model})")]
    EmptyLlmResponse { model: String },

    /// JSON 직렬화/역직렬화 실패
    #[error("JSON 처리 실패: {0}")]
    Json(#[from] serde_json::Error),

    /// 설정 로딩 실패
    #[error("설정 오류: {message}")]
    Config { message: String },

    /// 파일 입출력 실패
    #[error("파일 입출력 실패: {0}")]
    Io(#[from] std::io::Error),
}

impl GradeError {
    pub fn llm(model: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        GradeError::Llm {
            model: model.into(),
            source: Box::new(source),
        }
    }
}

/// 채점 엔진 결과 타입
pub type Result<T> = std::result::Result<T, GradeError>;
