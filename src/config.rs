use serde::Deserialize;

use crate::error::{GradeError, Result};

/// 채점 엔진 설정
///
/// 점수 정규화에 쓰는 상수들은 전부 여기로 모은다. 원 구현에서
/// 하드코딩돼 있던 값들이며, 알고리즘이 이 특정 값에 의존하는 것은
/// 아니다 (특히 `long_text_threshold`).
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 답안이 이 글자 수 이상이면 문제 번호 매칭 대신 청크 전체를 이어붙인다
    pub long_text_threshold: usize,
    /// Incomplete 판정 시 점수 상한 비율
    pub incomplete_cap_ratio: f64,
    /// 근거 문장 검증 실패 시 점수 상한 비율
    pub evidence_fail_cap_ratio: f64,
    /// 근거 문장 최소 길이 (일반 항목)
    pub min_evidence_len_default: usize,
    /// 근거 문장 최소 길이 (결론 항목)
    pub min_evidence_len_conclusion: usize,
    // --- LLM 설정 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// LLM 호출 재시도 횟수
    pub llm_retries: u32,
    /// 재시도 간 대기 시간(초). attempt 에 비례해 늘어난다
    pub llm_backoff_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            long_text_threshold: 15_000,
            incomplete_cap_ratio: 0.3,
            evidence_fail_cap_ratio: 0.5,
            min_evidence_len_default: 30,
            min_evidence_len_conclusion: 10,
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.0-flash".to_string(),
            llm_retries: 2,
            llm_backoff_secs: 1.5,
        }
    }
}

impl Config {
    /// 환경변수에서 설정을 읽는다. 없거나 파싱이 안 되는 값은 기본값 유지.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            long_text_threshold: std::env::var("LONG_TEXT_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.long_text_threshold),
            incomplete_cap_ratio: std::env::var("INCOMPLETE_CAP_RATIO").ok().and_then(|v| v.parse().ok()).unwrap_or(default.incomplete_cap_ratio),
            evidence_fail_cap_ratio: std::env::var("EVIDENCE_FAIL_CAP_RATIO").ok().and_then(|v| v.parse().ok()).unwrap_or(default.evidence_fail_cap_ratio),
            min_evidence_len_default: std::env::var("MIN_EVIDENCE_LEN_DEFAULT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.min_evidence_len_default),
            min_evidence_len_conclusion: std::env::var("MIN_EVIDENCE_LEN_CONCLUSION").ok().and_then(|v| v.parse().ok()).unwrap_or(default.min_evidence_len_conclusion),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_retries: std::env::var("LLM_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_retries),
            llm_backoff_secs: std::env::var("LLM_BACKOFF").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_backoff_secs),
        }
    }

    /// TOML 설정 파일을 읽는다. 빠진 키는 기본값으로 채운다.
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| GradeError::Config {
            message: format!("설정 파일을 읽을 수 없음 ({}): {}", path, e),
        })?;
        toml::from_str(&raw).map_err(|e| GradeError::Config {
            message: format!("설정 파일 파싱 실패 ({}): {}", path, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = Config::default();
        assert_eq!(config.long_text_threshold, 15_000);
        assert_eq!(config.incomplete_cap_ratio, 0.3);
        assert_eq!(config.evidence_fail_cap_ratio, 0.5);
        assert_eq!(config.min_evidence_len_default, 30);
        assert_eq!(config.min_evidence_len_conclusion, 10);
    }

    #[test]
    fn test_from_toml_partial_keys() {
        let config: Config = toml::from_str("long_text_threshold = 8000").unwrap();
        assert_eq!(config.long_text_threshold, 8000);
        // 빠진 키는 기본값
        assert_eq!(config.llm_retries, 2);
    }
}
