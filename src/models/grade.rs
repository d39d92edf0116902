use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// 감점 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deduction {
    pub reason: String,
    #[serde(default, deserialize_with = "de_soft_f64")]
    pub penalty: f64,
}

/// 외부 판정의 답안 작성 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WritingStatus {
    /// 해당 항목 서술이 아예 없음 → 무조건 0점
    Missing,
    /// 서술을 시작했으나 논리가 중단됨 → 배점의 30% 상한
    Incomplete,
    /// 정상 채점. 알 수 없는 값도 여기로 떨어진다
    #[default]
    #[serde(other)]
    Full,
}

/// 외부(LLM) 채점 판정 한 건
///
/// 필드 전부에 soft default 를 둔다. 누락 필드가 있어도 파싱이 죽지 않고,
/// 숫자 필드는 문자열/결측이어도 0 으로 떨어진다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionJudgment {
    #[serde(default)]
    pub section_id: String,
    #[serde(default)]
    pub writing_status: WritingStatus,
    #[serde(default = "default_true")]
    pub is_written: bool,
    #[serde(default, deserialize_with = "de_soft_f64")]
    pub score: f64,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub deductions: Vec<Deduction>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub is_ambiguous: bool,
}

fn default_true() -> bool {
    true
}

impl SectionJudgment {
    /// 파싱 실패 시 대신 쓰는 안전 판정: 0점 + 모호 플래그
    pub fn parse_fallback(section_id: &str) -> Self {
        Self {
            section_id: section_id.to_string(),
            writing_status: WritingStatus::Full,
            is_written: true,
            score: 0.0,
            evidence: Vec::new(),
            deductions: Vec::new(),
            note: "파싱 오류".to_string(),
            is_ambiguous: true,
        }
    }
}

/// JSON 값 하나를 판정으로 soft 파싱한다.
///
/// 판정 모양이 아니면 (객체가 아니거나 타입이 안 맞으면) 에러 대신
/// `parse_fallback` 을 돌려준다. 병합 단계가 죽는 일은 없어야 한다.
pub fn judgment_from_value(value: Value, section_id: &str) -> SectionJudgment {
    match serde_json::from_value::<SectionJudgment>(value) {
        Ok(mut judgment) => {
            // 배치 순서가 곧 섹션 순서이므로 id 는 항상 우리 쪽 값으로 고정
            judgment.section_id = section_id.to_string();
            judgment
        }
        Err(e) => {
            warn!("판정 파싱 실패 (섹션 {}): {}", section_id, e);
            SectionJudgment::parse_fallback(section_id)
        }
    }
}

/// 채점 결과의 한 행 (배점 있는 섹션당 하나)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreDetail {
    pub section_id: String,
    pub title: String,
    pub max_points: f64,
    pub score: f64,
    pub deductions: Vec<Deduction>,
    #[serde(default)]
    pub articles: Vec<String>,
    /// 기본 채점 시점에 고정된 leaf 여부 (병합 단계에서 재계산하지 않음)
    pub is_leaf: bool,
    /// 병합된 외부 판정 원본 (병합 전에는 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<SectionJudgment>,
}

/// 채점 결과 전체
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeResult {
    pub score_details: Vec<ScoreDetail>,
    /// 한 번 true 가 되면 병합을 거쳐도 false 로 돌아가지 않는다
    pub is_ambiguous: bool,
    pub human_note: String,
}

/// 숫자 필드 soft 역직렬화: 숫자/숫자 문자열/결측/null 전부 허용, 실패는 0.0
fn de_soft_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct SoftF64Visitor;

    impl<'de> Visitor<'de> for SoftF64Visitor {
        type Value = f64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number, numeric string, or null")
        }

        fn visit_f64<E>(self, value: f64) -> Result<f64, E> {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<f64, E> {
            Ok(value as f64)
        }

        fn visit_u64<E>(self, value: u64) -> Result<f64, E> {
            Ok(value as f64)
        }

        fn visit_str<E>(self, value: &str) -> Result<f64, E> {
            Ok(value.trim().parse().unwrap_or(0.0))
        }

        fn visit_unit<E>(self) -> Result<f64, E> {
            Ok(0.0)
        }

        fn visit_none<E>(self) -> Result<f64, E> {
            Ok(0.0)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<f64, D2::Error>
        where
            D2: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(SoftF64Visitor)
        }
    }

    deserializer.deserialize_any(SoftF64Visitor)
}
