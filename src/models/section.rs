use serde::{Deserialize, Serialize};

/// 채점기준표의 한 항목 (목차 트리의 노드)
///
/// 계층 구조는 `id` 가 전부 결정한다. `id` 는 라벨을 `.` 으로 이어붙인
/// 경로이며 (예: `"1.I.2"`), X 가 Y 의 상위 항목 ⟺ Y 가 `X + "."` 로 시작.
/// `level` 은 표시용 정보일 뿐 계층 판단에 쓰지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    /// 1 = 로마자, 2 = 아라비아 숫자, 3 = 한글 가나다
    pub level: u8,
    pub label: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// None 이면 배점 없는 구조용 항목 (채점 대상에서 제외)
    #[serde(default)]
    pub points: Option<f64>,
    /// 이 항목이 속한 문제 번호 ("1", "2", ...). 표 기반 파싱에서는 빈 문자열.
    #[serde(default)]
    pub problem_num: String,
    /// 조문 인용 (최초 등장 순서 유지, 중복 제거)
    #[serde(default)]
    pub articles: Vec<String>,
    /// 판례 인용 (최초 등장 순서 유지, 중복 제거)
    #[serde(default)]
    pub cases: Vec<String>,
}

impl Section {
    /// title 과 content 를 합친 텍스트. 인용 추출과 결론/포섭 판정에 쓴다.
    pub fn combined_text(&self) -> String {
        format!("{}\n{}", self.title, self.content).trim().to_string()
    }
}

/// `[문제 N.에 관하여]` 단위의 문제 레코드
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub problem_num: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_points: Option<f64>,
    /// 문제 헤딩 뒤에 붙은 도입 문장 (있을 때만)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    pub sections: Vec<Section>,
}

/// 문제지 앞부분의 사실관계 / 설문 텍스트
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RubricContext {
    pub fact_patterns: Vec<String>,
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RubricMeta {
    pub total_sections: usize,
}

/// 채점기준표 파싱 결과 전체
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedRubric {
    pub context: RubricContext,
    pub problems: Vec<Problem>,
    /// 모든 문제의 섹션을 평탄화한 리스트 (leaf 판정은 이 리스트 전체 기준)
    pub sections: Vec<Section>,
    pub meta: RubricMeta,
}
