//! 기본(규칙 기반) 채점 - 업무 능력층
//!
//! 규칙만으로는 점수를 매기지 않는다. 배점 있는 섹션마다 0점짜리
//! `ScoreDetail` 을 깔아 두고, 포섭(법리의 사실 적용) 항목을 외부 판정
//! 필요 대상으로 표시하는 것까지가 기본 채점의 역할이다. 실제 점수는
//! 병합 단계에서 외부 판정과 합쳐져 정해진다.

use tracing::debug;

use crate::config::Config;
use crate::models::{GradeResult, ParsedRubric, ProblemChunks, ScoreDetail, Section};
use crate::services::answer_parser::split_by_problem_headings;
use crate::services::section_index::is_leaf_section;

/// 포섭 항목 표시 문자열. 이 단어가 제목/본문에 있으면 규칙 채점이
/// 불가능한 항목으로 본다.
const SUBSUMPTION_MARKER: &str = "포섭";

/// leaf 항목만 합산한 (총점, 만점). leaf 표시가 하나도 없으면 전체 합산.
pub fn calculate_final_score(details: &[ScoreDetail]) -> (f64, f64) {
    let leaf: Vec<&ScoreDetail> = details.iter().filter(|d| d.is_leaf).collect();
    let target: Vec<&ScoreDetail> = if leaf.is_empty() {
        details.iter().collect()
    } else {
        leaf
    };
    let total_score = target.iter().map(|d| d.score).sum();
    let total_max = target.iter().map(|d| d.max_points).sum();
    (total_score, total_max)
}

/// 섹션에 대응하는 답안 하위 텍스트를 고른다.
///
/// 문제 번호가 맞는 청크가 우선. 답안이 아주 길면 (번호 매김이
/// 기준표와 어긋난 경우 대비) 청크 전체를 이어붙이고, 그 외에는 답안
/// 전문을 쓴다.
pub fn select_problem_text(
    section: &Section,
    chunks: &ProblemChunks,
    full_text: &str,
    config: &Config,
) -> String {
    let problem_num = section.problem_num.trim();
    if !problem_num.is_empty() {
        if let Some(chunk) = chunks.get(problem_num) {
            return chunk.to_string();
        }
    }
    if full_text.chars().count() >= config.long_text_threshold && !chunks.is_empty() {
        return chunks.joined();
    }
    full_text.to_string()
}

/// 포섭 항목인지: 제목이나 본문에 표시 문자열이 있으면 외부 판정 필수
pub fn needs_subjective_judgment(section: &Section) -> bool {
    section.title.contains(SUBSUMPTION_MARKER) || section.content.contains(SUBSUMPTION_MARKER)
}

/// 기본 채점: 배점 있는 섹션마다 0점 상세를 만들고 leaf 여부를 고정한다.
/// 하위 텍스트 선택과 실제 점수 부여는 판정/병합 단계의 일이다.
pub fn grade_basic(rubric: &ParsedRubric, student_text: &str, _config: &Config) -> GradeResult {
    let cleaned_text = student_text.trim();
    let chunks = split_by_problem_headings(cleaned_text);

    let sections = &rubric.sections;
    debug!(
        "기본 채점 시작: 섹션 {}개, 답안 {}자 (청크 {}개)",
        sections.len(),
        cleaned_text.chars().count(),
        chunks.len()
    );

    let mut score_details = Vec::new();
    let mut is_ambiguous = false;
    let mut llm_needed: Vec<String> = Vec::new();

    for section in sections {
        let Some(points) = section.points else {
            continue;
        };
        let is_leaf = is_leaf_section(&section.id, sections);
        debug!(
            "섹션 {}: 배점 {}, {}",
            section.id,
            points,
            if is_leaf { "leaf" } else { "부모 항목" }
        );

        if needs_subjective_judgment(section) {
            is_ambiguous = true;
            llm_needed.push(section.id.clone());
        }

        score_details.push(ScoreDetail {
            section_id: section.id.clone(),
            title: section.title.clone(),
            max_points: points,
            score: 0.0,
            deductions: Vec::new(),
            articles: section.articles.clone(),
            is_leaf,
            llm: None,
        });
    }

    let (total_score, total_max) = calculate_final_score(&score_details);
    let mut human_note = format!("총점 {}/{}", round2(total_score), round2(total_max));
    if !llm_needed.is_empty() {
        human_note.push_str(&format!(
            " | 포섭 판단 LLM 필요 섹션: {}",
            llm_needed.join(", ")
        ));
    }

    GradeResult {
        score_details,
        is_ambiguous,
        human_note,
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
