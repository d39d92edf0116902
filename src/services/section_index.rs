//! 섹션 리스트에서 leaf / 채점 대상 여부를 판정한다
//!
//! 별도의 트리 구조를 만들지 않는다. 점 구분 id 리스트를 매번 선형
//! 탐색하는 순수 함수라서 같은 리스트는 평가 순서와 무관하게 항상 같은
//! 판정을 낸다. 기준표 크기는 수십 항목이라 선형 탐색이면 충분하다.

use crate::models::Section;

/// 해당 섹션이 최하위 항목(leaf)인지: 다른 어떤 id 도 `이 id + "."` 로
/// 시작하지 않을 때만 leaf.
pub fn is_leaf_section(section_id: &str, all_sections: &[Section]) -> bool {
    let prefix = format!("{}.", section_id);
    !all_sections
        .iter()
        .any(|other| other.id != section_id && other.id.starts_with(&prefix))
}

/// LLM 채점 대상인지: 배점이 있고 0 보다 크며 leaf 인 항목만
pub fn is_llm_relevant_section(section: &Section, all_sections: &[Section]) -> bool {
    match section.points {
        Some(points) if points > 0.0 => is_leaf_section(&section.id, all_sections),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: &str, points: Option<f64>) -> Section {
        Section {
            id: id.to_string(),
            level: (id.matches('.').count() as u8).max(1),
            label: id.rsplit('.').next().unwrap_or_default().to_string(),
            title: String::new(),
            content: String::new(),
            points,
            problem_num: id.split('.').next().unwrap_or_default().to_string(),
            articles: Vec::new(),
            cases: Vec::new(),
        }
    }

    #[test]
    fn test_leaf_iff_no_dotted_extension() {
        let sections = vec![
            section("1.I", Some(10.0)),
            section("1.I.1", None),
            section("1.I.1.가", Some(4.0)),
        ];
        assert!(!is_leaf_section("1.I", &sections));
        assert!(!is_leaf_section("1.I.1", &sections));
        assert!(is_leaf_section("1.I.1.가", &sections));
    }

    #[test]
    fn test_prefix_must_be_dot_separated() {
        // "1.I" 와 "1.II" 는 서로 무관하다 ("1.I" + "." 접두가 아니므로)
        let sections = vec![section("1.I", Some(5.0)), section("1.II", Some(5.0))];
        assert!(is_leaf_section("1.I", &sections));
        assert!(is_leaf_section("1.II", &sections));
    }

    #[test]
    fn test_removing_a_leaf_preserves_other_leaf_status() {
        let mut sections = vec![
            section("1.I", Some(10.0)),
            section("1.I.가", Some(4.0)),
            section("1.II", Some(6.0)),
        ];
        let before: Vec<bool> = ["1.I", "1.II"]
            .iter()
            .map(|id| is_leaf_section(id, &sections))
            .collect();
        sections.retain(|s| s.id != "1.I.가");
        // leaf 하나를 지워도 남은 항목끼리의 관계는 바뀌지 않는다...
        assert!(is_leaf_section("1.II", &sections));
        assert_eq!(before[1], is_leaf_section("1.II", &sections));
        // ...지워진 자식의 부모는 leaf 로 승격된다
        assert!(is_leaf_section("1.I", &sections));
    }

    #[test]
    fn test_llm_relevance_requires_positive_points_and_leaf() {
        let sections = vec![
            section("1.I", Some(10.0)),
            section("1.I.가", Some(4.0)),
            section("1.I.나", Some(0.0)),
            section("1.II", None),
        ];
        // 부모는 배점이 있어도 대상이 아니다
        assert!(!is_llm_relevant_section(&sections[0], &sections));
        assert!(is_llm_relevant_section(&sections[1], &sections));
        // 0점 / 배점 없음은 대상이 아니다
        assert!(!is_llm_relevant_section(&sections[2], &sections));
        assert!(!is_llm_relevant_section(&sections[3], &sections));
    }
}
