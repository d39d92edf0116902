//! 채점 흐름 통합 테스트
//!
//! 네트워크 없이 고정 판정 대역으로 전체 흐름(구조화 → 기본 채점 →
//! 병합)을 검증한다.

use civil_law_grading::error::{GradeError, Result};
use civil_law_grading::models::{Deduction, Section, SectionJudgment, WritingStatus};
use civil_law_grading::{Config, GradingFlow, SectionJudge};

/// 고정 판정을 돌려주는 대역
struct CannedJudge {
    judgments: Vec<SectionJudgment>,
}

impl SectionJudge for CannedJudge {
    async fn judge_sections(
        &self,
        _sections: &[Section],
        _model_text: &str,
        _student_text: &str,
    ) -> Result<Vec<SectionJudgment>> {
        Ok(self.judgments.clone())
    }
}

/// 항상 실패하는 대역
struct FailingJudge;

impl SectionJudge for FailingJudge {
    async fn judge_sections(
        &self,
        _sections: &[Section],
        _model_text: &str,
        _student_text: &str,
    ) -> Result<Vec<SectionJudgment>> {
        Err(GradeError::EmptyLlmResponse {
            model: "테스트".to_string(),
        })
    }
}

const RUBRIC: &str = "\
[문제 1.에 관하여] (20점)
Ⅰ. 문제의 제기 (5점)
Ⅱ. 불법행위 성립 여부
가. 요건 검토 (10점)
민법 제750조의 고의 또는 과실 __위법행위__
나. 포섭 (5점)
";

const STUDENT: &str = "\
문제 1. 검토
甲은 乙에 대하여 민법 제750조에 따라 손해배상을 청구할 수 있는지 문제된다.
고의 또는 과실로 인한 위법행위로 타인에게 손해를 가한 자는 그 손해를 배상할 책임이 있다.
";

// 근거 문장은 한 건당 25자로 잘리므로 기본 최소 길이(30자)를 넘기려면
// 두 건이 필요하다
fn judgment(id: &str, score: f64, evidence: [&str; 2]) -> SectionJudgment {
    SectionJudgment {
        section_id: id.to_string(),
        writing_status: WritingStatus::Full,
        is_written: true,
        score,
        evidence: evidence.iter().map(|ev| ev.to_string()).collect(),
        deductions: Vec::new(),
        note: "서술이 충실하다".to_string(),
        is_ambiguous: false,
    }
}

#[test]
fn baseline_flow_builds_outline_and_zero_scores() {
    let flow = GradingFlow::new(FailingJudge, Config::default());
    let rubric = flow.parse_rubric(RUBRIC, None);

    let ids: Vec<&str> = rubric.sections.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["1.I", "1.II", "1.II.가", "1.II.나"]);
    // 조문 인용은 2차 패스에서 붙는다
    let article_section = rubric.sections.iter().find(|s| s.id == "1.II.가").unwrap();
    assert!(article_section.articles.contains(&"민법 제750조".to_string()));

    let result = flow.grade_basic(&rubric, STUDENT);
    // 배점 없는 1.II 는 상세에서 빠지고, leaf 합산은 5 + 10 + 5
    assert_eq!(result.score_details.len(), 3);
    assert!(result.human_note.starts_with("총점 0/20"));
    // 포섭 항목이 있으므로 모호 플래그
    assert!(result.is_ambiguous);
    assert!(result.human_note.contains("1.II.나"));
}

#[tokio::test]
async fn hybrid_flow_merges_canned_judgments() {
    let judge = CannedJudge {
        judgments: vec![
            judgment(
                "1.I",
                4.0,
                ["甲은 乙에 대하여 민법 제750조에", "손해배상을 청구할 수 있는지 문제된다"],
            ),
            judgment(
                "1.II.가",
                9.0,
                ["고의 또는 과실로 인한 위법행위로", "타인에게 손해를 가한 자는"],
            ),
            SectionJudgment {
                section_id: "1.II.나".to_string(),
                writing_status: WritingStatus::Missing,
                is_written: false,
                score: 0.0,
                evidence: Vec::new(),
                deductions: Vec::new(),
                note: String::new(),
                is_ambiguous: false,
            },
        ],
    };
    let flow = GradingFlow::new(judge, Config::default());
    let rubric = flow.parse_rubric(RUBRIC, None);
    let result = flow.grade_hybrid(&rubric, "", STUDENT).await;

    let by_id = |id: &str| {
        result
            .score_details
            .iter()
            .find(|d| d.section_id == id)
            .unwrap()
    };
    // 근거 25자 절단 후에도 답안과 매칭되므로 판정 점수 유지
    assert_eq!(by_id("1.I").score, 4.0);
    assert_eq!(by_id("1.II.가").score, 9.0);
    // 합성 감점: 10 − 9 = 1
    assert_eq!(by_id("1.II.가").deductions[0].penalty, 1.0);
    // 미작성은 무조건 0점 + 만점 감점
    assert_eq!(by_id("1.II.나").score, 0.0);
    assert_eq!(by_id("1.II.나").deductions[0].reason, "해당 내용 미작성");

    assert_eq!(result.human_note, "총점 13/20");
    // 기본 채점의 모호 플래그는 병합 후에도 유지된다
    assert!(result.is_ambiguous);
    // note 어조 정규화
    assert_eq!(by_id("1.I").llm.as_ref().unwrap().note, "서술이 충실함.");
}

#[tokio::test]
async fn hybrid_flow_caps_score_with_supplied_deductions() {
    let mut j = judgment(
        "1.II.가",
        10.0,
        ["고의 또는 과실로 인한 위법행위로", "타인에게 손해를 가한 자는"],
    );
    j.deductions = vec![Deduction {
        reason: "판례 인용 누락".to_string(),
        penalty: 3.0,
    }];
    let flow = GradingFlow::new(CannedJudge { judgments: vec![j] }, Config::default());
    let rubric = flow.parse_rubric(RUBRIC, None);
    let result = flow.grade_hybrid(&rubric, "", STUDENT).await;

    let detail = result
        .score_details
        .iter()
        .find(|d| d.section_id == "1.II.가")
        .unwrap();
    // 감점 합이 점수를 상한한다: min(10, 10 − 3) = 7
    assert_eq!(detail.score, 7.0);
    // 판정이 없는 섹션은 기본 채점 상태 그대로
    let untouched = result
        .score_details
        .iter()
        .find(|d| d.section_id == "1.I")
        .unwrap();
    assert_eq!(untouched.score, 0.0);
    assert!(untouched.llm.is_none());
}

#[tokio::test]
async fn hybrid_flow_survives_judge_failure() {
    let flow = GradingFlow::new(FailingJudge, Config::default());
    let rubric = flow.parse_rubric(RUBRIC, None);
    let baseline = flow.grade_basic(&rubric, STUDENT);
    let result = flow.grade_hybrid(&rubric, "", STUDENT).await;

    // 판정 실패 시 기본 채점 결과로 강등된다
    assert_eq!(result.human_note, baseline.human_note);
    assert_eq!(result.score_details.len(), baseline.score_details.len());
}
