//! 점수 병합/정규화 - 업무 능력층
//!
//! 기본 채점 결과에 외부 판정을 얹어 최종 점수를 만든다. 판정 점수와
//! 감점 목록이 서로 어긋나는 일이 흔해서, 여기서 한 가지 연쇄 규칙으로
//! 강제 정합시킨다: 반점 반올림 → 미작성 0점 → 감점 합 상한 → 상태별
//! 상한 → 어조 정규화. 섹션 간 순서 의존성은 없고, 판정이 없는 섹션은
//! 기본 채점 상태 그대로 통과한다. 네트워크 호출은 절대 하지 않는다.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

use crate::config::Config;
use crate::models::{
    Deduction, GradeResult, ScoreDetail, Section, SectionJudgment, WritingStatus,
};
use crate::services::grading::{calculate_final_score, round2};

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w가-힣]").unwrap());
static TRAILING_PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.?!]+$").unwrap());
static POLITE_ENDING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(입니다|됩니다|되었다|했다|하였다|다|요)$").unwrap());

/// 반점 단위 반올림. 0.25 → 0.5, -0.25 → -0.5 (0.5 는 0 에서 먼 쪽으로).
pub fn round_to_half(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}

/// 근거 문장 정리: 공백 제거 후 빈 문자열과 "X" 표지는 버리고 25자로 자른다
fn normalize_evidence(evidence: &[String]) -> Vec<String> {
    evidence
        .iter()
        .map(|ev| ev.trim())
        .filter(|ev| !ev.is_empty() && *ev != "X")
        .map(|ev| ev.chars().take(25).collect())
        .collect()
}

/// 비교용 정규화: 공백 제거 후 단어 문자/한글 외 전부 제거
fn normalize_for_match(text: &str) -> String {
    let no_ws = WS_RE.replace_all(text, "");
    NON_WORD_RE.replace_all(&no_ws, "").to_string()
}

/// 근거 문장 중 하나라도 답안 본문에 들어 있는지.
///
/// 12자 이상인 근거는 앞 10자나 뒤 10자만 맞아도 인정한다 (OCR 로
/// 문장 가장자리가 깨지는 경우 대응).
fn evidence_in_student(evidence: &[String], student_text: &str) -> bool {
    let normalized_student = normalize_for_match(student_text);
    for ev in evidence {
        let ev_norm = normalize_for_match(ev);
        if ev_norm.is_empty() {
            continue;
        }
        if normalized_student.contains(&ev_norm) {
            return true;
        }
        let chars: Vec<char> = ev_norm.chars().collect();
        if chars.len() >= 12 {
            let head: String = chars[..10].iter().collect();
            let tail: String = chars[chars.len() - 10..].iter().collect();
            if normalized_student.contains(&head) || normalized_student.contains(&tail) {
                return true;
            }
        }
    }
    false
}

/// 결론 항목인지: 제목이나 본문에 "결론" 이 있으면 근거 최소 길이를 낮춘다
fn is_conclusion(title: &str, content: &str) -> bool {
    title.contains("결론") || content.contains("결론")
}

/// 판정 note 의 종결 어미를 `~함.` 꼴로 통일한다. 내용은 건드리지 않는다.
fn normalize_note_tone(note: &str) -> String {
    let mut text = WS_RE.replace_all(note.trim(), " ").trim().to_string();
    if text.is_empty() {
        return String::new();
    }
    text = TRAILING_PUNCT_RE.replace(&text, "").trim().to_string();
    text = POLITE_ENDING_RE.replace(&text, "").trim().to_string();
    if let Some(stem) = text.strip_suffix('됨') {
        text = format!("{}함", stem);
    } else if !text.ends_with('함') {
        text.push('함');
    }
    format!("{}.", text)
}

/// 외부 감점 목록 정리: 이유 없는 항목은 "감점", 음수는 0, 반점 반올림,
/// 0 이하는 버린다
fn normalize_deductions(raw: &[Deduction]) -> Vec<Deduction> {
    raw.iter()
        .filter_map(|d| {
            let reason = d.reason.trim();
            let reason = if reason.is_empty() { "감점" } else { reason };
            let penalty = round_to_half(d.penalty.max(0.0));
            if penalty <= 0.0 {
                return None;
            }
            Some(Deduction {
                reason: reason.to_string(),
                penalty,
            })
        })
        .collect()
}

/// 판정 한 건을 상세 한 행에 적용한 결과
struct MergedSection {
    score: f64,
    deductions: Vec<Deduction>,
    judgment: SectionJudgment,
}

fn merge_one(
    detail: &ScoreDetail,
    judgment: &SectionJudgment,
    section: Option<&Section>,
    student_text: &str,
    config: &Config,
) -> MergedSection {
    let max_points = round_to_half(detail.max_points);
    let mut merged = judgment.clone();

    // 근거 검증은 점수 연쇄보다 먼저. 결론 항목 판별은 섹션 원본이
    // 있으면 제목+본문, 없으면 상세의 제목만으로 한다.
    let evidence = normalize_evidence(&judgment.evidence);
    let evidence_text: String = evidence.concat();
    let min_len = match section {
        Some(s) if is_conclusion(&s.title, &s.content) => config.min_evidence_len_conclusion,
        Some(_) => config.min_evidence_len_default,
        None if is_conclusion(&detail.title, "") => config.min_evidence_len_conclusion,
        None => config.min_evidence_len_default,
    };
    let mut evidence_is_valid = true;
    if evidence.is_empty() || evidence_text.trim().chars().count() < min_len {
        merged.evidence = vec!["X".to_string()];
        evidence_is_valid = false;
    } else if !evidence_in_student(&evidence, student_text) {
        merged.evidence = vec!["X".to_string()];
        merged.note = String::new();
        evidence_is_valid = false;
    } else {
        merged.evidence = evidence;
    }

    let not_written =
        judgment.writing_status == WritingStatus::Missing || !judgment.is_written;

    let (final_score, deductions) = if not_written {
        let deductions = if max_points > 0.0 {
            vec![Deduction {
                reason: "해당 내용 미작성".to_string(),
                penalty: max_points,
            }]
        } else {
            Vec::new()
        };
        (0.0, deductions)
    } else {
        let candidate = round_to_half(judgment.score.clamp(0.0, max_points));
        let mut deductions = normalize_deductions(&judgment.deductions);
        let mut final_score = if deductions.is_empty() {
            let shortfall = round_to_half((max_points - candidate).max(0.0));
            if shortfall > 0.0 {
                deductions.push(Deduction {
                    reason: "평가 기준 반영 감점".to_string(),
                    penalty: shortfall,
                });
            }
            candidate
        } else {
            let capped_sum =
                round_to_half(deductions.iter().map(|d| d.penalty).sum::<f64>()).min(max_points);
            let score_from_penalty = round_to_half((max_points - capped_sum).max(0.0));
            round_to_half(candidate.min(score_from_penalty))
        };

        // 상태별 상한: Incomplete 가 근거 상한보다 우선한다
        if judgment.writing_status == WritingStatus::Incomplete {
            let cap = round_to_half(max_points * config.incomplete_cap_ratio);
            if final_score > cap {
                let removed = round_to_half(final_score - cap);
                final_score = cap;
                if removed > 0.0 {
                    deductions.push(Deduction {
                        reason: "논리 전개 불완전".to_string(),
                        penalty: removed,
                    });
                }
            }
        } else if !evidence_is_valid {
            let cap = round_to_half(max_points * config.evidence_fail_cap_ratio);
            if final_score > cap {
                let removed = round_to_half(final_score - cap);
                final_score = cap;
                if removed > 0.0 {
                    deductions.push(Deduction {
                        reason: "근거 문장 불충분".to_string(),
                        penalty: removed,
                    });
                }
            }
        }
        (final_score, deductions)
    };

    merged.score = final_score;
    merged.deductions = deductions.clone();
    merged.note = normalize_note_tone(&merged.note);

    MergedSection {
        score: final_score,
        deductions,
        judgment: merged,
    }
}

/// 기본 채점 결과에 외부 판정 목록을 병합한다.
///
/// 상세 목록은 copy-on-write: 판정이 매칭된 행만 바뀐다. `is_ambiguous`
/// 는 단조 증가만 한다 (기본 채점에서 true 였으면 병합 후에도 true).
pub fn merge_judgments(
    base: &GradeResult,
    judgments: &[SectionJudgment],
    sections: &[Section],
    student_text: &str,
    config: &Config,
) -> GradeResult {
    let judgment_map: HashMap<&str, &SectionJudgment> = judgments
        .iter()
        .map(|j| (j.section_id.as_str(), j))
        .collect();
    let section_map: HashMap<&str, &Section> =
        sections.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut is_ambiguous = base.is_ambiguous;
    let mut score_details = base.score_details.clone();

    for detail in &mut score_details {
        let Some(judgment) = judgment_map.get(detail.section_id.as_str()) else {
            continue;
        };
        let merged = merge_one(
            detail,
            judgment,
            section_map.get(detail.section_id.as_str()).copied(),
            student_text,
            config,
        );
        debug!(
            "섹션 {} 병합: 판정 {} → 확정 {}",
            detail.section_id, judgment.score, merged.score
        );
        detail.score = merged.score;
        detail.deductions = merged.deductions;
        if merged.judgment.is_ambiguous {
            is_ambiguous = true;
        }
        detail.llm = Some(merged.judgment);
    }

    let (total_score, total_max) = calculate_final_score(&score_details);
    let human_note = format!("총점 {}/{}", round2(total_score), round2(total_max));

    GradeResult {
        score_details,
        is_ambiguous,
        human_note,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(id: &str, max_points: f64, is_leaf: bool) -> ScoreDetail {
        ScoreDetail {
            section_id: id.to_string(),
            title: String::new(),
            max_points,
            score: 0.0,
            deductions: Vec::new(),
            articles: Vec::new(),
            is_leaf,
            llm: None,
        }
    }

    fn baseline(details: Vec<ScoreDetail>) -> GradeResult {
        GradeResult {
            score_details: details,
            is_ambiguous: false,
            human_note: String::new(),
        }
    }

    // 근거 문장은 한 건당 25자로 잘리므로, 기본 최소 길이(30자)를
    // 넘기려면 두 건 이상이어야 한다
    fn judgment(id: &str, status: WritingStatus, score: f64) -> SectionJudgment {
        SectionJudgment {
            section_id: id.to_string(),
            writing_status: status,
            is_written: true,
            score,
            evidence: vec![
                "학생 답안에서 그대로 가져온 근거 문장".to_string(),
                "서른 글자를 채우기 위한 두 번째 문장".to_string(),
            ],
            deductions: Vec::new(),
            note: String::new(),
            is_ambiguous: false,
        }
    }

    const STUDENT: &str =
        "학생 답안에서 그대로 가져온 근거 문장. 서른 글자를 채우기 위한 두 번째 문장. 나머지 본문.";

    #[test]
    fn test_round_to_half_ties_away_from_zero() {
        assert_eq!(round_to_half(0.25), 0.5);
        assert_eq!(round_to_half(0.24), 0.0);
        assert_eq!(round_to_half(7.75), 8.0);
        assert_eq!(round_to_half(-0.25), -0.5);
    }

    #[test]
    fn test_empty_judgments_is_noop() {
        let base = baseline(vec![detail("1.I", 10.0, true)]);
        let merged = merge_judgments(&base, &[], &[], STUDENT, &Config::default());
        assert_eq!(merged.score_details[0].score, 0.0);
        assert!(merged.score_details[0].deductions.is_empty());
        assert!(merged.score_details[0].llm.is_none());
        assert!(!merged.is_ambiguous);
    }

    #[test]
    fn test_full_with_valid_evidence_synthesizes_shortfall() {
        // 만점 10, 판정 9점, 감점 없음, 근거는 답안에 그대로 존재
        let base = baseline(vec![detail("1.I", 10.0, true)]);
        let j = judgment("1.I", WritingStatus::Full, 9.0);
        let merged = merge_judgments(&base, &[j], &[], STUDENT, &Config::default());
        let d = &merged.score_details[0];
        assert_eq!(d.score, 9.0);
        assert_eq!(d.deductions.len(), 1);
        assert_eq!(d.deductions[0].reason, "평가 기준 반영 감점");
        assert_eq!(d.deductions[0].penalty, 1.0);
    }

    #[test]
    fn test_incomplete_caps_at_ratio() {
        // 만점 10, Incomplete, 판정 8점 → 가산 감점 2 (합성) + 5 (상한 제거분), 확정 3
        let base = baseline(vec![detail("1.I", 10.0, true)]);
        let j = judgment("1.I", WritingStatus::Incomplete, 8.0);
        let merged = merge_judgments(&base, &[j], &[], STUDENT, &Config::default());
        let d = &merged.score_details[0];
        assert_eq!(d.score, 3.0);
        let reasons: Vec<&str> = d.deductions.iter().map(|x| x.reason.as_str()).collect();
        assert_eq!(reasons, vec!["평가 기준 반영 감점", "논리 전개 불완전"]);
        assert_eq!(d.deductions[0].penalty, 2.0);
        assert_eq!(d.deductions[1].penalty, 5.0);
    }

    #[test]
    fn test_missing_forces_zero_regardless_of_score() {
        let base = baseline(vec![detail("1.I", 10.0, true)]);
        let j = judgment("1.I", WritingStatus::Missing, 9.5);
        let merged = merge_judgments(&base, &[j], &[], STUDENT, &Config::default());
        let d = &merged.score_details[0];
        assert_eq!(d.score, 0.0);
        assert_eq!(d.deductions[0].reason, "해당 내용 미작성");
        assert_eq!(d.deductions[0].penalty, 10.0);
    }

    #[test]
    fn test_not_written_flag_forces_zero() {
        let base = baseline(vec![detail("1.I", 10.0, true)]);
        let mut j = judgment("1.I", WritingStatus::Full, 7.0);
        j.is_written = false;
        let merged = merge_judgments(&base, &[j], &[], STUDENT, &Config::default());
        assert_eq!(merged.score_details[0].score, 0.0);
    }

    #[test]
    fn test_missing_with_zero_max_omits_deduction() {
        let base = baseline(vec![detail("1.I", 0.0, true)]);
        let j = judgment("1.I", WritingStatus::Missing, 0.0);
        let merged = merge_judgments(&base, &[j], &[], STUDENT, &Config::default());
        assert!(merged.score_details[0].deductions.is_empty());
    }

    #[test]
    fn test_supplied_deductions_cap_the_score() {
        // 판정 9점이지만 감점 합이 4 → 상한 6 이 이긴다
        let base = baseline(vec![detail("1.I", 10.0, true)]);
        let mut j = judgment("1.I", WritingStatus::Full, 9.0);
        j.deductions = vec![
            Deduction { reason: "요건 누락".to_string(), penalty: 2.5 },
            Deduction { reason: String::new(), penalty: 1.5 },
            Deduction { reason: "무시".to_string(), penalty: -3.0 },
        ];
        let merged = merge_judgments(&base, &[j], &[], STUDENT, &Config::default());
        let d = &merged.score_details[0];
        assert_eq!(d.score, 6.0);
        // 이유 없는 감점은 "감점", 음수 감점은 버려진다
        assert_eq!(d.deductions.len(), 2);
        assert_eq!(d.deductions[1].reason, "감점");
    }

    #[test]
    fn test_score_clamped_into_range() {
        let base = baseline(vec![detail("1.I", 10.0, true)]);
        let j = judgment("1.I", WritingStatus::Full, 42.0);
        let merged = merge_judgments(&base, &[j], &[], STUDENT, &Config::default());
        let d = &merged.score_details[0];
        assert!(d.score >= 0.0 && d.score <= d.max_points);
        assert!(d.deductions.iter().map(|x| x.penalty).sum::<f64>() <= d.max_points);
    }

    #[test]
    fn test_short_evidence_caps_at_half() {
        let base = baseline(vec![detail("1.I", 10.0, true)]);
        let mut j = judgment("1.I", WritingStatus::Full, 9.0);
        j.evidence = vec!["짧은 근거".to_string()];
        let merged = merge_judgments(&base, &[j], &[], STUDENT, &Config::default());
        let d = &merged.score_details[0];
        assert_eq!(d.score, 5.0);
        let llm = d.llm.as_ref().unwrap();
        assert_eq!(llm.evidence, vec!["X"]);
        assert!(d.deductions.iter().any(|x| x.reason == "근거 문장 불충분"));
    }

    #[test]
    fn test_unmatched_evidence_caps_and_clears_note() {
        let base = baseline(vec![detail("1.I", 10.0, true)]);
        let mut j = judgment("1.I", WritingStatus::Full, 8.0);
        // 길이는 충분하지만 답안 어디에도 없는 조작된 근거
        j.evidence = vec![
            "답안 어디에도 없는 조작된 근거 문장".to_string(),
            "역시 답안에 존재하지 않는 두 번째 문장".to_string(),
        ];
        j.note = "근거가 충분합니다".to_string();
        let merged = merge_judgments(&base, &[j], &[], STUDENT, &Config::default());
        let d = &merged.score_details[0];
        assert_eq!(d.score, 5.0);
        let llm = d.llm.as_ref().unwrap();
        assert_eq!(llm.evidence, vec!["X"]);
        assert_eq!(llm.note, "");
    }

    #[test]
    fn test_evidence_partial_match_tolerated() {
        // 12자 이상 근거는 앞 10자만 맞아도 유효
        let base = baseline(vec![detail("1.I", 10.0, true)]);
        let mut j = judgment("1.I", WritingStatus::Full, 9.0);
        // 첫 근거는 꼬리만 다르고, 둘째는 길이 채우기용 (답안에 없음)
        j.evidence = vec![
            "학생 답안에서 그대로 가져온 근거 문장인데 꼬리가 다르다".to_string(),
            "서른 글자 채우려고 덧붙인 긴 문장".to_string(),
        ];
        let merged = merge_judgments(&base, &[j], &[], STUDENT, &Config::default());
        assert_eq!(merged.score_details[0].score, 9.0);
    }

    #[test]
    fn test_conclusion_section_lowers_evidence_threshold() {
        let mut d = detail("1.II", 5.0, true);
        d.title = "결론".to_string();
        let base = baseline(vec![d]);
        let mut j = judgment("1.II", WritingStatus::Full, 5.0);
        // 10자 이상이면 결론 항목에서는 충분하다
        j.evidence = vec!["결론적으로 청구는 인용된다".to_string()];
        let student = "판단한다. 결론적으로 청구는 인용된다.";
        let merged = merge_judgments(&base, &[j], &[], student, &Config::default());
        assert_eq!(merged.score_details[0].score, 5.0);
    }

    #[test]
    fn test_ambiguous_is_monotone() {
        let mut base = baseline(vec![detail("1.I", 10.0, true)]);
        base.is_ambiguous = true;
        let merged = merge_judgments(&base, &[], &[], STUDENT, &Config::default());
        assert!(merged.is_ambiguous);

        let base = baseline(vec![detail("1.I", 10.0, true)]);
        let mut j = judgment("1.I", WritingStatus::Full, 9.0);
        j.is_ambiguous = true;
        let merged = merge_judgments(&base, &[j], &[], STUDENT, &Config::default());
        assert!(merged.is_ambiguous);
    }

    #[test]
    fn test_totals_recomputed_over_leaves() {
        let base = baseline(vec![detail("1.I", 10.0, false), detail("1.I.가", 4.0, true)]);
        let j = judgment("1.I.가", WritingStatus::Full, 3.5);
        let merged = merge_judgments(&base, &[j], &[], STUDENT, &Config::default());
        assert_eq!(merged.human_note, "총점 3.5/4");
    }

    #[test]
    fn test_note_tone_normalization() {
        assert_eq!(normalize_note_tone("요건 충족을 잘 서술했다."), "요건 충족을 잘 서술함.");
        assert_eq!(normalize_note_tone("근거가   부족하였다"), "근거가 부족함.");
        assert_eq!(normalize_note_tone("결론이 누락됨"), "결론이 누락함.");
        assert_eq!(normalize_note_tone("전반적으로 충실함."), "전반적으로 충실함.");
        assert_eq!(normalize_note_tone("  "), "");
    }
}
