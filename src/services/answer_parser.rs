//! 답안 텍스트 파서 - 업무 능력층
//!
//! 기준표 목차와는 다른, 더 느슨한 헤딩 문법으로 답안을 문제 번호별
//! 청크로 쪼갠다. `문단 정규화`는 답안을 저장할 때만 쓰는 별도 경로로,
//! PDF 추출 과정에서 생긴 줄바꿈 잘림을 되돌리는 용도다 (채점용 분할에는
//! 쓰지 않는다).

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{AnswerStats, ParsedAnswer, ProblemChunks};

/// 답안 쪽 문제 헤딩: `[문제 1]`, `문 2.`, `설문3)` 등
static PROBLEM_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[?(?:문제|문|설문)\s*(\d+)\s*[\]\.\):]?\s*(.*)$").unwrap()
});

/// 조문 인용 줄: 목차 마커처럼 보여도 줄을 쪼개면 안 된다
static STATUTE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^제\s*\d+\s*[조항호]").unwrap());

/// 문단 정규화에서 제 줄을 유지하는 구조 마커
static STRUCTURAL_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[ⅠⅡⅢⅣⅤⅥⅦⅧⅨⅩ]+|[IVX]+|\d{1,2}|[가나다라마바사아자차카타파하]|\(\d{1,2}\)|[①②③④⑤⑥⑦⑧⑨⑩])\s*[\.\)]",
    )
    .unwrap()
});

/// 답안을 문제 번호별 청크로 쪼갠다.
///
/// 헤딩 줄 자체와 그 줄의 꼬리 텍스트까지 해당 청크에 들어간다. 첫
/// 헤딩 앞의 줄들은 청크에서 버려진다 (채점 fallback 은 분할 전 전체
/// 텍스트를 쓴다).
pub fn split_by_problem_headings(text: &str) -> ProblemChunks {
    let mut chunks = ProblemChunks::new();
    let mut current_num: Option<String> = None;
    let mut buffer: Vec<String> = Vec::new();

    let flush = |chunks: &mut ProblemChunks, current_num: &Option<String>, buffer: &mut Vec<String>| {
        if let Some(num) = current_num {
            let content = buffer.join("\n").trim().to_string();
            if !content.is_empty() {
                chunks.insert(num.clone(), content);
            }
        }
        buffer.clear();
    };

    for line in text.lines() {
        if let Some(caps) = PROBLEM_HEADING_RE.captures(line.trim()) {
            flush(&mut chunks, &current_num, &mut buffer);
            current_num = Some(caps[1].to_string());
            buffer.push(line.to_string());
            let trailing = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
            if !trailing.is_empty() {
                buffer.push(trailing.to_string());
            }
            continue;
        }
        buffer.push(line.to_string());
    }
    flush(&mut chunks, &current_num, &mut buffer);
    chunks
}

/// 저장용 문단 정규화.
///
/// 구조 마커 줄(목차/번호 매김)은 제 줄을 유지하고, 연속된 일반 줄은
/// 공백 하나로 이어붙여 한 문단으로 만든다. `제N조/항/호` 로 시작하는
/// 조문 인용 줄은 숫자 마커처럼 보여도 일반 본문으로 취급한다.
pub fn normalize_paragraphs(text: &str) -> String {
    let mut output: Vec<String> = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    let flush = |output: &mut Vec<String>, paragraph: &mut Vec<&str>| {
        if !paragraph.is_empty() {
            output.push(paragraph.join(" "));
            paragraph.clear();
        }
    };

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            flush(&mut output, &mut paragraph);
            continue;
        }
        if is_structural_line(trimmed) {
            flush(&mut output, &mut paragraph);
            output.push(trimmed.to_string());
        } else {
            paragraph.push(trimmed);
        }
    }
    flush(&mut output, &mut paragraph);
    output.join("\n")
}

fn is_structural_line(line: &str) -> bool {
    if STATUTE_PREFIX_RE.is_match(line) {
        return false;
    }
    PROBLEM_HEADING_RE.is_match(line) && line.starts_with('[')
        || STRUCTURAL_MARKER_RE.is_match(line)
}

/// 답안 텍스트 전체를 파싱해 청크와 통계를 묶는다
pub fn parse_answer_text(text: &str) -> ParsedAnswer {
    let normalized = text.trim().to_string();
    let line_count = normalized.lines().filter(|l| !l.trim().is_empty()).count();
    let problem_chunks = split_by_problem_headings(&normalized);
    let stats = AnswerStats {
        char_count: normalized.chars().count(),
        line_count,
        problem_count: problem_chunks.len(),
    };
    ParsedAnswer {
        text: normalized,
        problem_chunks,
        stats,
    }
}
