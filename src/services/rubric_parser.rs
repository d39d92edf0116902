//! 채점기준표 파서 - 업무 능력층
//!
//! 느슨한 개요 텍스트(로마자 → 아라비아 → 한글 가나다, 각 항목에 배점
//! 표기 가능)를 점 구분 id 를 가진 섹션 리스트로 바꾼다.
//!
//! 경로 스택은 전역 상태가 아니라 파싱 루프 안의 지역 값이다. 문제
//! 헤딩에서 `[문제번호]` 로 리셋되고, 레벨 L 헤딩마다 L 칸까지 잘라낸
//! 뒤 덮어쓴다. 중간 레벨을 건너뛴 문서는 빈 플레이스홀더로 버티고,
//! id 를 만들 때 빈 칸은 제외한다.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::models::{ParsedRubric, Problem, RubricContext, RubricMeta, Section};
use crate::services::heading::{
    clean_line, detect_heading, extract_points, is_page_marker, strip_points,
};
use crate::services::references::{extract_articles, extract_cases};

/// 표 기반 기준표 한 장: 행 × 셀
pub type Table = Vec<Vec<String>>;

static PROBLEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[문제\s*(\d+)\.에\s*관하여\]\s*(?:\((\d+(?:\.\d+)?)점\))?\s*(.*)").unwrap()
});

static EXAM_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[제\s*\d+\s*문\]").unwrap());

static FACT_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?:사실관계|추가된 사실관계|변형된 사실관계)[^>]*>").unwrap()
});

static BARE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{1,2})\b").unwrap());

/// 채점기준표 텍스트(와 선택적 표 그리드)를 파싱한다.
///
/// 프로즈 경로가 우선이고, 거기서 섹션이 하나도 안 나왔는데 표가
/// 있으면 표 경로로 넘어간다. 어느 경로든 섹션 모양과 불변식은 같다.
pub fn parse_rubric(text: &str, tables: Option<&[Table]>) -> ParsedRubric {
    let mut parsed = parse_rubric_text(text);
    if parsed.sections.is_empty() {
        if let Some(tables) = tables {
            if !tables.is_empty() {
                debug!("프로즈 경로에서 섹션 없음, 표 경로로 전환 (표 {}장)", tables.len());
                let mut sections = parse_table_sections(tables);
                decorate_references(&mut sections);
                parsed.meta.total_sections = sections.len();
                parsed.sections = sections;
            }
        }
    }
    parsed
}

/// 프로즈 텍스트만으로 기준표를 파싱한다
pub fn parse_rubric_text(text: &str) -> ParsedRubric {
    let cleaned: Vec<String> = text.lines().map(clean_line).collect();
    let start = find_start_index(&cleaned);
    let lines: Vec<String> = cleaned[start..]
        .iter()
        .filter(|line| !line.is_empty())
        .cloned()
        .collect();

    let full_text = lines.join("\n");
    let context = RubricContext {
        fact_patterns: extract_fact_patterns(&full_text),
        questions: extract_questions(&lines),
    };

    let mut problems: Vec<Problem> = Vec::new();
    let mut path_stack: Vec<String> = Vec::new();

    for line in &lines {
        if is_page_marker(line) {
            continue;
        }

        if let Some(caps) = PROBLEM_RE.captures(line) {
            let problem_num = caps[1].to_string();
            let total_points = caps.get(2).and_then(|m| m.as_str().parse().ok());
            let trailing = caps
                .get(3)
                .map(|m| m.as_str().trim_matches(|c| c == ' ' || c == '-'))
                .unwrap_or("");
            problems.push(Problem {
                problem_num: problem_num.clone(),
                total_points,
                intro: (!trailing.is_empty()).then(|| trailing.to_string()),
                sections: Vec::new(),
            });
            path_stack = vec![problem_num];
            continue;
        }

        // 첫 문제 헤딩이 나오기 전의 줄은 컨텍스트로만 쓰인다
        let Some(problem) = problems.last_mut() else {
            continue;
        };

        if let Some(heading) = detect_heading(line) {
            let points = extract_points(&heading.title);
            let title = strip_points(&heading.title);
            let level = heading.level as usize;

            // 스택 인덱스 0 은 문제 번호, 레벨 L 헤딩은 칸 L 에 들어간다
            if path_stack.len() > level {
                path_stack.truncate(level + 1);
            }
            while path_stack.len() <= level {
                path_stack.push(String::new());
            }
            path_stack[level] = heading.label.clone();
            let id = join_path(&path_stack);

            problem.sections.push(Section {
                id,
                level: heading.level,
                label: heading.label,
                title,
                content: String::new(),
                points,
                problem_num: problem.problem_num.clone(),
                articles: Vec::new(),
                cases: Vec::new(),
            });
            continue;
        }

        // 헤딩이 아닌 줄은 열려 있는 섹션의 본문으로 이어붙인다
        if let Some(section) = problem.sections.last_mut() {
            let mut line_text = line.clone();
            // 배점이 헤딩 줄이 아니라 본문 줄에 붙은 문서 대응:
            // 소급 부착하고 본문에서는 표기를 지운다
            if section.points.is_none() {
                if let Some(points) = extract_points(line) {
                    section.points = Some(points);
                    line_text = strip_points(line);
                }
            }
            if line_text.is_empty() {
                continue;
            }
            if section.content.is_empty() {
                section.content = line_text;
            } else {
                section.content.push('\n');
                section.content.push_str(&line_text);
            }
        }
    }

    for problem in &mut problems {
        decorate_references(&mut problem.sections);
    }
    let sections: Vec<Section> = problems
        .iter()
        .flat_map(|p| p.sections.iter().cloned())
        .collect();

    debug!(
        "기준표 파싱 완료: 문제 {}개, 섹션 {}개",
        problems.len(),
        sections.len()
    );

    ParsedRubric {
        context,
        meta: RubricMeta {
            total_sections: sections.len(),
        },
        problems,
        sections,
    }
}

/// 표 그리드에서 섹션을 뽑는다.
///
/// 각 행의 첫 셀을 헤딩 분류하고 나머지 셀은 본문으로 합친다. 배점은
/// 행 어디든 `(N점)` 표기가 우선이고, 없으면 나머지 셀의 1–2자리
/// 숫자를 배점으로 본다.
pub fn parse_table_sections(tables: &[Table]) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut path_stack: Vec<String> = Vec::new();

    for table in tables {
        for row in table {
            if row.is_empty() {
                continue;
            }
            let cells: Vec<String> = row.iter().map(|c| c.trim().to_string()).collect();
            let row_text = cells
                .iter()
                .filter(|c| !c.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(" ");
            if row_text.is_empty() {
                continue;
            }

            let head_source = if cells[0].is_empty() { &row_text } else { &cells[0] };
            let Some(heading) = detect_heading(head_source) else {
                continue;
            };

            let level = heading.level as usize;
            if path_stack.len() < level {
                path_stack.resize(level, String::new());
            }
            path_stack[level - 1] = heading.label.clone();
            path_stack.truncate(level);
            let id = join_path(&path_stack);

            let remaining = cells[1..]
                .iter()
                .filter(|c| !c.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(" ");

            let mut points = extract_points(&row_text).or_else(|| extract_points(&remaining));
            if points.is_none() {
                points = BARE_NUMBER_RE
                    .captures(&remaining)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse().ok());
            }

            sections.push(Section {
                id,
                level: heading.level,
                label: heading.label,
                title: strip_points(&heading.title),
                content: remaining,
                points,
                problem_num: String::new(),
                articles: Vec::new(),
                cases: Vec::new(),
            });
        }
    }
    sections
}

/// 목차가 끝난 뒤 2차 패스로 각 섹션에 인용을 붙인다
fn decorate_references(sections: &mut [Section]) {
    for section in sections {
        let combined = section.combined_text();
        section.articles = extract_articles(&combined);
        section.cases = extract_cases(&combined);
    }
}

fn join_path(path_stack: &[String]) -> String {
    path_stack
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(".")
}

/// 기준표 본문이 시작하는 줄을 찾는다 (앞쪽 표지/안내문 제거)
fn find_start_index(lines: &[String]) -> usize {
    for (idx, line) in lines.iter().enumerate() {
        if EXAM_MARKER_RE.is_match(line)
            || line.starts_with("<문제>")
            || line.starts_with("<사실관계>")
            || PROBLEM_RE.is_match(line)
        {
            return idx;
        }
    }
    0
}

/// `<사실관계>` 계열 마커 뒤의 텍스트를 다음 `<문제>` / `[문제` 마커
/// 직전까지 잘라 모은다. 한 구간에 삼켜진 마커는 건너뛴다.
fn extract_fact_patterns(full_text: &str) -> Vec<String> {
    let mut patterns = Vec::new();
    let mut consumed_until = 0usize;

    for marker in FACT_MARKER_RE.find_iter(full_text) {
        if marker.start() < consumed_until {
            continue;
        }
        let rest = &full_text[marker.end()..];
        let end = ["<문제>", "[문제"]
            .iter()
            .filter_map(|stop| rest.find(stop))
            .min()
            .unwrap_or(rest.len());
        patterns.push(rest[..end].to_string());
        consumed_until = marker.end() + end;
    }
    patterns
}

/// `<문제>` 로 열리고 문제 헤딩에서 닫히는 설문 블록을 모은다
fn extract_questions(lines: &[String]) -> Vec<String> {
    let mut questions = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut in_question = false;

    for line in lines {
        if is_page_marker(line) {
            continue;
        }
        if line.starts_with("<문제>") {
            if in_question && !buffer.is_empty() {
                questions.push(buffer.join("\n").trim().to_string());
            }
            in_question = true;
            buffer = vec![line];
            continue;
        }
        if PROBLEM_RE.is_match(line) {
            if in_question && !buffer.is_empty() {
                questions.push(buffer.join("\n").trim().to_string());
            }
            in_question = false;
            buffer.clear();
            continue;
        }
        if in_question {
            buffer.push(line);
        }
    }
    if in_question && !buffer.is_empty() {
        questions.push(buffer.join("\n").trim().to_string());
    }
    questions
}
