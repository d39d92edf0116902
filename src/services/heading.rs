//! 목차 헤딩 분류기 - 업무 능력층
//!
//! 한 줄의 텍스트를 {로마자, 아라비아, 한글 가나다} 헤딩 중 하나로
//! 분류하고 라벨과 제목을 분리한다. 배점 `(N점)` 추출기는 별도 함수로
//! 두는데, 배점이 헤딩 줄이 아니라 뒤따르는 본문 줄에 붙는 문서가
//! 있기 때문이다.

use phf::phf_map;
use regex::Regex;
use std::sync::LazyLock;

/// 원문자/로마자 유니코드 글리프 → ASCII 로마자
static ROMAN_UNICODE_MAP: phf::Map<char, &'static str> = phf_map! {
    'Ⅰ' => "I",
    'Ⅱ' => "II",
    'Ⅲ' => "III",
    'Ⅳ' => "IV",
    'Ⅴ' => "V",
    'Ⅵ' => "VI",
    'Ⅶ' => "VII",
    'Ⅷ' => "VIII",
    'Ⅸ' => "IX",
    'Ⅹ' => "X",
};

/// 헤딩 분류 규칙. 순서가 곧 우선순위다 (first match wins).
///
/// 패턴들이 상호 배타가 아니므로 이 순서 자체가 불변식이다:
/// 로마자 → 아라비아 → 한글. 아라비아 규칙은 `.` 뒤 공백 하나 이상과
/// 숫자로 시작하지 않는 제목을 요구해서 "10. 제목" 과 줄머리의 우연한
/// 숫자 나열을 구분한다.
static HEADING_RULES: LazyLock<Vec<(u8, Regex)>> = LazyLock::new(|| {
    vec![
        (1, Regex::new(r"^([ⅠⅡⅢⅣⅤⅥⅦⅧⅨⅩ]+|[IVX]+)\.\s*(.*)$").unwrap()),
        (2, Regex::new(r"^(\d+)\.\s+([^0-9].*)$").unwrap()),
        (3, Regex::new(r"^([가나다라마바사아자차카타파하])\.\s*(.*)$").unwrap()),
    ]
});

static POINTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+(?:\.\d+)?)\s*점\)").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static PAGE_MARKER_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"^--\s*\d+\s*of\s*\d+\s*--$").unwrap(),
        Regex::new(r"^-+\s*\d+\s*-+$").unwrap(),
    ]
});

/// 분류된 헤딩
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub label: String,
    pub title: String,
}

/// 공백 정규화: 연속 공백을 하나로 줄이고 양끝을 잘라낸다
pub fn clean_line(line: &str) -> String {
    WHITESPACE_RE.replace_all(line, " ").trim().to_string()
}

/// PDF 추출물에 섞여 들어오는 페이지 번호 줄인지 판별
pub fn is_page_marker(line: &str) -> bool {
    PAGE_MARKER_RES.iter().any(|re| re.is_match(line))
}

/// 유니코드 로마자 글리프를 ASCII 로 정규화한다 ("ⅡⅢ" → "IIIII" 가 아니라
/// 글리프 단위 치환이므로 "Ⅱ" → "II"). 이미 ASCII 면 그대로.
pub fn normalize_roman(label: &str) -> String {
    label
        .chars()
        .map(|c| match ROMAN_UNICODE_MAP.get(&c) {
            Some(ascii) => (*ascii).to_string(),
            None => c.to_string(),
        })
        .collect()
}

/// 한 줄을 헤딩으로 분류한다. 헤딩이 아니면 None (본문 연속으로 취급).
pub fn detect_heading(line: &str) -> Option<Heading> {
    let line = clean_line(line);
    for (level, re) in HEADING_RULES.iter() {
        if let Some(caps) = re.captures(&line) {
            let raw_label = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let title = caps.get(2).map(|m| m.as_str()).unwrap_or_default().trim().to_string();
            let label = if *level == 1 {
                normalize_roman(raw_label)
            } else {
                raw_label.to_string()
            };
            return Some(Heading {
                level: *level,
                label,
                title,
            });
        }
    }
    None
}

/// 텍스트에서 `(N점)` 배점을 찾는다. 없으면 None.
pub fn extract_points(text: &str) -> Option<f64> {
    POINTS_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// `(N점)` 표기를 지운 텍스트를 돌려준다
pub fn strip_points(text: &str) -> String {
    POINTS_RE.replace_all(text, "").trim().to_string()
}
