//! 조문/판례 인용 추출기
//!
//! 순수 함수: 텍스트를 받아 조문 인용과 판례 인용 리스트를 돌려준다.
//! 목차 파싱과 섞지 않고 목차가 완성된 뒤 2차 패스로 적용한다.

use regex::Regex;
use std::sync::LazyLock;

/// 조문 패턴. 법전 이름이 붙은 형태를 먼저 수집한다.
static ARTICLE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"민법\s*제\s*\d+조(?:\s*제\s*\d+항)?").unwrap(),
        Regex::new(r"제\s*\d+조(?:\s*제\s*\d+항)?").unwrap(),
    ]
});

/// 판례 패턴: 사건번호형과 선고일자 포함형
static CASE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"대판\s*\d{4}다\d+").unwrap(),
        Regex::new(r"대판\s*\d{4}\.\d{1,2}\.\d{1,2},?\s*\d{2,4}다\d+").unwrap(),
        Regex::new(r"대법원\s*\d{4}다\d+").unwrap(),
    ]
});

/// 최초 등장 순서를 유지하며 중복 제거
fn unique_keep_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut ordered = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            ordered.push(item);
        }
    }
    ordered
}

/// 조문 인용 추출
pub fn extract_articles(text: &str) -> Vec<String> {
    let mut results = Vec::new();
    for re in ARTICLE_RES.iter() {
        results.extend(re.find_iter(text).map(|m| m.as_str().to_string()));
    }
    unique_keep_order(results)
}

/// 판례 인용 추출
pub fn extract_cases(text: &str) -> Vec<String> {
    let mut results = Vec::new();
    for re in CASE_RES.iter() {
        results.extend(re.find_iter(text).map(|m| m.as_str().to_string()));
    }
    unique_keep_order(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_articles_with_code_name() {
        let articles = extract_articles("민법 제750조에 의한 손해배상과 제393조 제1항의 통상손해");
        // 법전 이름이 붙은 패턴이 먼저 수집된다
        assert_eq!(articles[0], "민법 제750조");
        assert!(articles.contains(&"제393조 제1항".to_string()));
    }

    #[test]
    fn test_extract_articles_dedup_keeps_first_occurrence() {
        let articles = extract_articles("제390조, 다시 제390조, 그리고 제391조");
        assert_eq!(articles, vec!["제390조", "제391조"]);
    }

    #[test]
    fn test_extract_cases() {
        let cases = extract_cases("대판 2010다12345 및 대법원 2015다6789 참조");
        assert_eq!(cases, vec!["대판 2010다12345", "대법원 2015다6789"]);
    }

    #[test]
    fn test_extract_cases_with_full_date() {
        let cases = extract_cases("대판 2020.5.14, 2019다12345 에 따르면");
        // 사건번호형 패턴은 연도 뒤에 바로 '다' 가 와야 하므로 일자형만 잡힌다
        assert_eq!(cases, vec!["대판 2020.5.14, 2019다12345"]);
    }

    #[test]
    fn test_no_citations() {
        assert!(extract_articles("조문 인용이 없는 문장").is_empty());
        assert!(extract_cases("판례 인용이 없는 문장").is_empty());
    }
}
