//! 입력 텍스트 정리 유틸
//!
//! PDF/OCR 추출물에서 흔한 잡음을 고친다: NUL 문자, 캐리지 리턴,
//! 겹공백, 과도한 빈 줄. 내용에는 손대지 않는다.

use regex::Regex;
use std::sync::LazyLock;

static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// 업로드된 원문 텍스트를 파서에 넣기 전에 정규화한다
pub fn normalize_text(text: &str) -> String {
    let cleaned = text.replace('\u{0000}', "");
    let cleaned = cleaned.replace("\r\n", "\n").replace('\r', "\n");
    let cleaned = SPACES_RE.replace_all(&cleaned, " ");
    let cleaned = BLANK_LINES_RE.replace_all(&cleaned, "\n\n");
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        let raw = "첫 줄\r\n둘째   줄\t탭\r\n\n\n\n셋째 줄\u{0000}  ";
        assert_eq!(normalize_text(raw), "첫 줄\n둘째 줄 탭\n\n셋째 줄");
    }

    #[test]
    fn test_normalize_text_preserves_single_blank_line() {
        assert_eq!(normalize_text("가\n\n나"), "가\n\n나");
    }
}
