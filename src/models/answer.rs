use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// 문제 번호별 답안 청크. 삽입 순서를 유지한다.
///
/// 같은 번호가 다시 나오면 나중 청크가 앞의 것을 덮어쓴다
/// (답안에 번호가 중복 표기된 경우의 원래 동작).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProblemChunks(Vec<(String, String)>);

impl ProblemChunks {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, problem_num: String, text: String) {
        if let Some(entry) = self.0.iter_mut().find(|(num, _)| *num == problem_num) {
            entry.1 = text;
        } else {
            self.0.push((problem_num, text));
        }
    }

    pub fn get(&self, problem_num: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(num, _)| num == problem_num)
            .map(|(_, text)| text.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(num, text)| (num.as_str(), text.as_str()))
    }

    /// 모든 청크를 삽입 순서대로 이어붙인다 (장문 답안 fallback 용)
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Serialize for ProblemChunks {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (num, text) in &self.0 {
            map.serialize_entry(num, text)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnswerStats {
    pub char_count: usize,
    pub line_count: usize,
    pub problem_count: usize,
}

/// 답안 텍스트 파싱 결과
#[derive(Debug, Clone, Serialize)]
pub struct ParsedAnswer {
    pub text: String,
    pub problem_chunks: ProblemChunks,
    pub stats: AnswerStats,
}
