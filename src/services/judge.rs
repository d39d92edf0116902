//! 외부 판정(LLM) 서비스 - 업무 능력층
//!
//! "섹션별 정성 판정" 능력만 담당하고 흐름은 모른다
//!
//! ## 기술 스택
//! - `async-openai` crate 로 API 호출
//! - OpenAI 호환 엔드포인트 지원 (Gemini OpenAI 호환 모드 등)
//!
//! 판정은 trait 로 추상화한다. 병합/집계 로직은 판정 구현체를 모르고,
//! 테스트에서는 고정 판정을 돌려주는 대역을 꽂는다.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{GradeError, Result};
use crate::models::{judgment_from_value, Deduction, Section, SectionJudgment, WritingStatus};
use crate::services::answer_parser::split_by_problem_headings;
use crate::services::grading::select_problem_text;
use crate::services::section_index::is_llm_relevant_section;

static DOTS_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\.·…\s]+$").unwrap());
static JAMO_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ㄱ-ㅎㅏ-ㅣ]+$").unwrap());
static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w가-힣]").unwrap());
static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^```json\s*|^```\s*|```$").unwrap());

/// 섹션별 정성 판정 능력.
///
/// 계약: leaf 이고 배점이 있는 섹션들에 대해 섹션당 판정 하나를
/// 돌려준다. 일부가 비거나 누락돼도 소비자(병합)는 동작해야 한다.
pub trait SectionJudge {
    fn judge_sections(
        &self,
        sections: &[Section],
        model_text: &str,
        student_text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<SectionJudgment>>> + Send;
}

/// LLM 기반 판정 구현
pub struct LlmJudge {
    client: Client<OpenAIConfig>,
    config: Config,
}

impl LlmJudge {
    pub fn new(config: &Config) -> Self {
        // OpenAI 호환 엔드포인트 클라이언트 설정
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            config: config.clone(),
        }
    }

    /// 기본 LLM 호출. 다른 판정 기능은 전부 이 함수 위에서 구현한다.
    async fn send_to_llm(&self, user_message: &str, system_message: &str) -> Result<String> {
        let model = &self.config.llm_model_name;
        debug!("LLM API 호출, 모델: {}", model);
        debug!("사용자 메시지 길이: {} 자", user_message.chars().count());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_message)
            .build()
            .map_err(|e| GradeError::llm(model, e))?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| GradeError::llm(model, e))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.2)
            .max_tokens(4096u32)
            .build()
            .map_err(|e| GradeError::llm(model, e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 호출 실패: {}", e);
            GradeError::llm(model, e)
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| GradeError::EmptyLlmResponse {
                model: model.clone(),
            })?;

        Ok(content.trim().to_string())
    }

    /// 배치 하나(한 문제의 leaf 섹션들)를 재시도 포함으로 판정한다
    async fn judge_batch(
        &self,
        batch: &[&Section],
        batch_prompt: &str,
        system_instruction: &str,
        problem_text: &str,
    ) -> Vec<SectionJudgment> {
        let user_message = format!("[학생 답안 전문]\n{}\n\n{}", problem_text, batch_prompt);

        let mut attempt: u32 = 0;
        loop {
            debug!("LLM 호출 시도 {} / {}", attempt + 1, self.config.llm_retries + 1);
            match self.send_to_llm(&user_message, system_instruction).await {
                Ok(raw_text) => match parse_batch_response(&raw_text, batch) {
                    Some(judgments) => return judgments,
                    None => {
                        warn!("LLM 응답에서 JSON 을 찾지 못함 (길이 {})", raw_text.len());
                        if attempt >= self.config.llm_retries {
                            return exhausted_judgments(batch, &raw_text);
                        }
                    }
                },
                Err(e) => {
                    warn!("LLM 판정 실패 (시도 {}): {}", attempt + 1, e);
                    if attempt >= self.config.llm_retries {
                        return exhausted_judgments(batch, &e.to_string());
                    }
                }
            }
            let wait = self.config.llm_backoff_secs * (attempt + 1) as f64;
            tokio::time::sleep(Duration::from_secs_f64(wait)).await;
            attempt += 1;
        }
    }
}

impl SectionJudge for LlmJudge {
    async fn judge_sections(
        &self,
        sections: &[Section],
        model_text: &str,
        student_text: &str,
    ) -> Result<Vec<SectionJudgment>> {
        let cleaned_student = student_text.trim();
        let cleaned_model = model_text.trim();

        // 채점 대상 필터링 (배점 있는 leaf 만)
        let targets: Vec<&Section> = sections
            .iter()
            .filter(|s| is_llm_relevant_section(s, sections))
            .collect();
        debug!(
            "전체 섹션 {}개 중 판정 대상 {}개",
            sections.len(),
            targets.len()
        );
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let system_instruction = build_system_instruction(cleaned_model);
        let chunks = split_by_problem_headings(cleaned_student);

        // 문제 번호별 배치 분할 (최초 등장 순서 유지)
        let mut batches: Vec<(String, Vec<&Section>)> = Vec::new();
        for section in &targets {
            let num = section.problem_num.clone();
            match batches.iter_mut().find(|(n, _)| *n == num) {
                Some((_, batch)) => batch.push(section),
                None => batches.push((num, vec![section])),
            }
        }
        debug!("문제 배치 {}개로 분할", batches.len());

        let mut results = Vec::new();
        for (problem_num, batch) in &batches {
            debug!("문제 {} 판정: 섹션 {}개", problem_num, batch.len());
            let problem_text =
                select_problem_text(batch[0], &chunks, cleaned_student, &self.config);

            if is_meaningless_text(&problem_text) {
                debug!("문제 {}: 의미 없는 입력, LLM 호출 생략", problem_num);
                results.extend(batch.iter().map(|s| meaningless_judgment(s)));
                continue;
            }

            let batch_prompt = build_batch_prompt(batch);
            results.extend(
                self.judge_batch(batch, &batch_prompt, &system_instruction, &problem_text)
                    .await,
            );
        }
        Ok(results)
    }
}

/// 시스템 인스트럭션. 모범답안이 있으면 앞부분을 발췌해 끼운다.
fn build_system_instruction(model_text: &str) -> String {
    let model_section = if model_text.is_empty() {
        String::new()
    } else {
        let excerpt: String = model_text.chars().take(2000).collect();
        format!("\n[채점 기준표 참고]\n{}\n", excerpt)
    };

    format!(
        r#"너는 베테랑 변호사시험 채점 교수다. 학생의 답안 완성도를 엄격히 평가하라.

**[채점 항목별 상태 판별 규칙]**
1. **Missing (0.0점)**: 해당 항목에 대한 언급이 아예 없거나, '.', 'ㄴㄴ' 같은 의미 없는 문자만 있는 경우.
2. **Incomplete (감점)**: 서술을 시작했으나 결론을 내지 못했거나, 논리가 중간에 끊긴 경우.
3. **Full (정상 채점)**: 논리적 완결성을 갖추고, 판례를 바탕으로 대입하여 채점기준표와 유사하고 정확하게 서술함.

**[강조 사항]**
- **[근거 문장 필수]**: 반드시 **'학생 답안'에서 그대로 복사한 문장 1~2개만** evidence 에 넣어라. 채점기준표/문제지의 문장 인용 금지. 근거를 찾을 수 없다면 `is_written: false`, `score: 0.0`, `evidence: ["X"]` 로 응답하라.
- **[목차 유연성]**: 학생이 번호/소제목을 잘못 표기해도 내용의 실질이 일치하면 인정{}

출력 형식: 반드시 아래 스키마의 순수 JSON 리스트로만 응답하라. 코드블록, 추가 설명 금지.
[
  {{"section_id": "...", "writing_status": "Missing|Incomplete|Full", "is_written": true, "score": 0.0, "evidence": ["학생 답안 문장1"], "deductions": [{{"reason": "...", "penalty": 0.0}}], "note": "..."}}
]"#,
        model_section
    )
}

/// 배치별 채점 기준 나열 (매 호출마다 다르다)
fn build_batch_prompt(batch: &[&Section]) -> String {
    let rubric_items: Vec<String> = batch
        .iter()
        .map(|s| {
            format!(
                "[{}] {}: {} ({}점)",
                s.id,
                s.title,
                s.content,
                s.points.unwrap_or(0.0)
            )
        })
        .collect();
    format!(
        "[채점 기준 리스트 - {}개 항목]\n{}\n\n위 항목들을 학생 답안에서 찾아 채점하라.",
        batch.len(),
        rubric_items.join("\n")
    )
}

/// 의미 없는 입력인지: 빈 텍스트, 점/말줄임표만, 자모만, 기호만
pub fn is_meaningless_text(text: &str) -> bool {
    let stripped = text.trim();
    if stripped.is_empty() {
        return true;
    }
    if DOTS_ONLY_RE.is_match(stripped) || JAMO_ONLY_RE.is_match(stripped) {
        return true;
    }
    NON_WORD_RE.replace_all(stripped, "").is_empty()
}

/// 의미 없는 입력에 대한 즉석 Missing 판정
fn meaningless_judgment(section: &Section) -> SectionJudgment {
    SectionJudgment {
        section_id: section.id.clone(),
        writing_status: WritingStatus::Missing,
        is_written: false,
        score: 0.0,
        evidence: Vec::new(),
        deductions: vec![Deduction {
            reason: "의미 없는 텍스트 입력".to_string(),
            penalty: section.points.unwrap_or(0.0),
        }],
        note: "의미 없는 입력(., ㄴㄴ 등)으로 미작성 처리".to_string(),
        is_ambiguous: false,
    }
}

/// 재시도 소진 시의 강등 판정: 0점 + 모호 플래그, 병합은 계속 진행된다
fn exhausted_judgments(batch: &[&Section], raw_text: &str) -> Vec<SectionJudgment> {
    let note: String = raw_text.chars().take(500).collect();
    batch
        .iter()
        .map(|s| SectionJudgment {
            section_id: s.id.clone(),
            writing_status: WritingStatus::Full,
            is_written: true,
            score: 0.0,
            evidence: Vec::new(),
            deductions: Vec::new(),
            note: note.clone(),
            is_ambiguous: true,
        })
        .collect()
}

/// 응답 텍스트에서 JSON 본문을 찾는다.
///
/// 코드펜스를 벗겨낸 뒤 리스트 괄호를 우선으로, 없으면 객체 괄호로
/// 가장 바깥 구간을 잘라낸다.
pub fn extract_json(text: &str) -> Option<String> {
    let cleaned = text.trim();
    if cleaned.is_empty() {
        return None;
    }
    let cleaned = CODE_FENCE_RE.replace_all(cleaned, "");
    let cleaned = cleaned.trim();

    if (cleaned.starts_with('[') && cleaned.ends_with(']'))
        || (cleaned.starts_with('{') && cleaned.ends_with('}'))
    {
        return Some(cleaned.to_string());
    }
    if let (Some(start), Some(end)) = (cleaned.find('['), cleaned.rfind(']')) {
        if end > start {
            return Some(cleaned[start..=end].to_string());
        }
    }
    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if end > start {
            return Some(cleaned[start..=end].to_string());
        }
    }
    None
}

/// 응답을 배치 순서대로 판정 목록으로 바꾼다. JSON 을 못 찾으면 None
/// (재시도 대상), 개별 항목 파싱 실패는 soft fallback 으로 흡수한다.
fn parse_batch_response(raw_text: &str, batch: &[&Section]) -> Option<Vec<SectionJudgment>> {
    let json_text = extract_json(raw_text)?;
    let value: serde_json::Value = serde_json::from_str(&json_text).ok()?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };

    let mut judgments = Vec::with_capacity(batch.len());
    for (index, section) in batch.iter().enumerate() {
        match items.get(index) {
            Some(item) => judgments.push(judgment_from_value(item.clone(), &section.id)),
            None => judgments.push(SectionJudgment::parse_fallback(&section.id)),
        }
    }
    Some(judgments)
}
