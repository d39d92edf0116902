use anyhow::{Context, Result};

use civil_law_grading::utils::logging;
use civil_law_grading::utils::text::normalize_text;
use civil_law_grading::{Config, GradingFlow, LlmJudge};

/// 사용법: civil_law_grading <기준표.txt> <학생답안.txt> [모범답안.txt]
///
/// LLM_API_KEY 가 설정돼 있으면 외부 판정까지 병합하고, 없으면 규칙
/// 기반 기본 채점만 수행한다. 결과는 JSON 으로 표준 출력에 쓴다.
#[tokio::main]
async fn main() -> Result<()> {
    // 로그 초기화
    logging::init_logging();

    // 설정 로딩
    let config = Config::from_env();
    logging::log_startup(&config.llm_model_name);

    let mut args = std::env::args().skip(1);
    let rubric_path = args.next().context("기준표 파일 경로가 필요합니다")?;
    let student_path = args.next().context("학생 답안 파일 경로가 필요합니다")?;
    let model_path = args.next();

    let rubric_text = normalize_text(
        &std::fs::read_to_string(&rubric_path)
            .with_context(|| format!("기준표 파일을 읽을 수 없음: {}", rubric_path))?,
    );
    let student_text = normalize_text(
        &std::fs::read_to_string(&student_path)
            .with_context(|| format!("답안 파일을 읽을 수 없음: {}", student_path))?,
    );
    let model_text = match &model_path {
        Some(path) => normalize_text(
            &std::fs::read_to_string(path)
                .with_context(|| format!("모범답안 파일을 읽을 수 없음: {}", path))?,
        ),
        None => String::new(),
    };

    let use_llm = !config.llm_api_key.is_empty();
    let flow = GradingFlow::new(LlmJudge::new(&config), config);

    let rubric = flow.parse_rubric(&rubric_text, None);
    let result = if use_llm {
        flow.grade_hybrid(&rubric, &model_text, &student_text).await
    } else {
        flow.grade_basic(&rubric, &student_text)
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
