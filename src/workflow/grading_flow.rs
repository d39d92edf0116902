//! 채점 흐름 - 흐름층
//!
//! 핵심 책임: "답안 한 부"의 전체 채점 흐름 정의
//!
//! 흐름 순서:
//! 1. 기준표 구조화 → 기본 채점 (여기까지는 동기/순수)
//! 2. (선택) 외부 판정 → 병합
//!
//! 자원을 직접 쥐지 않고 업무 능력(services)에만 의존한다. 판정자는
//! 타입 파라미터로 주입받아 테스트에서는 고정 판정 대역을 꽂는다.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{GradeResult, ParsedRubric};
use crate::services::grading::grade_basic;
use crate::services::judge::SectionJudge;
use crate::services::merging::merge_judgments;
use crate::services::rubric_parser::{parse_rubric, Table};

/// 채점 흐름
pub struct GradingFlow<J: SectionJudge> {
    judge: J,
    config: Config,
}

impl<J: SectionJudge> GradingFlow<J> {
    pub fn new(judge: J, config: Config) -> Self {
        Self { judge, config }
    }

    /// 기준표 텍스트(와 선택적 표 그리드)를 구조화한다
    pub fn parse_rubric(&self, rubric_text: &str, tables: Option<&[Table]>) -> ParsedRubric {
        let rubric = parse_rubric(rubric_text, tables);
        info!(
            "기준표 구조화 완료: 문제 {}개, 섹션 {}개",
            rubric.problems.len(),
            rubric.meta.total_sections
        );
        rubric
    }

    /// 규칙 기반 기본 채점만 수행한다 (네트워크 없음)
    pub fn grade_basic(&self, rubric: &ParsedRubric, student_text: &str) -> GradeResult {
        grade_basic(rubric, student_text, &self.config)
    }

    /// 기본 채점 뒤 외부 판정을 받아 병합한다.
    ///
    /// 판정 호출이 실패하면 경고만 남기고 기본 채점 결과를 그대로
    /// 돌려준다. 채점이 죽는 일은 없다.
    pub async fn grade_hybrid(
        &self,
        rubric: &ParsedRubric,
        model_text: &str,
        student_text: &str,
    ) -> GradeResult {
        let baseline = self.grade_basic(rubric, student_text);
        debug!("기본 채점 완료: {}", baseline.human_note);

        let judgments = match self
            .judge
            .judge_sections(&rubric.sections, model_text, student_text)
            .await
        {
            Ok(judgments) => judgments,
            Err(e) => {
                warn!("외부 판정 실패, 기본 채점 결과로 대체: {}", e);
                return baseline;
            }
        };
        info!("외부 판정 {}건 수신, 병합 시작", judgments.len());

        merge_judgments(
            &baseline,
            &judgments,
            &rubric.sections,
            student_text,
            &self.config,
        )
    }
}
