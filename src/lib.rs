//! # Civil Law Grading
//!
//! 민법 사례형 답안 자동 채점 엔진
//!
//! ## 아키텍처 설계
//!
//! 본 시스템은 엄격한 3층 구조를 따른다:
//!
//! ### ① 모델층 (Models)
//! - `models/` - 섹션/판정/결과 레코드, 전부 불변 데이터
//! - `Section` - 점 구분 id 로 계층을 표현하는 기준표 항목
//! - `SectionJudgment` - 외부 판정 한 건 (soft 파싱)
//! - `GradeResult` - 최종 채점 결과
//!
//! ### ② 업무 능력층 (Services)
//! - `services/` - "내가 할 수 있는 일"만 기술, 흐름을 모른다
//! - `rubric_parser` - 기준표 텍스트/표 → 섹션 트리 구조화
//! - `answer_parser` - 답안을 문제 번호별 청크로 분할
//! - `grading` - 규칙 기반 기본 채점
//! - `judge` - LLM 판정 능력 (trait 로 추상화)
//! - `merging` - 기본 채점 + 외부 판정 병합/정규화
//!
//! ### ③ 흐름층 (Workflow)
//! - `workflow/` - "답안 한 부"의 전체 채점 흐름 정의
//! - `GradingFlow` - 구조화 → 기본 채점 → 판정 → 병합 편성
//!
//! 채점 코어는 순수 함수 조합이고 네트워크 호출은 판정 구현체 안에만
//! 있다. 저장/웹 계층은 이 crate 바깥의 협력자다.

pub mod config;
pub mod error;

pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 자주 쓰는 타입 재수출
pub use config::Config;
pub use error::{GradeError, Result};
pub use models::{GradeResult, ParsedRubric, ScoreDetail, Section, SectionJudgment};
pub use services::{parse_rubric, LlmJudge, SectionJudge};
pub use workflow::GradingFlow;
