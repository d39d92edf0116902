pub mod answer;
pub mod grade;
pub mod section;

pub use answer::{AnswerStats, ParsedAnswer, ProblemChunks};
pub use grade::{
    judgment_from_value, Deduction, GradeResult, ScoreDetail, SectionJudgment, WritingStatus,
};
pub use section::{ParsedRubric, Problem, RubricContext, RubricMeta, Section};
