pub mod answer_parser;
pub mod grading;
pub mod heading;
pub mod judge;
pub mod merging;
pub mod references;
pub mod rubric_parser;
pub mod section_index;

pub use judge::{LlmJudge, SectionJudge};
pub use merging::merge_judgments;
pub use rubric_parser::parse_rubric;
