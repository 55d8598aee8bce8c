//! Quarry Relevance - which files matter for a task
//!
//! Turns a free-text task into a ranked, path-unique list of files:
//! classify the task, pull keywords, let each matching rule propose
//! candidates from the loader and cache, keep the best priority per path,
//! then load content until the token budget runs out.
//!
//! Scores and categories are heuristics over names and paths. Nothing
//! here understands code.

mod budget;
mod classify;
mod engine;
mod keywords;
mod rules;
mod score;
mod types;

pub use budget::{ContentBudget, TRUNCATION_MARKER};
pub use classify::{classify_task, TaskType};
pub use engine::{rank, RelevanceEngine};
pub use keywords::extract_keywords;
pub use rules::Candidate;
pub use score::score;
pub use types::{RelevanceRequest, RelevantContext, RelevantFile};
