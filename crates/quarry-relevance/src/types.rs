//! Request and result types for relevance queries.

use crate::classify::TaskType;
use serde::{Deserialize, Serialize};

/// One ranked candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevantFile {
    pub path: String,
    /// Why the file was picked, e.g. `directly_referenced`.
    pub reason: String,
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub last_modified: u64,
}

/// The outcome of a relevance query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevantContext {
    /// Path-unique, sorted by descending priority.
    pub files: Vec<RelevantFile>,
    pub summary: String,
    pub task_types: Vec<TaskType>,
    pub keywords: Vec<String>,
    /// Sum of file sizes in bytes.
    pub total_size: u64,
    pub estimated_tokens: u64,
    /// Set when a budget was given and the estimate exceeds it.
    pub truncated: bool,
}

/// Parameters for [`RelevanceEngine::get_relevant_context`](crate::RelevanceEngine::get_relevant_context).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevanceRequest {
    pub task: String,
    /// Paths the caller names explicitly.
    pub file_paths: Vec<String>,
    /// Token budget for loaded content. None loads everything.
    pub max_tokens: Option<usize>,
    pub include_tests: bool,
    pub include_configs: bool,
    pub include_dependencies: bool,
}

impl RelevanceRequest {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            file_paths: Vec::new(),
            max_tokens: None,
            include_tests: true,
            include_configs: true,
            include_dependencies: true,
        }
    }

    pub fn with_files<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn include_tests(mut self, include: bool) -> Self {
        self.include_tests = include;
        self
    }

    pub fn include_configs(mut self, include: bool) -> Self {
        self.include_configs = include;
        self
    }

    pub fn include_dependencies(mut self, include: bool) -> Self {
        self.include_dependencies = include;
        self
    }
}
