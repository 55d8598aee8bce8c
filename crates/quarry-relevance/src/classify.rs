//! Task classification.
//!
//! A task can land in several categories at once. Category keywords match
//! as word prefixes (`test` matches `testing`); the debug, refactor and
//! create modes match whole words only.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Component,
    Hook,
    Api,
    Test,
    Config,
    Util,
    Type,
    Style,
    Debug,
    Refactor,
    Create,
    General,
}

impl TaskType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Hook => "hook",
            Self::Api => "api",
            Self::Test => "test",
            Self::Config => "config",
            Self::Util => "util",
            Self::Type => "type",
            Self::Style => "style",
            Self::Debug => "debug",
            Self::Refactor => "refactor",
            Self::Create => "create",
            Self::General => "general",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Category keyword table, matched as word prefixes.
const CATEGORY_KEYWORDS: &[(TaskType, &[&str])] = &[
    (
        TaskType::Component,
        &["component", "ui", "button", "form", "modal", "page", "view", "layout", "render", "widget"],
    ),
    (
        TaskType::Hook,
        &["hook", "usestate", "useeffect", "usememo", "usecallback", "usecontext", "composable"],
    ),
    (
        TaskType::Api,
        &["api", "endpoint", "route", "fetch", "request", "server", "handler", "rest", "graphql"],
    ),
    (TaskType::Test, &["test", "spec", "coverage", "jest", "vitest", "mock", "e2e"]),
    (
        TaskType::Config,
        &["config", "setting", "env", "setup", "dependency", "dependencies", "package"],
    ),
    (TaskType::Util, &["util", "helper", "utility", "format", "parse", "convert"]),
    (TaskType::Type, &["type", "interface", "schema", "model", "dto"]),
    (TaskType::Style, &["style", "css", "scss", "theme", "color", "tailwind", "design", "responsive"]),
];

const DEBUG_WORDS: &[&str] = &[
    "bug", "bugs", "fix", "fixes", "fixing", "error", "errors", "issue", "broken", "crash",
    "crashes", "fail", "fails", "failing", "wrong", "debug", "exception",
];

const REFACTOR_WORDS: &[&str] = &[
    "refactor", "refactoring", "clean", "cleanup", "organize", "reorganize", "restructure",
    "simplify", "rename", "extract", "split",
];

const CREATE_WORDS: &[&str] = &[
    "add", "adding", "create", "creating", "implement", "implementing", "build", "building",
    "new", "make", "introduce",
];

fn words(task: &str) -> Vec<String> {
    task.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Every category the task mentions, in table order, then the modes.
/// `General` alone when nothing matched.
pub fn classify_task(task: &str) -> Vec<TaskType> {
    let words = words(task);
    let mut types = Vec::new();

    for (task_type, keywords) in CATEGORY_KEYWORDS {
        let hit = keywords
            .iter()
            .any(|k| words.iter().any(|w| w.starts_with(k)));
        if hit {
            types.push(*task_type);
        }
    }

    let has_word = |set: &[&str]| words.iter().any(|w| set.contains(&w.as_str()));
    if has_word(DEBUG_WORDS) {
        types.push(TaskType::Debug);
    }
    if has_word(REFACTOR_WORDS) {
        types.push(TaskType::Refactor);
    }
    if has_word(CREATE_WORDS) {
        types.push(TaskType::Create);
    }

    if types.is_empty() {
        types.push(TaskType::General);
    }
    types
}
