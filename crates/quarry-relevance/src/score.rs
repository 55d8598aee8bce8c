//! Name-to-task similarity.

/// Splits on non-alphanumerics and camelCase humps, lower-cased.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in text.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn acronym(text: &str) -> String {
    tokenize(text)
        .iter()
        .filter_map(|t| t.chars().next())
        .collect()
}

/// Scores how well `target` (a file or component name) matches `query`
/// (usually the raw task), from 0.0 to 1.0.
///
/// 1.0 for a case-insensitive exact match, 0.8 when one contains the
/// other, else the share of query tokens found among the target's tokens,
/// else 0.5 when one side's initials prefix the other.
pub fn score(target: &str, query: &str) -> f64 {
    let target_lower = target.to_lowercase();
    let query_lower = query.to_lowercase();
    if target_lower.is_empty() || query_lower.is_empty() {
        return 0.0;
    }
    if target_lower == query_lower {
        return 1.0;
    }
    if target_lower.contains(&query_lower) || query_lower.contains(&target_lower) {
        return 0.8;
    }

    let target_tokens = tokenize(target);
    let query_tokens = tokenize(query);
    let shared = query_tokens
        .iter()
        .filter(|t| target_tokens.contains(t))
        .count();
    if shared > 0 {
        return shared as f64 / query_tokens.len().max(1) as f64;
    }

    let target_acronym = acronym(target);
    let query_acronym = acronym(query);
    if (target_acronym.len() >= 2 && query_lower.starts_with(&target_acronym))
        || (query_acronym.len() >= 2 && target_lower.starts_with(&query_acronym))
    {
        return 0.5;
    }
    0.0
}
