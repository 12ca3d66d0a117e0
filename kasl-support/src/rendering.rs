//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format construction chains, type names,
//! and "did you mean?" suggestions in error output.

/// Renders a construction chain as a readable string.
///
/// # Examples
/// ```
/// use kasl_support::rendering::render_chain;
///
/// let chain = vec!["user_service", "user_repo", "database", "user_service"];
/// let rendered = render_chain(&chain);
/// assert_eq!(rendered, "user_service → user_repo → database → user_service");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use kasl_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::services::user::UserService");
/// assert_eq!(short, "UserService");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>");
/// assert_eq!(short, "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    // "my_app::services::UserService" → "UserService"
    // "Arc<dyn my_app::Logger>" → "Arc<dyn Logger>"
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                current_segment.clear();
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => current_segment.push(ch),
        }
    }

    result.push_str(&current_segment);
    result
}

/// Suggests registered service names close to a requested one.
///
/// Names that differ only in letter case rank first, then substring
/// matches, then shared prefixes, then names that differ by a typo or two.
/// The requested name itself is never suggested.
///
/// ```
/// use kasl_support::rendering::suggest_similar;
///
/// let available = ["database", "logger", "user_repository"];
/// assert_eq!(suggest_similar("databse", &available, 3), vec!["database"]);
/// ```
pub fn suggest_similar(requested: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let exact = requested;
    let requested = requested.to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter_map(|&name| {
            if name == exact {
                return None;
            }

            let candidate = name.to_lowercase();
            if candidate == requested {
                return Some((name, 200));
            }

            if !requested.is_empty()
                && (candidate.contains(&requested) || requested.contains(&candidate))
            {
                return Some((name, 100));
            }

            let common = candidate
                .chars()
                .zip(requested.chars())
                .take_while(|(a, b)| a == b)
                .count();
            if common >= 3 {
                return Some((name, 50 + common));
            }

            if typo_close(&requested, &candidate) {
                return Some((name, 40));
            }

            None
        })
        .collect();

    // Stable on ties so callers see names in the order they passed them
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Quick check whether two names are "close enough" to be a typo.
///
/// Not a full Levenshtein: same length give or take three characters,
/// and at least 60% of the positions agree.
fn typo_close(a: &str, b: &str) -> bool {
    let (a_len, b_len) = (a.chars().count(), b.chars().count());
    if a_len.abs_diff(b_len) > 3 {
        return false;
    }

    let max_len = a_len.max(b_len);
    if max_len == 0 {
        return false;
    }

    let common = a
        .chars()
        .zip(b.chars())
        .filter(|(ca, cb)| ca == cb)
        .count();

    common * 100 / max_len >= 60
}
