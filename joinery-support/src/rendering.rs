//! Text rendering utilities for human-friendly error messages.
//!
//! Identifiers in a joinery container are plain strings, so every
//! diagnostic boils down to joining, shortening or comparing names.

/// Renders a dependency chain with arrows between its links.
///
/// # Examples
/// ```
/// use joinery_support::rendering::render_chain;
///
/// let chain = vec!["UserService", "UserRepo", "Database", "UserService"];
/// assert_eq!(render_chain(&chain), "UserService → UserRepo → Database → UserService");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    join_chain(chain, " → ")
}

/// Joins the links of a chain with an arbitrary separator.
///
/// ```
/// use joinery_support::rendering::join_chain;
///
/// assert_eq!(join_chain(&["Service", "Repository"], ", "), "Service, Repository");
/// ```
pub fn join_chain(chain: &[impl AsRef<str>], separator: &str) -> String {
    let mut out = String::new();
    for (i, link) in chain.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        out.push_str(link.as_ref());
    }
    out
}

/// Strips module paths from a fully qualified type name.
///
/// Generic arguments are shortened too, so the result reads the way the
/// type is usually written in source.
///
/// ```
/// use joinery_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("my_app::services::user::UserService"), "UserService");
/// assert_eq!(
///     shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>"),
///     "Arc<dyn Logger>"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut segment_start = 0;
    let bytes = full_name.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b':' if bytes.get(i + 1) == Some(&b':') => {
                i += 2;
                segment_start = i;
                continue;
            }
            b'<' | b'>' | b',' | b' ' | b'(' | b')' | b'[' | b']' | b';' | b'&' => {
                result.push_str(&full_name[segment_start..i]);
                result.push(bytes[i] as char);
                segment_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    result.push_str(&full_name[segment_start..]);
    result
}

/// Suggests known names that look like `requested`.
///
/// Candidates are ranked by substring containment first, then by edit
/// distance on the lowercased short names. At most `max_suggestions`
/// names come back, best match first.
pub fn suggest_similar(requested: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let wanted = shorten_type_name(requested).to_lowercase();
    if wanted.is_empty() || max_suggestions == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(usize, &str)> = available
        .iter()
        .filter_map(|&candidate| {
            let short = shorten_type_name(candidate).to_lowercase();
            if short == wanted {
                return None;
            }
            if short.contains(&wanted) || wanted.contains(&short) {
                return Some((0, candidate));
            }
            let distance = edit_distance(&wanted, &short);
            let budget = (wanted.chars().count().max(short.chars().count()) / 3).max(1);
            (distance <= budget).then_some((distance, candidate))
        })
        .collect();

    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    scored.dedup_by(|a, b| a.1 == b.1);
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Levenshtein distance over chars.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
