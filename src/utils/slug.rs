const FALLBACK_SLUG: &str = "workspace";

/// Lowercases `name` and collapses every run of non-alphanumeric characters
/// into a single `_`. Leading and trailing separators are dropped; a name
/// with nothing usable becomes `workspace`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// `ws_{user_id}_{slug}`. Including the user id keeps workspace ids of
/// different users apart even when their workspace names collide.
pub fn workspace_id(user_id: &str, workspace_name: &str) -> String {
    format!("ws_{}_{}", user_id, slugify(workspace_name))
}
