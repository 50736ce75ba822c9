//! Repository-name substitution for initial-only templates.

/// Token replaced by the repository name in initial-only content.
pub const REPO_NAME_TOKEN: &str = "{{ REPO_NAME }}";

/// Replace every occurrence of [`REPO_NAME_TOKEN`] in `content` with
/// `repo_name`. Works on raw bytes; nothing else is altered.
pub fn substitute_repo_name(content: &[u8], repo_name: &str) -> Vec<u8> {
    replace_bytes(content, REPO_NAME_TOKEN.as_bytes(), repo_name.as_bytes())
}

fn replace_bytes(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return haystack.to_vec();
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(needle) {
            out.extend_from_slice(replacement);
            i += needle.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}
