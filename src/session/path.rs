//! Relative path inference from the working directory.

/// Derive the project-relative path of `cwd` from the project's client root.
///
/// The root is matched as a substring of `cwd`, anchored with a leading `/`.
/// Only the first occurrence counts. Returns `None` when `cwd` lies outside
/// the project.
pub fn infer_relative_path(cwd: &str, client_root: &str) -> Option<String> {
    if client_root.is_empty() {
        return None;
    }
    let root = if client_root.starts_with('/') {
        client_root.to_string()
    } else {
        format!("/{}", client_root)
    };

    let idx = cwd.find(&root)?;
    Some(cwd[idx + root.len()..].trim_matches('/').to_string())
}
