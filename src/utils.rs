//! Shared string and path utilities

use std::path::{Component, Path, PathBuf};

/// Convert a dash-case component tag to a camelCase identifier prefix,
/// e.g. `cmp-a` -> `cmpA`.
pub fn dash_to_camel(tag: &str) -> String {
    let mut result = String::with_capacity(tag.len());
    let mut upper_next = false;
    for ch in tag.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            result.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            result.push(ch);
        }
    }
    result
}

/// Convert a camelCase member name to its dash-case attribute form,
/// e.g. `firstName` -> `first-name`.
pub fn camel_to_dash(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 2);
    for ch in name.chars() {
        if ch.is_uppercase() {
            result.push('-');
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}

/// Check if a string is a valid identifier for generated bindings.
pub fn is_valid_identifier(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    let mut chars = s.chars();
    let first = chars.next().unwrap();
    if !first.is_alphabetic() && first != '_' && first != '$' {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Lexically resolve `.` and `..` segments without touching the file
/// system, so paths from different sources compare equal.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push("..");
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

/// Derive the module specifier for `importee` relative to the module at
/// `importer`, always prefixed with `./` or `../` and using forward slashes.
pub fn relative_import_path(importee: &Path, importer: &Path) -> String {
    let importer_dir = importer.parent().unwrap_or_else(|| Path::new(""));

    let base: Vec<Component> = importer_dir.components().collect();
    let target: Vec<Component> = importee.components().collect();

    // Longest common prefix of the two component lists
    let mut common = 0;
    while common < base.len() && common < target.len() && base[common] == target[common] {
        common += 1;
    }

    let mut parts: Vec<String> = Vec::new();
    for _ in common..base.len() {
        parts.push("..".to_string());
    }
    for component in &target[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }

    if parts.is_empty() {
        return "./".to_string();
    }
    let joined = parts.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{}", joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_dash_to_camel() {
        assert_eq!(dash_to_camel("cmp-a"), "cmpA");
        assert_eq!(dash_to_camel("my-long-tag"), "myLongTag");
        assert_eq!(dash_to_camel("plain"), "plain");
    }

    #[test]
    fn test_camel_to_dash() {
        assert_eq!(camel_to_dash("firstName"), "first-name");
        assert_eq!(camel_to_dash("value"), "value");
    }

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("cmpAStyle0"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("$ref"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("0abc"));
        assert!(!is_valid_identifier("with-dash"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/proj/styles/./a.css")),
            PathBuf::from("/proj/styles/a.css")
        );
        assert_eq!(
            normalize_path(Path::new("/proj/src/../styles/a.css")),
            PathBuf::from("/proj/styles/a.css")
        );
    }

    #[test]
    fn test_relative_import_path_sibling() {
        let importee = PathBuf::from("/proj/src/cmp-a.css");
        let importer = PathBuf::from("/proj/src/cmp-a.js");
        assert_eq!(relative_import_path(&importee, &importer), "./cmp-a.css");
    }

    #[test]
    fn test_relative_import_path_parent() {
        let importee = PathBuf::from("/proj/styles/theme.css");
        let importer = PathBuf::from("/proj/src/components/cmp-a.js");
        assert_eq!(
            relative_import_path(&importee, &importer),
            "../../styles/theme.css"
        );
    }

    #[test]
    fn test_relative_import_path_subdir() {
        let importee = PathBuf::from("/proj/src/styles/cmp-a.css");
        let importer = PathBuf::from("/proj/src/cmp-a.js");
        assert_eq!(
            relative_import_path(&importee, &importer),
            "./styles/cmp-a.css"
        );
    }
}
