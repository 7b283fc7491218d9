use serde::Serialize;

/// Display name of the root crumb. The root folder itself is the empty path.
pub const ROOT_NAME: &str = "Root";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    pub path: String,
}

impl Breadcrumb {
    pub fn root() -> Self {
        Self { name: ROOT_NAME.to_string(), path: String::new() }
    }
}

pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|seg| !seg.is_empty())
}

/// Folder paths are relative to the root and carry no leading, trailing or
/// repeated slashes. The root is `""`.
pub fn normalize(path: &str) -> String {
    split_path(path).collect::<Vec<_>>().join("/")
}

pub fn join(parent: &str, name: &str) -> String {
    let parent = normalize(parent);
    let name = normalize(name);
    match (parent.is_empty(), name.is_empty()) {
        (true, _) => name,
        (_, true) => parent,
        _ => format!("{parent}/{name}"),
    }
}

/// Parent folder of a normalized path. The root is its own parent.
pub fn parent_of(path: &str) -> &str {
    let path = path.trim_matches('/');
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

pub fn file_name(path: &str) -> &str {
    let path = path.trim_matches('/');
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// True when `path` is `ancestor` or lives somewhere underneath it. Every path
/// is under the root.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    let path = path.trim_matches('/');
    let ancestor = ancestor.trim_matches('/');
    ancestor.is_empty()
        || path == ancestor
        || (path.starts_with(ancestor) && path[ancestor.len()..].starts_with('/'))
}

/// The ancestry chain from the root to `current_path`. The first crumb is
/// always the root and the last one always points at `current_path`.
pub fn breadcrumbs(current_path: &str) -> Vec<Breadcrumb> {
    let mut crumbs = vec![Breadcrumb::root()];
    let mut path = String::new();
    for name in split_path(current_path) {
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(name);
        crumbs.push(Breadcrumb { name: name.to_string(), path: path.clone() });
    }
    crumbs
}

/// Inverse of [`breadcrumbs`].
pub fn path_from_breadcrumbs(crumbs: &[Breadcrumb]) -> String {
    crumbs.last().map(|c| c.path.clone()).unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    fn crumb(name: &str, path: &str) -> Breadcrumb {
        Breadcrumb { name: name.to_string(), path: path.to_string() }
    }

    #[test]
    fn breadcrumbs_for_nested_path() {
        assert_eq!(
            breadcrumbs("A/B/C"),
            vec![crumb("Root", ""), crumb("A", "A"), crumb("B", "A/B"), crumb("C", "A/B/C")]
        );
    }

    #[test]
    fn breadcrumbs_for_root() {
        assert_eq!(breadcrumbs(""), vec![crumb("Root", "")]);
        assert_eq!(breadcrumbs("/"), vec![crumb("Root", "")]);
    }

    #[test]
    fn breadcrumbs_round_trip() {
        for path in ["", "A", "A/B", "A/B/C d"] {
            assert_eq!(path_from_breadcrumbs(&breadcrumbs(path)), path);
        }
    }

    #[test]
    fn normalize_strips_slashes() {
        assert_eq!(normalize("/A//B/"), "A/B");
        assert_eq!(normalize("///"), "");
    }

    #[test]
    fn parents() {
        assert_eq!(parent_of("A/B/C"), "A/B");
        assert_eq!(parent_of("A"), "");
        assert_eq!(parent_of(""), "");
    }

    #[test]
    fn joins() {
        assert_eq!(join("", "a.txt"), "a.txt");
        assert_eq!(join("A/B", "a.txt"), "A/B/a.txt");
        assert_eq!(join("/A/", "/sub/"), "A/sub");
    }

    #[test]
    fn within() {
        assert!(is_within("A/B", "A"));
        assert!(is_within("A", "A"));
        assert!(is_within("A", ""));
        assert!(!is_within("AB", "A"));
        assert!(!is_within("A", "A/B"));
    }
}
