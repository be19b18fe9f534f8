use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

/// Lexically normalize a path: drop `.` segments, fold `..` into its parent,
/// and strip trailing separators.
///
/// Two spellings of the same absolute path normalize to the same string, which
/// is what membership in the marked set is keyed on. Symbolic links are not
/// resolved.
pub fn normalize_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut normalized = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                // Never climb above the root (or an empty relative start)
                if matches!(
                    normalized.components().next_back(),
                    Some(Utf8Component::Normal(_))
                ) {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_str()),
        }
    }
    normalized
}

/// Join the components of a relative path with forward slashes regardless of
/// the host separator.
pub fn to_slash(path: &Utf8Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Utf8Component::Normal(s) => Some(s),
            Utf8Component::ParentDir => Some(".."),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// An open workspace folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectRoot {
    path: Utf8PathBuf,
}

impl ProjectRoot {
    pub fn new(path: impl AsRef<Utf8Path>) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Path of the scope file `<base>.<extension>` at this root
    pub fn scope_file(&self, base: &str, extension: &str) -> Utf8PathBuf {
        self.path.join(format!("{base}.{extension}"))
    }

    /// Whether `path` lies beneath this root
    pub fn contains(&self, path: &Utf8Path) -> bool {
        path.starts_with(&self.path) && path != self.path
    }

    /// Root-relative form of `path`, if it lies beneath this root
    pub fn relative(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        if !self.contains(path) {
            return None;
        }
        path.strip_prefix(&self.path).ok().map(Utf8Path::to_path_buf)
    }
}

/// The set of open project roots.
///
/// An empty workspace (no folder open) turns every scope-file operation into a
/// no-op.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    roots: Vec<ProjectRoot>,
}

impl Workspace {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let mut unique: Vec<ProjectRoot> = Vec::new();
        for root in roots.into_iter().map(ProjectRoot::new) {
            if !unique.contains(&root) {
                unique.push(root);
            }
        }
        Self { roots: unique }
    }

    pub fn roots(&self) -> &[ProjectRoot] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// The root owning `path`: the one with the longest matching prefix
    pub fn owning_root(&self, path: &Utf8Path) -> Option<&ProjectRoot> {
        self.roots
            .iter()
            .filter(|root| root.contains(path))
            .max_by_key(|root| root.path().components().count())
    }

    /// Scope file path per root, in root order
    pub fn scope_files(&self, base: &str, extension: &str) -> IndexMap<ProjectRoot, Utf8PathBuf> {
        self.roots
            .iter()
            .map(|root| (root.clone(), root.scope_file(base, extension)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Utf8Path::new("/proj/./src/../a.ts")).as_str(), "/proj/a.ts");
        assert_eq!(normalize_path(Utf8Path::new("/proj/src/")).as_str(), "/proj/src");
        assert_eq!(normalize_path(Utf8Path::new("/../a")).as_str(), "/a");
        assert_eq!(normalize_path(Utf8Path::new("a/../../b")).as_str(), "../b");
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Utf8Path::new("src/nested/a.ts")), "src/nested/a.ts");
        assert_eq!(to_slash(Utf8Path::new("./a.ts")), "a.ts");
    }

    #[test]
    fn test_owning_root_longest_prefix() {
        let workspace = Workspace::new(["/proj", "/proj/sub", "/other"]);

        let root = workspace.owning_root(Utf8Path::new("/proj/sub/file.rs")).unwrap();
        assert_eq!(root.path().as_str(), "/proj/sub");

        let root = workspace.owning_root(Utf8Path::new("/proj/file.rs")).unwrap();
        assert_eq!(root.path().as_str(), "/proj");

        // Component-wise prefix, not string prefix
        assert!(workspace.owning_root(Utf8Path::new("/project/file.rs")).is_none());
        assert!(workspace.owning_root(Utf8Path::new("/elsewhere/file.rs")).is_none());
    }

    #[test]
    fn test_relative_path() {
        let root = ProjectRoot::new("/proj");
        assert_eq!(root.relative(Utf8Path::new("/proj/src/a.ts")).unwrap().as_str(), "src/a.ts");
        assert!(root.relative(Utf8Path::new("/proj")).is_none());
        assert!(root.relative(Utf8Path::new("/other/a.ts")).is_none());
    }

    #[test]
    fn test_scope_files_per_root() {
        let workspace = Workspace::new(["/a", "/b", "/a/"]);
        let files = workspace.scope_files("scope", "txt");

        assert_eq!(files.len(), 2);
        assert_eq!(files[&ProjectRoot::new("/a")].as_str(), "/a/scope.txt");
        assert_eq!(files[&ProjectRoot::new("/b")].as_str(), "/b/scope.txt");
    }

    #[test]
    fn test_empty_workspace() {
        let workspace = Workspace::default();
        assert!(workspace.is_empty());
        assert!(workspace.scope_files("scope", "txt").is_empty());
    }
}
