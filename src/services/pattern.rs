//! gitignore-style pattern matching for scope files.
//!
//! Rules follow [gitignore](https://git-scm.com/docs/gitignore) semantics:
//! later lines override earlier ones, `!` re-includes a previously matched
//! path, and a pattern matching a directory matches everything beneath it.
//! Matching is pure: no filesystem access happens after compilation.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// A compiled, ordered set of gitignore rules.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    matcher: Gitignore,
    rejected: Vec<String>,
}

impl PatternMatcher {
    /// Compile `patterns`, skipping (and logging) lines that are not valid globs.
    ///
    /// A scope file with one bad line still marks everything its other lines
    /// select.
    pub fn compile<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new(".");
        let mut rejected = Vec::new();

        for pattern in patterns {
            let pattern = normalize_pattern(pattern.as_ref());
            if let Err(e) = builder.add_line(None, &pattern) {
                tracing::warn!("Skipping invalid scope pattern {:?}: {}", pattern, e);
                rejected.push(pattern);
            }
        }

        let matcher = builder.build().unwrap_or_else(|e| {
            tracing::error!("Failed to build scope pattern set: {}", e);
            Gitignore::empty()
        });

        Self { matcher, rejected }
    }

    /// Decide whether a root-relative, forward-slash path is selected.
    ///
    /// Absolute paths and paths escaping the root never match.
    pub fn matches(&self, relative_path: &str) -> bool {
        let relative_path = relative_path.strip_prefix("./").unwrap_or(relative_path);
        if relative_path.is_empty()
            || relative_path.starts_with('/')
            || relative_path.split('/').any(|segment| segment == "..")
        {
            return false;
        }

        let path = Path::new(relative_path);
        if path.has_root() {
            return false;
        }

        self.matcher
            .matched_path_or_any_parents(path, false)
            .is_ignore()
    }

    /// Number of compiled rules (selecting and negating)
    pub fn len(&self) -> usize {
        self.matcher.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }

    /// Lines that were skipped because they failed to compile
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }
}

/// Strip a leading `./` (after an optional `!`) so `./src/a.ts` and `src/a.ts`
/// compile to the same rule.
fn normalize_pattern(pattern: &str) -> String {
    let (negation, mut body) = match pattern.strip_prefix('!') {
        Some(rest) => ("!", rest),
        None => ("", pattern),
    };
    while let Some(rest) = body.strip_prefix("./") {
        body = rest;
    }
    format!("{negation}{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_later_negation_overrides() {
        let matcher = PatternMatcher::compile(["*.txt", "!keep.txt"]);
        assert!(matcher.matches("notes.txt"));
        assert!(!matcher.matches("keep.txt"));
        assert!(!matcher.matches("main.rs"));
    }

    #[test]
    fn test_later_positive_overrides_negation() {
        let matcher = PatternMatcher::compile(["*.txt", "!keep.txt", "keep.txt"]);
        assert!(matcher.matches("keep.txt"));
    }

    #[test]
    fn test_literal_paths_are_anchored() {
        let matcher = PatternMatcher::compile(["src/a.ts", "src/b.ts"]);
        assert!(matcher.matches("src/a.ts"));
        assert!(matcher.matches("src/b.ts"));
        assert!(!matcher.matches("src/c.ts"));
        assert!(!matcher.matches("other/src/a.ts"));
    }

    #[test]
    fn test_double_star_and_directory_patterns() {
        let matcher = PatternMatcher::compile(["docs/**/*.md", "build/"]);
        assert!(matcher.matches("docs/guide/intro.md"));
        assert!(matcher.matches("docs/a/b/c.md"));
        assert!(!matcher.matches("docs/guide/intro.txt"));
        // Files below a matched directory are selected
        assert!(matcher.matches("build/out/app.js"));
    }

    #[test]
    fn test_leading_dot_slash_is_ignored() {
        let matcher = PatternMatcher::compile(["./src/a.ts", "!./src/skip.ts", "./src/*.ts"]);
        assert!(matcher.matches("src/a.ts"));
        assert!(matcher.matches("./src/a.ts"));
        assert!(matcher.matches("src/skip.ts"));
    }

    #[test]
    fn test_comments_and_blank_patterns() {
        let matcher = PatternMatcher::compile(["# a comment", "", "a.rs"]);
        assert_eq!(matcher.len(), 1);
        assert!(matcher.matches("a.rs"));
        assert!(!matcher.matches("# a comment"));
    }

    #[test]
    fn test_rejects_unsafe_candidates() {
        let matcher = PatternMatcher::compile(["*"]);
        assert!(!matcher.matches(""));
        assert!(!matcher.matches("/etc/passwd"));
        assert!(!matcher.matches("../outside.txt"));
        assert!(matcher.matches("inside.txt"));
    }

    #[test]
    fn test_invalid_line_is_skipped() {
        let matcher = PatternMatcher::compile(["a[.txt", "b.txt"]);
        assert_eq!(matcher.rejected(), ["a[.txt".to_string()]);
        assert!(matcher.matches("b.txt"));
    }

    #[test]
    fn test_empty_matcher_matches_nothing() {
        let matcher = PatternMatcher::compile(Vec::<String>::new());
        assert!(matcher.is_empty());
        assert!(!matcher.matches("a.txt"));
    }

    proptest! {
        #[test]
        fn prop_dot_slash_prefix_is_equivalent(name in "[a-z]{1,8}(/[a-z]{1,8}){0,2}\\.[a-z]{1,3}") {
            let plain = PatternMatcher::compile([name.as_str()]);
            let prefixed = PatternMatcher::compile([format!("./{name}")]);
            prop_assert_eq!(plain.matches(&name), prefixed.matches(&name));
            prop_assert!(prefixed.matches(&name));
        }

        #[test]
        fn prop_negation_excludes_only_named_file(
            keep in "[a-z]{1,8}\\.txt",
            other in "[a-z]{1,8}\\.txt",
        ) {
            let matcher = PatternMatcher::compile(["*.txt".to_string(), format!("!{keep}")]);
            prop_assert!(!matcher.matches(&keep));
            prop_assert_eq!(matcher.matches(&other), other != keep);
        }
    }
}
