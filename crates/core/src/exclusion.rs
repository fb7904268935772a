//! Construction of the `--ignore-paths` expression for `git svn fetch`.

use tracing::{debug, warn};

use crate::config::LayoutConfig;

/// Build the combined path-exclusion pattern for the initial fetch.
///
/// Returns `None` when `expression` is empty, in which case no
/// `--ignore-paths` argument is passed at all.
///
/// With `root_is_trunk` set, the user expression is prefixed by an
/// alternation anchoring it below each non-empty layout directory (trunk,
/// then tags, then branches). Otherwise the alternation is empty and the
/// result is `^(?:)(?:<expression>)`.
pub fn build_ignore_paths(expression: &str, layout: &LayoutConfig) -> Option<String> {
    if expression.is_empty() {
        return None;
    }

    if let Err(e) = regex_lite::Regex::new(expression) {
        // git-svn compiles the pattern with Perl; report but pass it on.
        warn!(expression, error = %e, "exclusion expression does not compile as a regex");
    }

    let mut anchors: Vec<String> = Vec::new();
    if layout.root_is_trunk {
        if !layout.trunk.is_empty() {
            anchors.push(format!("{}[/]", layout.trunk));
        }
        if !layout.tags.is_empty() {
            anchors.push(format!("{}[/][^/]+[/]", layout.tags));
        }
        if !layout.branches.is_empty() {
            anchors.push(format!("{}[/][^/]+[/]", layout.branches));
        }
    }

    let pattern = format!("^(?:{})(?:{})", anchors.join("|"), expression);
    debug!(%pattern, "built ignore-paths pattern");
    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(root_is_trunk: bool) -> LayoutConfig {
        LayoutConfig {
            trunk: "trunk".into(),
            branches: "branches".into(),
            tags: "tags".into(),
            root_is_trunk,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn test_empty_expression_is_omitted() {
        assert_eq!(build_ignore_paths("", &layout(true)), None);
        assert_eq!(build_ignore_paths("", &layout(false)), None);
    }

    #[test]
    fn test_root_is_trunk_anchors_every_directory() {
        assert_eq!(
            build_ignore_paths("foo", &layout(true)).as_deref(),
            Some("^(?:trunk[/]|tags[/][^/]+[/]|branches[/][^/]+[/])(?:foo)")
        );
    }

    #[test]
    fn test_standard_layout_has_empty_alternation() {
        assert_eq!(
            build_ignore_paths("docs/.*", &layout(false)).as_deref(),
            Some("^(?:)(?:docs/.*)")
        );
    }

    #[test]
    fn test_empty_subpaths_are_skipped() {
        let mut l = layout(true);
        l.tags.clear();
        assert_eq!(
            build_ignore_paths("x", &l).as_deref(),
            Some("^(?:trunk[/]|branches[/][^/]+[/])(?:x)")
        );

        l.trunk.clear();
        l.branches.clear();
        assert_eq!(build_ignore_paths("x", &l).as_deref(), Some("^(?:)(?:x)"));
    }

    #[test]
    fn test_invalid_regex_is_passed_verbatim() {
        assert_eq!(
            build_ignore_paths("(unclosed", &layout(false)).as_deref(),
            Some("^(?:)(?:(unclosed)")
        );
    }
}
