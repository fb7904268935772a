//! Parsing of the `--revision START[:END]` argument.

use std::fmt;

use crate::errors::RevisionError;

/// Revision used when the end of a range is omitted.
pub const HEAD_REVISION: &str = "HEAD";

/// Revision used when the start of a two-token range is omitted.
pub const FIRST_REVISION: &str = "0";

/// A validated `START:END` pair passed to `git svn fetch -r`.
///
/// Both ends are kept as strings: Subversion accepts symbolic revisions
/// (`HEAD`, `{DATE}`) and git-svn validates them itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionRange {
    pub start: String,
    pub end: String,
}

impl RevisionRange {
    /// Parse a user-supplied range.
    ///
    /// Returns `Ok(None)` for an empty input, meaning the fetch is not
    /// restricted. Surrounding whitespace is ignored, so a blank but
    /// non-empty input is a [`RevisionError::EmptyRevisionStart`].
    ///
    /// ```
    /// use svn2git_core::revision::RevisionRange;
    ///
    /// let range = RevisionRange::parse(":5").unwrap().unwrap();
    /// assert_eq!(range.to_string(), "0:5");
    /// ```
    pub fn parse(input: &str) -> Result<Option<Self>, RevisionError> {
        if input.is_empty() {
            return Ok(None);
        }

        let tokens: Vec<&str> = input.trim().split(':').map(str::trim).collect();
        let range = match tokens.as_slice() {
            [start] => {
                if start.is_empty() {
                    return Err(RevisionError::EmptyRevisionStart);
                }
                Self {
                    start: start.to_string(),
                    end: HEAD_REVISION.to_string(),
                }
            }
            [start, end] => Self {
                start: non_empty_or(start, FIRST_REVISION),
                end: non_empty_or(end, HEAD_REVISION),
            },
            _ => return Err(RevisionError::MalformedRevisionRange(input.to_string())),
        };
        Ok(Some(range))
    }
}

fn non_empty_or(token: &str, default: &str) -> String {
    if token.is_empty() {
        default.to_string()
    } else {
        token.to_string()
    }
}

impl fmt::Display for RevisionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: &str, end: &str) -> Option<RevisionRange> {
        Some(RevisionRange {
            start: start.into(),
            end: end.into(),
        })
    }

    #[test]
    fn test_empty_input_is_unrestricted() {
        assert_eq!(RevisionRange::parse("").unwrap(), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(RevisionRange::parse("5").unwrap(), range("5", "HEAD"));
        assert_eq!(RevisionRange::parse("5:").unwrap(), range("5", "HEAD"));
        assert_eq!(RevisionRange::parse(":5").unwrap(), range("0", "5"));
        assert_eq!(RevisionRange::parse("5:10").unwrap(), range("5", "10"));
        assert_eq!(RevisionRange::parse(":").unwrap(), range("0", "HEAD"));
    }

    #[test]
    fn test_blank_start_is_rejected() {
        assert_eq!(
            RevisionRange::parse("  "),
            Err(RevisionError::EmptyRevisionStart)
        );
    }

    #[test]
    fn test_symbolic_revisions_pass_through() {
        assert_eq!(
            RevisionRange::parse("{2020-01-01}:HEAD").unwrap(),
            range("{2020-01-01}", "HEAD")
        );
    }

    #[test]
    fn test_too_many_separators() {
        assert_eq!(
            RevisionRange::parse("5:10:15"),
            Err(RevisionError::MalformedRevisionRange("5:10:15".into()))
        );
        assert!(matches!(
            RevisionRange::parse("::"),
            Err(RevisionError::MalformedRevisionRange(_))
        ));
    }

    #[test]
    fn test_display() {
        let r = RevisionRange::parse("12").unwrap().unwrap();
        assert_eq!(r.to_string(), "12:HEAD");
    }
}
