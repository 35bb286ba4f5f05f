//! Wildcard matching of key paths against patterns.
//!
//! Pattern segments:
//! - `*` consumes exactly one path segment
//! - `**` consumes zero or more path segments (greedy, with backtracking)
//! - anything else is a literal that must equal the path segment
//!
//! A pattern that runs out before the path still matches: patterns act as
//! ancestor filters, so `a/b` matches `a/b/c/d`.

use crate::{KeyPath, WILDCARD_ANY, WILDCARD_ONE};

impl KeyPath {
    /// Match this path against `pattern`.
    pub fn matches(&self, pattern: &KeyPath) -> bool {
        let path = self.segments();
        let pattern = pattern.segments();

        let mut pi = 0;
        let mut ti = 0;
        // (path position, pattern position after the `**`)
        let mut checkpoint: Option<(usize, usize)> = None;

        loop {
            if ti == pattern.len() {
                return true;
            }
            if pi == path.len() {
                return pattern[ti..].iter().all(|s| s == WILDCARD_ANY);
            }

            let segment = pattern[ti].as_str();
            if segment == WILDCARD_ANY {
                checkpoint = Some((pi, ti + 1));
                ti += 1;
                continue;
            }
            if segment == WILDCARD_ONE || segment == path[pi] {
                pi += 1;
                ti += 1;
                continue;
            }

            // Literal mismatch: let the last `**` swallow one more segment.
            match checkpoint {
                Some((anchor, resume)) if anchor < path.len() => {
                    checkpoint = Some((anchor + 1, resume));
                    pi = anchor + 1;
                    ti = resume;
                }
                _ => return false,
            }
        }
    }
}
