// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};

use crate::fs::FileSystem;

/// Upper bound on directory depth for `**` patterns, so symlink cycles
/// cannot make a pass walk forever.
const MAX_RECURSIVE_DEPTH: usize = 32;

/// A compiled watch pattern.
///
/// Patterns follow shell glob rules: `*`, `?` and `[...]` never match a path
/// separator, `**` matches across directories. Absolute patterns
/// (`/etc/app/*.conf`) are walked from their literal prefix, relative ones
/// from the current working directory.
#[derive(Clone)]
pub struct WatchPattern {
    raw: String,
    matcher: GlobMatcher,
}

impl fmt::Debug for WatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WatchPattern").field(&self.raw).finish()
    }
}

impl WatchPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .compile_matcher();

        Ok(Self {
            raw: pattern.to_string(),
            matcher,
        })
    }

    /// Whether a (previously expanded) path belongs to this pattern.
    pub fn matches(&self, path: &Path) -> bool {
        self.matcher.is_match(path)
    }

    /// Expand the pattern into the set of currently existing paths, sorted.
    ///
    /// Directories that cannot be read are skipped, mirroring shell glob
    /// behaviour: a missing base directory simply yields no matches.
    pub fn expand(&self, fs: &dyn FileSystem) -> Vec<PathBuf> {
        if !has_glob_meta(&self.raw) {
            let path = PathBuf::from(&self.raw);
            return if fs.exists(&path) { vec![path] } else { Vec::new() };
        }

        let (base, depth) = split_literal_prefix(&self.raw);
        let recursive = self.raw.contains("**");
        let max_depth = if recursive { MAX_RECURSIVE_DEPTH } else { depth };
        let relative = base.as_os_str().is_empty();
        let start = if relative { PathBuf::from(".") } else { base };

        let mut found = Vec::new();
        let mut stack = vec![(start, 0usize)];

        while let Some((dir, level)) = stack.pop() {
            let Ok(entries) = fs.read_dir(&dir) else {
                continue;
            };

            for entry in entries {
                let entry = if relative {
                    strip_dot(&entry)
                } else {
                    entry
                };

                if self.matcher.is_match(&entry) {
                    found.push(entry.clone());
                }
                if level + 1 < max_depth && fs.is_dir(&entry) {
                    stack.push((entry, level + 1));
                }
            }
        }

        found.sort();
        found.dedup();
        found
    }
}

/// Expand `pattern` in one step; errors only on an invalid pattern.
pub fn expand(fs: &dyn FileSystem, pattern: &str) -> Result<Vec<PathBuf>> {
    Ok(WatchPattern::new(pattern)?.expand(fs))
}

fn has_glob_meta(segment: &str) -> bool {
    segment.contains(['*', '?', '[', '{'])
}

/// Split a pattern into its longest literal directory prefix and the number
/// of path components that follow it.
fn split_literal_prefix(pattern: &str) -> (PathBuf, usize) {
    let segments: Vec<&str> = pattern.split('/').collect();
    let literal = segments
        .iter()
        .take_while(|segment| !has_glob_meta(segment))
        .count();

    let base = if literal == 0 {
        String::new()
    } else if literal == 1 && segments[0].is_empty() {
        "/".to_string()
    } else {
        segments[..literal].join("/")
    };

    (PathBuf::from(base), segments.len() - literal)
}

fn strip_dot(path: &Path) -> PathBuf {
    path.strip_prefix(".")
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use std::time::SystemTime;

    fn fs_with(paths: &[&str]) -> MockFileSystem {
        let fs = MockFileSystem::new();
        for p in paths {
            fs.add_file(p, SystemTime::UNIX_EPOCH);
        }
        fs
    }

    #[test]
    fn literal_prefix_split() {
        assert_eq!(
            split_literal_prefix("/etc/app/*.conf"),
            (PathBuf::from("/etc/app"), 1)
        );
        assert_eq!(split_literal_prefix("*.conf"), (PathBuf::new(), 1));
        assert_eq!(split_literal_prefix("/*/x"), (PathBuf::from("/"), 2));
        assert_eq!(
            split_literal_prefix("conf/**/*.yml"),
            (PathBuf::from("conf"), 2)
        );
    }

    #[test]
    fn star_does_not_cross_directories() {
        let fs = fs_with(&["/etc/app/a.conf", "/etc/app/b.conf", "/etc/app/sub/c.conf"]);

        let found = expand(&fs, "/etc/app/*.conf").unwrap();
        assert_eq!(
            found,
            vec![
                PathBuf::from("/etc/app/a.conf"),
                PathBuf::from("/etc/app/b.conf")
            ]
        );
    }

    #[test]
    fn double_star_recurses() {
        let fs = fs_with(&["/etc/app/a.conf", "/etc/app/sub/deeper/c.conf", "/etc/app/x.txt"]);

        let found = expand(&fs, "/etc/app/**/*.conf").unwrap();
        assert_eq!(
            found,
            vec![
                PathBuf::from("/etc/app/a.conf"),
                PathBuf::from("/etc/app/sub/deeper/c.conf")
            ]
        );
    }

    #[test]
    fn relative_patterns_yield_relative_paths() {
        let fs = fs_with(&["a.conf", "b.txt"]);

        let found = expand(&fs, "*.conf").unwrap();
        assert_eq!(found, vec![PathBuf::from("a.conf")]);
    }

    #[test]
    fn literal_pattern_matches_only_existing_path() {
        let fs = fs_with(&["/run/secrets/token"]);

        assert_eq!(
            expand(&fs, "/run/secrets/token").unwrap(),
            vec![PathBuf::from("/run/secrets/token")]
        );
        assert!(expand(&fs, "/run/secrets/missing").unwrap().is_empty());
    }

    #[test]
    fn missing_base_directory_is_not_an_error() {
        let fs = MockFileSystem::new();
        assert!(expand(&fs, "/nowhere/*.conf").unwrap().is_empty());
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let fs = MockFileSystem::new();
        assert!(expand(&fs, "/etc/[abc").is_err());
    }

    #[test]
    fn matches_checks_recorded_paths() {
        let pattern = WatchPattern::new("/etc/app/*.conf").unwrap();
        assert!(pattern.matches(Path::new("/etc/app/a.conf")));
        assert!(!pattern.matches(Path::new("/etc/app/sub/a.conf")));
        assert!(!pattern.matches(Path::new("/etc/other/a.conf")));
    }
}
