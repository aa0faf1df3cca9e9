//! Path confinement for file references handed to sandboxed commands.

use super::{SandboxError, SandboxResult};
use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Allow-list applied when no patterns are configured: the whole project tree.
pub const DEFAULT_ALLOWED_PATTERN: &str = "**/*";

/// Separator-agnostic matching so `*` may span directories, mirroring shell
/// `fnmatch` semantics.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct AllowedPattern {
    source: String,
    compiled: Pattern,
}

impl AllowedPattern {
    fn parse(source: &str) -> SandboxResult<Self> {
        let compiled = Pattern::new(source).map_err(|err| SandboxError::InvalidPattern {
            pattern: source.to_owned(),
            reason: err.msg.to_owned(),
        })?;
        Ok(Self {
            source: source.to_owned(),
            compiled,
        })
    }

    /// `dir/**` also admits `dir` itself and anything below it.
    fn matches(&self, relative: &str) -> bool {
        if self.compiled.matches_with(relative, MATCH_OPTIONS) {
            return true;
        }
        self.source.strip_suffix("/**").is_some_and(|base| {
            relative == base
                || relative
                    .strip_prefix(base)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Directory that bounds every path this pattern can admit.
    fn search_root(&self, root: &Path) -> PathBuf {
        let literal: Vec<&str> = self
            .source
            .split('/')
            .take_while(|segment| !segment.contains(['*', '?', '[']))
            .collect();
        literal
            .iter()
            .fold(root.to_path_buf(), |dir, segment| dir.join(segment))
    }
}

/// Resolves user-supplied paths and rejects anything outside an allow-listed
/// subtree of the project root.
///
/// Every symlink on the way is expanded, including links whose target does
/// not exist yet, and `..` segments apply to the expanded parent, so neither
/// trick can escape the root.
#[derive(Debug, Clone)]
pub struct SafePathResolver {
    root: PathBuf,
    allowed: Vec<AllowedPattern>,
}

impl SafePathResolver {
    /// Creates a resolver confined to `root` with the given allow-list.
    ///
    /// An empty pattern list falls back to [`DEFAULT_ALLOWED_PATTERN`].
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::InvalidPattern`] when a pattern does not
    /// compile, [`SandboxError::Io`] when the working directory needed to
    /// absolutize a relative root is unavailable, or
    /// [`SandboxError::Security`] when the root loops through symlinks.
    pub fn new<I, S>(root: impl AsRef<Path>, patterns: I) -> SandboxResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed = patterns
            .into_iter()
            .map(|pattern| AllowedPattern::parse(pattern.as_ref()))
            .collect::<SandboxResult<Vec<_>>>()?;
        if allowed.is_empty() {
            allowed.push(AllowedPattern::parse(DEFAULT_ALLOWED_PATTERN)?);
        }

        let absolute = if root.as_ref().is_absolute() {
            root.as_ref().to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|err| SandboxError::io(root.as_ref().display().to_string(), err))?
                .join(root.as_ref())
        };

        let root = canonicalize_lenient(&absolute).ok_or_else(|| {
            SandboxError::security(format!(
                "project root '{}' loops through symlinks",
                absolute.display()
            ))
        })?;
        Ok(Self { root, allowed })
    }

    /// Creates a resolver admitting the whole tree under `root`.
    ///
    /// # Errors
    ///
    /// See [`SafePathResolver::new`].
    pub fn with_default_patterns(root: impl AsRef<Path>) -> SandboxResult<Self> {
        Self::new(root, [DEFAULT_ALLOWED_PATTERN])
    }

    /// Returns the canonical project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configured allow-list patterns.
    pub fn allowed_patterns(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(|pattern| pattern.source.as_str())
    }

    /// Resolves `path` to an absolute location inside the root.
    ///
    /// Relative paths are interpreted against the root.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Security`] when the resolved location is not a
    /// descendant of the root, matches none of the allowed patterns, or
    /// loops through symlinks.
    pub fn resolve(&self, path: impl AsRef<Path>) -> SandboxResult<PathBuf> {
        let requested = path.as_ref();
        let candidate = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.root.join(requested)
        };
        let resolved = canonicalize_lenient(&candidate).ok_or_else(|| {
            SandboxError::security(format!(
                "path '{}' loops through symlinks",
                requested.display()
            ))
        })?;

        let relative = resolved.strip_prefix(&self.root).map_err(|_| {
            SandboxError::security(format!(
                "path '{}' is outside project root '{}'",
                requested.display(),
                self.root.display()
            ))
        })?;

        let relative_text = to_slash_string(relative);
        if !self.allowed.iter().any(|p| p.matches(&relative_text)) {
            return Err(SandboxError::security(format!(
                "path '{}' does not match any allowed pattern",
                requested.display()
            )));
        }

        Ok(resolved)
    }

    /// Non-failing variant of [`SafePathResolver::resolve`].
    #[must_use]
    pub fn is_safe(&self, path: impl AsRef<Path>) -> bool {
        self.resolve(path).is_ok()
    }

    /// Lists every file below the allow-listed directories whose name matches
    /// `pattern` and which passes [`SafePathResolver::is_safe`].
    ///
    /// Results are sorted and free of duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::InvalidPattern`] when `pattern` does not
    /// compile.
    pub fn list_allowed_files(&self, pattern: &str) -> SandboxResult<Vec<PathBuf>> {
        let mut files = BTreeSet::new();
        for allowed in &self.allowed {
            let search_root = allowed.search_root(&self.root);
            if !search_root.is_dir() {
                continue;
            }
            let query = search_root.join("**").join(pattern);
            let entries = glob::glob_with(&query.to_string_lossy(), MATCH_OPTIONS).map_err(
                |err| SandboxError::InvalidPattern {
                    pattern: pattern.to_owned(),
                    reason: err.msg.to_owned(),
                },
            )?;
            files.extend(
                entries
                    .filter_map(Result::ok)
                    .filter(|entry| entry.is_file() && self.is_safe(entry)),
            );
        }
        Ok(files.into_iter().collect())
    }
}

/// Symlink expansions allowed while resolving one path.
const MAX_SYMLINK_HOPS: usize = 40;

/// One owned path component still waiting to be resolved.
enum Part {
    Prefix(OsString),
    Root,
    Parent,
    Name(OsString),
}

fn parts(path: &Path) -> impl DoubleEndedIterator<Item = Part> + '_ {
    path.components().filter_map(|component| match component {
        Component::Prefix(prefix) => Some(Part::Prefix(prefix.as_os_str().to_owned())),
        Component::RootDir => Some(Part::Root),
        Component::CurDir => None,
        Component::ParentDir => Some(Part::Parent),
        Component::Normal(name) => Some(Part::Name(name.to_owned())),
    })
}

/// Resolves `path` component by component, expanding every symlink on the
/// way, dangling ones included, and applying `..` to the resolved parent.
///
/// Missing components are kept literally. Returns `None` when symlinks loop.
fn canonicalize_lenient(path: &Path) -> Option<PathBuf> {
    let mut pending: Vec<Part> = parts(path).rev().collect();
    let mut resolved = PathBuf::new();
    let mut hops = 0;
    while let Some(part) = pending.pop() {
        match part {
            Part::Prefix(prefix) => resolved = PathBuf::from(prefix),
            Part::Root => {
                let mut rooted: PathBuf = resolved
                    .components()
                    .take_while(|component| matches!(component, Component::Prefix(_)))
                    .collect();
                rooted.push(Component::RootDir.as_os_str());
                resolved = rooted;
            }
            Part::Parent => {
                resolved.pop();
            }
            Part::Name(name) => {
                let next = resolved.join(&name);
                let is_link = std::fs::symlink_metadata(&next)
                    .is_ok_and(|meta| meta.file_type().is_symlink());
                if !is_link {
                    resolved = next;
                    continue;
                }
                hops += 1;
                if hops > MAX_SYMLINK_HOPS {
                    return None;
                }
                match std::fs::read_link(&next) {
                    Ok(target) => pending.extend(parts(&target).rev()),
                    Err(_) => resolved = next,
                }
            }
        }
    }
    Some(resolved)
}

/// Renders a root-relative path with `/` separators for glob matching.
fn to_slash_string(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
