//! Include/exclude filtering of module ids.
//!
//! Patterns are globs (`glob-match`) or regular expressions. Exclusion wins over
//! inclusion, and an empty include list accepts everything.

use crate::error::{Error, Result};
use glob_match::glob_match;
use regex::Regex;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum Pattern {
    Glob(String),
    Regex(Regex),
}

impl Pattern {
    pub fn glob(pattern: impl Into<String>) -> Self {
        Pattern::Glob(normalize(&pattern.into()))
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Pattern::Regex)
            .map_err(|e| Error::config_invalid_value("pattern", Some(pattern.to_string()), e.to_string()))
    }

    /// Parse a pattern string: `re:<regex>` is a regular expression, anything
    /// else is a glob. Flags go inline, e.g. `re:(?i)index`.
    pub fn parse(spec: &str) -> Result<Self> {
        match spec.strip_prefix(REGEX_PREFIX) {
            Some(body) => Self::regex(body),
            None => Ok(Self::glob(spec)),
        }
    }

    /// Anchor a relative glob at `base`. Absolute globs and globs starting with
    /// `*` are left as they are; regexes are never rewritten.
    pub fn resolved(self, base: &Path) -> Self {
        match self {
            Pattern::Glob(glob) if !glob.starts_with('*') && !is_absolute(&glob) => {
                let base = normalize(&base.to_string_lossy());
                let base = base.trim_end_matches('/');
                let glob = glob.trim_start_matches("./");
                Pattern::Glob(format!("{}/{}", base, glob))
            }
            other => other,
        }
    }

    pub fn is_match(&self, id: &str) -> bool {
        match self {
            Pattern::Glob(glob) => glob_match(glob, id),
            Pattern::Regex(regex) => regex.is_match(id),
        }
    }
}

/// Marks a pattern string as a regular expression.
pub const REGEX_PREFIX: &str = "re:";

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Separators are already normalized, so a leading `/` counts on every platform.
fn is_absolute(glob: &str) -> bool {
    glob.starts_with('/') || Path::new(glob).is_absolute()
}

/// Where relative glob patterns are anchored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Resolve {
    /// The process working directory at build time.
    #[default]
    CurrentDir,
    Base(PathBuf),
    /// Leave relative globs as written.
    Disabled,
}

impl Resolve {
    pub fn base(&self) -> Result<Option<PathBuf>> {
        match self {
            Resolve::CurrentDir => std::env::current_dir().map(Some).map_err(|e| {
                Error::internal_io(e.to_string(), Some("resolve working directory".to_string()))
            }),
            Resolve::Base(base) => Ok(Some(base.clone())),
            Resolve::Disabled => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Filter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    accept_missing: bool,
}

impl Filter {
    pub fn new(include: Vec<Pattern>, exclude: Vec<Pattern>) -> Self {
        Self {
            include,
            exclude,
            accept_missing: false,
        }
    }

    /// Accept ids that are absent (files without a facade module).
    pub fn with_accept_missing(mut self, accept: bool) -> Self {
        self.accept_missing = accept;
        self
    }

    pub fn matches(&self, id: Option<&str>) -> bool {
        let Some(id) = id else {
            return self.accept_missing;
        };

        // Virtual module ids carry a NUL prefix and never match.
        if id.contains('\0') {
            return false;
        }

        let id = normalize(id);

        if self.exclude.iter().any(|p| p.is_match(&id)) {
            return false;
        }
        if self.include.iter().any(|p| p.is_match(&id)) {
            return true;
        }
        self.include.is_empty()
    }
}
