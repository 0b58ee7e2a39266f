//! Protected path patterns.
//!
//! DESIGN
//! ======
//! Patterns are parsed once at startup into a tagged type instead of being
//! string-sniffed on every navigation. A trailing `*` marks a prefix pattern
//! that covers the base path and everything below it, segment-wise, so
//! `/routes/profile/*` covers `/routes/profile` but not `/routes/profiles`.
//!
//! When several patterns match, the longest one wins; an exact pattern beats
//! a prefix of the same length, and remaining ties go to the earlier entry.

use std::fmt;

use crate::error::ConfigError;

/// Built-in protected paths of the marketplace frontend.
pub const DEFAULT_PROTECTED_PATHS: &[&str] = &[
    "/routes/favorites",
    "/routes/profile/*",
    "/routes/messages/*",
    "/routes/listings/new",
    "/routes/listings/edit/*",
    "/routes/dashboard/*",
];

const WILDCARD: char = '*';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches exactly this path.
    Exact(String),
    /// Matches the base path and any path below it.
    Prefix(String),
}

impl PathPattern {
    /// Parse the source form: `/a/b` is exact, `/a/*` (or `/a*`) is a prefix of `/a`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not start with `/`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if !raw.starts_with('/') {
            return Err(ConfigError::InvalidPattern(raw.to_owned()));
        }
        Ok(Self::from_source(raw))
    }

    fn from_source(raw: &str) -> Self {
        match raw.strip_suffix(WILDCARD) {
            Some(base) => Self::Prefix(base.trim_end_matches('/').to_owned()),
            None => Self::Exact(raw.to_owned()),
        }
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Prefix(base) => match path.strip_prefix(base.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            },
        }
    }

    /// Ordering key for overlapping matches: longer first, exact before prefix.
    fn specificity(&self) -> (usize, bool) {
        match self {
            Self::Exact(exact) => (exact.len(), true),
            Self::Prefix(base) => (base.len(), false),
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(exact) => f.write_str(exact),
            Self::Prefix(base) => write!(f, "{base}/*"),
        }
    }
}

/// The static set of paths that require a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedRoutes {
    patterns: Vec<PathPattern>,
}

impl ProtectedRoutes {
    #[must_use]
    pub fn from_patterns(patterns: Vec<PathPattern>) -> Self {
        Self { patterns }
    }

    /// Parse a comma-separated pattern list. Empty entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error for the first malformed pattern.
    pub fn parse_list(raw: &str) -> Result<Self, ConfigError> {
        let patterns = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(PathPattern::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    #[must_use]
    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }

    /// The most specific pattern covering `location`, ignoring its query and fragment.
    #[must_use]
    pub fn matching(&self, location: &str) -> Option<&PathPattern> {
        let path = path_of(location);
        let mut best: Option<&PathPattern> = None;
        for pattern in self.patterns.iter().filter(|p| p.matches(path)) {
            if best.is_none_or(|b| pattern.specificity() > b.specificity()) {
                best = Some(pattern);
            }
        }
        tracing::debug!(%path, pattern = ?best, "protected path lookup");
        best
    }

    #[must_use]
    pub fn is_protected(&self, location: &str) -> bool {
        self.matching(location).is_some()
    }
}

impl Default for ProtectedRoutes {
    fn default() -> Self {
        Self { patterns: DEFAULT_PROTECTED_PATHS.iter().map(|raw| PathPattern::from_source(raw)).collect() }
    }
}

/// Path component of a location, without query string or fragment.
#[must_use]
pub fn path_of(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    match &location[..end] {
        "" => "/",
        path => path,
    }
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
