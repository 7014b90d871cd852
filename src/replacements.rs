use crate::errors::{Error, Result};
use regex::bytes::{NoExpand, Regex, RegexSet};
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// One literal `from -> to` substitution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

impl Replacement {
    /// Creates a replacement, rejecting an empty `from`.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Result<Self> {
        let from = from.into();
        if from.is_empty() {
            return Err("replacement source must not be empty".into());
        }
        Ok(Self { from, to: to.into() })
    }
}

impl FromStr for Replacement {
    type Err = Error;

    /// Parses a `FROM:TO` argument. Exactly one colon is allowed.
    fn from_str(arg: &str) -> Result<Self> {
        let parts: Vec<&str> = arg.split(':').collect();
        match parts.as_slice() {
            [from, to] if !from.is_empty() => Replacement::new(*from, *to),
            _ => Err(format!("invalid argument: {arg}").into()),
        }
    }
}

impl fmt::Display for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.from, self.to)
    }
}

/// An ordered set of literal replacements applied to raw file bytes.
///
/// Each `from` is compiled as an escaped byte regex, so matching is purely
/// literal: leftmost first, non-overlapping, resuming after each match.
/// Replacements run one after another, each over the output of the previous
/// one, so a later `from` can match text an earlier `to` introduced.
pub struct ReplacementSet {
    replacements: Vec<Replacement>,
    compiled: Vec<Regex>,
    any: RegexSet,
}

impl ReplacementSet {
    /// Compiles the given replacements, preserving their order.
    pub fn new(replacements: Vec<Replacement>) -> Result<Self> {
        let escaped: Vec<String> = replacements
            .iter()
            .map(|r| regex::escape(&r.from))
            .collect();

        let compiled = escaped
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Usage(format!("Pattern compilation failed: {e}")))?;

        let any = RegexSet::new(&escaped)
            .map_err(|e| Error::Usage(format!("Pattern compilation failed: {e}")))?;

        Ok(Self {
            replacements,
            compiled,
            any,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Replacement> {
        self.replacements.iter()
    }

    /// Returns `true` if at least one `from` occurs in `content`.
    pub fn contains_any(&self, content: &[u8]) -> bool {
        self.any.is_match(content)
    }

    /// Applies every replacement in order and returns the result.
    ///
    /// Borrows `content` unchanged when nothing matched.
    pub fn apply_all<'a>(&self, content: &'a [u8]) -> Cow<'a, [u8]> {
        let mut out = Cow::Borrowed(content);
        for (regex, rep) in self.compiled.iter().zip(&self.replacements) {
            let replaced = match regex.replace_all(out.as_ref(), NoExpand(rep.to.as_bytes())) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(replaced) => replaced,
            };
            out = Cow::Owned(replaced);
        }
        out
    }
}
