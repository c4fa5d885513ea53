//! The caller's name transformation.
//!
//! Applied to output keys, file names, facade ids, imported names and every
//! rewritten module specifier. An empty result means "keep the original".

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declarative mapping step, as written in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MapRule {
    /// Swap a trailing extension (`.js` → `.mjs`). Names without it are left alone.
    Extension { from: String, to: String },
    /// Replace the first occurrence of a substring.
    Replace { from: String, to: String },
    /// Regex replace-all; `replacement` may use `$1` / `${name}` captures.
    Regex {
        pattern: String,
        replacement: String,
    },
}

impl MapRule {
    /// Parse the CLI shorthand `FROM=TO` into an extension rule.
    pub fn parse_shorthand(spec: &str) -> Result<Self> {
        let (from, to) = spec.split_once('=').ok_or_else(|| {
            Error::validation_invalid_argument(
                "map",
                format!("Expected FROM=TO, got '{}'", spec),
                None,
                None,
            )
        })?;

        if from.is_empty() {
            return Err(Error::validation_invalid_argument(
                "map",
                format!("Empty FROM in '{}'", spec),
                None,
                None,
            ));
        }

        Ok(MapRule::Extension {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

enum CompiledRule {
    Extension { from: String, to: String },
    Replace { from: String, to: String },
    Regex { regex: Regex, replacement: String },
}

impl CompiledRule {
    fn compile(rule: MapRule) -> Result<Self> {
        match rule {
            MapRule::Extension { from, to } | MapRule::Replace { from, to } if from.is_empty() => {
                Err(Error::config_invalid_value(
                    "map",
                    Some(to),
                    "Rule 'from' must not be empty",
                ))
            }
            MapRule::Extension { from, to } => Ok(CompiledRule::Extension { from, to }),
            MapRule::Replace { from, to } => Ok(CompiledRule::Replace { from, to }),
            MapRule::Regex {
                pattern,
                replacement,
            } => {
                let regex = Regex::new(&pattern).map_err(|e| {
                    Error::config_invalid_value("map", Some(pattern.clone()), e.to_string())
                })?;
                Ok(CompiledRule::Regex { regex, replacement })
            }
        }
    }

    fn apply(&self, name: &str) -> String {
        match self {
            CompiledRule::Extension { from, to } => match name.strip_suffix(from.as_str()) {
                Some(stem) => format!("{}{}", stem, to),
                None => name.to_string(),
            },
            CompiledRule::Replace { from, to } => name.replacen(from.as_str(), to, 1),
            CompiledRule::Regex { regex, replacement } => {
                regex.replace_all(name, replacement.as_str()).into_owned()
            }
        }
    }
}

pub struct PathMapper {
    map: Box<dyn Fn(&str) -> String>,
}

impl PathMapper {
    pub fn new(map: impl Fn(&str) -> String + 'static) -> Self {
        Self { map: Box::new(map) }
    }

    /// Chain rules in order; each rule sees the previous rule's output.
    pub fn from_rules(rules: Vec<MapRule>) -> Result<Self> {
        let compiled = rules
            .into_iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(move |name| {
            compiled
                .iter()
                .fold(name.to_string(), |acc, rule| rule.apply(&acc))
        }))
    }

    pub fn apply(&self, name: &str) -> String {
        let mapped = (self.map)(name);
        if mapped.is_empty() {
            name.to_string()
        } else {
            mapped
        }
    }
}

impl fmt::Debug for PathMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathMapper").finish_non_exhaustive()
    }
}
