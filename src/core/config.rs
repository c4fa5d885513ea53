//! Rename configuration file and parser options.

use crate::error::{Error, Result};
use crate::filter::{Pattern, Resolve};
use crate::mapper::MapRule;
use crate::rename::{Renamer, RenamerBuilder};
use crate::utils::io;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Parser options
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Module,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatestTag {
    Latest,
}

/// `ecmaVersion` as accepted by ESTree parsers: an edition number or `"latest"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EcmaVersion {
    Edition(u32),
    Latest(LatestTag),
}

impl fmt::Display for EcmaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcmaVersion::Edition(edition) => write!(f, "{}", edition),
            EcmaVersion::Latest(_) => f.write_str("latest"),
        }
    }
}

/// Options handed to the syntax front end.
///
/// `ecma_version` is kept for configuration compatibility; the oxc front end
/// always accepts the latest syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserOptions {
    pub ecma_version: EcmaVersion,
    pub source_type: SourceKind,
    pub jsx: bool,
    pub typescript: bool,
    pub allow_return_outside_function: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            ecma_version: EcmaVersion::Edition(6),
            source_type: SourceKind::Module,
            jsx: false,
            typescript: false,
            allow_return_outside_function: false,
        }
    }
}

/// Caller-supplied parser options; every present field wins over the base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecma_version: Option<EcmaVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsx: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typescript: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_return_outside_function: Option<bool>,
}

impl ParserOptions {
    /// A caller-chosen `ecmaVersion`, which the front end does not enforce.
    pub fn ignored_ecma_version(&self) -> Option<EcmaVersion> {
        (self.ecma_version != Self::default().ecma_version).then_some(self.ecma_version)
    }

    pub fn with_overrides(self, overrides: &ParserOverrides) -> Self {
        Self {
            ecma_version: overrides.ecma_version.unwrap_or(self.ecma_version),
            source_type: overrides.source_type.unwrap_or(self.source_type),
            jsx: overrides.jsx.unwrap_or(self.jsx),
            typescript: overrides.typescript.unwrap_or(self.typescript),
            allow_return_outside_function: overrides
                .allow_return_outside_function
                .unwrap_or(self.allow_return_outside_function),
        }
    }
}

// ============================================================================
// Filter patterns
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternEntry {
    /// A glob, or a regular expression written as `re:<regex>`.
    Text(String),
    Regex { regex: String },
}

impl PatternEntry {
    pub fn compile(&self) -> Result<Pattern> {
        match self {
            PatternEntry::Text(text) => Pattern::parse(text),
            PatternEntry::Regex { regex } => Pattern::regex(regex),
        }
    }
}

/// One pattern or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternSpec {
    One(PatternEntry),
    Many(Vec<PatternEntry>),
}

impl PatternSpec {
    pub fn compile(&self) -> Result<Vec<Pattern>> {
        match self {
            PatternSpec::One(entry) => Ok(vec![entry.compile()?]),
            PatternSpec::Many(entries) => entries.iter().map(PatternEntry::compile).collect(),
        }
    }
}

// ============================================================================
// Rename configuration file
// ============================================================================

/// `resolve` in the config file: `true`/`false` toggles anchoring at the
/// working directory, a string names the base directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResolveSetting {
    Enabled(bool),
    Base(PathBuf),
}

impl From<ResolveSetting> for Resolve {
    fn from(setting: ResolveSetting) -> Self {
        match setting {
            ResolveSetting::Enabled(true) => Resolve::CurrentDir,
            ResolveSetting::Enabled(false) => Resolve::Disabled,
            ResolveSetting::Base(base) => Resolve::Base(base),
        }
    }
}

fn default_source_map() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<PatternSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<PatternSpec>,
    #[serde(default = "default_source_map")]
    pub source_map: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<Vec<MapRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser_options: Option<ParserOverrides>,
    #[serde(default)]
    pub accept_missing_id: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve: Option<ResolveSetting>,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            include: None,
            exclude: None,
            source_map: true,
            map: None,
            parser_options: None,
            accept_missing_id: false,
            resolve: None,
        }
    }
}

impl RenameConfig {
    pub fn from_json(content: &str, path: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::config_invalid_json(path, e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = io::read_file(path, "read rename config")?;
        Self::from_json(&content, &path.to_string_lossy())
    }

    /// Translate into a builder. Fails when no `map` rules are configured.
    pub fn into_builder(self) -> Result<RenamerBuilder> {
        let rules = match self.map {
            Some(rules) if !rules.is_empty() => rules,
            Some(_) => {
                return Err(Error::config_invalid_value(
                    "map",
                    None,
                    "At least one mapping rule is required",
                ))
            }
            None => {
                return Err(Error::config_missing_key("map", None)
                    .with_hint("Add a \"map\" list, e.g. [{\"extension\":{\"from\":\".js\",\"to\":\".mjs\"}}]"))
            }
        };

        let mut builder = Renamer::builder()
            .rules(rules)?
            .source_map(self.source_map)
            .accept_missing_id(self.accept_missing_id);

        if let Some(include) = &self.include {
            for pattern in include.compile()? {
                builder = builder.include(pattern);
            }
        }
        if let Some(exclude) = &self.exclude {
            for pattern in exclude.compile()? {
                builder = builder.exclude(pattern);
            }
        }
        if let Some(overrides) = self.parser_options {
            builder = builder.parser_options(overrides);
        }
        if let Some(setting) = self.resolve {
            builder = builder.resolution(setting.into());
        }

        Ok(builder)
    }

    pub fn into_renamer(self) -> Result<Renamer> {
        self.into_builder()?.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn overrides_win_over_base() {
        let overrides = ParserOverrides {
            ecma_version: Some(EcmaVersion::Latest(LatestTag::Latest)),
            jsx: Some(true),
            ..ParserOverrides::default()
        };
        let options = ParserOptions::default().with_overrides(&overrides);
        assert_eq!(options.ecma_version, EcmaVersion::Latest(LatestTag::Latest));
        assert_eq!(options.source_type, SourceKind::Module);
        assert!(options.jsx);
        assert!(!options.typescript);
    }

    #[test]
    fn only_non_default_ecma_version_is_reported() {
        assert_eq!(ParserOptions::default().ignored_ecma_version(), None);

        let overrides = ParserOverrides {
            ecma_version: Some(EcmaVersion::Edition(2020)),
            ..ParserOverrides::default()
        };
        let options = ParserOptions::default().with_overrides(&overrides);
        assert_eq!(options.ignored_ecma_version(), Some(EcmaVersion::Edition(2020)));
        assert_eq!(EcmaVersion::Edition(2020).to_string(), "2020");
        assert_eq!(EcmaVersion::Latest(LatestTag::Latest).to_string(), "latest");
    }

    #[test]
    fn base_options_are_es6_module() {
        let options = ParserOptions::default();
        assert_eq!(options.ecma_version, EcmaVersion::Edition(6));
        assert_eq!(options.source_type, SourceKind::Module);
    }

    #[test]
    fn parser_overrides_deserialize_camel_case() {
        let overrides: ParserOverrides =
            serde_json::from_str(r#"{"ecmaVersion":"latest","sourceType":"script"}"#).unwrap();
        assert_eq!(overrides.ecma_version, Some(EcmaVersion::Latest(LatestTag::Latest)));
        assert_eq!(overrides.source_type, Some(SourceKind::Script));

        let numbered: ParserOverrides = serde_json::from_str(r#"{"ecmaVersion":2020}"#).unwrap();
        assert_eq!(numbered.ecma_version, Some(EcmaVersion::Edition(2020)));
    }

    #[test]
    fn config_defaults_source_map_on() {
        let config = RenameConfig::from_json(r#"{"map":[]}"#, "rename.json").unwrap();
        assert!(config.source_map);
        assert!(!config.accept_missing_id);
    }

    #[test]
    fn missing_map_fails_fast() {
        let config = RenameConfig::from_json(r#"{"include":"src/**"}"#, "rename.json").unwrap();
        let err = config.into_renamer().unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigMissingKey);
        assert_eq!(err.details["key"], "map");
    }

    #[test]
    fn empty_map_is_invalid() {
        let config = RenameConfig::from_json(r#"{"map":[]}"#, "rename.json").unwrap();
        let err = config.into_renamer().unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidValue);
    }

    #[test]
    fn invalid_json_reports_path() {
        let err = RenameConfig::from_json("{", "rename.json").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidJson);
        assert_eq!(err.details["path"], "rename.json");
    }

    #[test]
    fn pattern_specs_accept_one_or_many() {
        let one: PatternSpec = serde_json::from_str(r#""src/**""#).unwrap();
        assert_eq!(one.compile().unwrap().len(), 1);

        let many: PatternSpec =
            serde_json::from_str(r#"["src/**", {"regex": "\\.js$"}, "re:(?i)\\.mjs$"]"#).unwrap();
        let compiled = many.compile().unwrap();
        assert_eq!(compiled.len(), 3);
        assert!(matches!(compiled[1], Pattern::Regex(_)));
        assert!(matches!(compiled[2], Pattern::Regex(_)));
    }

    #[test]
    fn resolve_accepts_bool_or_base() {
        let off = RenameConfig::from_json(r#"{"resolve": false}"#, "rename.json").unwrap();
        assert_eq!(off.resolve.map(Resolve::from), Some(Resolve::Disabled));

        let on = RenameConfig::from_json(r#"{"resolve": true}"#, "rename.json").unwrap();
        assert_eq!(on.resolve.map(Resolve::from), Some(Resolve::CurrentDir));

        let base = RenameConfig::from_json(r#"{"resolve": "/proj"}"#, "rename.json").unwrap();
        assert_eq!(
            base.resolve.map(Resolve::from),
            Some(Resolve::Base(PathBuf::from("/proj")))
        );
    }

    #[test]
    fn relative_include_is_anchored_at_resolve_base() {
        let renamer = RenameConfig::from_json(
            r#"{"include": "src/**", "resolve": "/proj", "map": [{"extension": {"from": ".js", "to": ".mjs"}}]}"#,
            "rename.json",
        )
        .unwrap()
        .into_renamer()
        .unwrap();
        let filter = &renamer.options().filter;
        assert!(filter.matches(Some("/proj/src/a.js")));
        assert!(!filter.matches(Some("src/a.js")));
    }

    #[test]
    fn full_config_builds_renamer() {
        let config = RenameConfig::from_json(
            r#"{
                "include": ["src/**"],
                "exclude": "src/vendor/**",
                "sourceMap": false,
                "map": [{"extension": {"from": ".js", "to": ".mjs"}}],
                "parserOptions": {"jsx": true},
                "acceptMissingId": true
            }"#,
            "rename.json",
        )
        .unwrap();
        assert!(!config.source_map);
        assert!(config.into_renamer().is_ok());
    }
}
