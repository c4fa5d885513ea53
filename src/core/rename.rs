//! Re-key emitted files and rewrite their static module references.
//!
//! Every entry is transformed from a snapshot of the input bundle, and the new
//! file map replaces the old one only after all entries succeeded. A file that
//! fails to parse leaves the bundle exactly as it was.

use crate::bundle::{Bundle, EmittedFile};
use crate::classify::collect_references;
use crate::config::{ParserOptions, ParserOverrides};
use crate::error::{Error, Result};
use crate::filter::{Filter, Pattern, Resolve};
use crate::mapper::{MapRule, PathMapper};
use crate::rewrite::{quote, Rewritten, SourceMapOptions, TextRewriter};
use crate::syntax::{OxcFrontend, SyntaxFrontend};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

// ============================================================================
// Report
// ============================================================================

/// One renamed bundle entry.
#[derive(Debug, Clone, Serialize)]
pub struct RenamedEntry {
    pub from: String,
    pub to: String,
    pub file_name: String,
    /// Module references rewritten in the file's code.
    pub references: usize,
    /// Whether a new source map was attached.
    pub source_map: bool,
}

/// Something worth surfacing that didn't stop the rename.
#[derive(Debug, Clone, Serialize)]
pub struct RenameWarning {
    pub kind: String,
    pub file: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RenameReport {
    pub renamed: Vec<RenamedEntry>,
    /// Keys left untouched by the filter.
    pub skipped: Vec<String>,
    pub warnings: Vec<RenameWarning>,
    pub total_files: usize,
    pub total_references: usize,
}

// ============================================================================
// Renamer
// ============================================================================

#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub filter: Filter,
    pub source_map: bool,
    pub parser_options: ParserOptions,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            filter: Filter::default(),
            source_map: true,
            parser_options: ParserOptions::default(),
        }
    }
}

#[derive(Debug)]
pub struct Renamer<F: SyntaxFrontend = OxcFrontend> {
    mapper: PathMapper,
    options: RenameOptions,
    frontend: F,
}

/// A single file after renaming.
#[derive(Debug, Clone)]
pub struct RenamedFile {
    pub file: EmittedFile,
    pub references: usize,
    /// A freshly generated map was attached.
    pub source_map: bool,
}

/// Code after reference rewriting, with the number of edits applied.
struct RewrittenCode {
    rewritten: Rewritten,
    references: usize,
}

impl Renamer {
    pub fn builder() -> RenamerBuilder {
        RenamerBuilder::new()
    }
}

impl<F: SyntaxFrontend> Renamer<F> {
    pub fn new(mapper: PathMapper, options: RenameOptions, frontend: F) -> Self {
        Self {
            mapper,
            options,
            frontend,
        }
    }

    pub fn options(&self) -> &RenameOptions {
        &self.options
    }

    pub fn mapper(&self) -> &PathMapper {
        &self.mapper
    }

    /// Rename every entry that passes the filter and swap the result into `bundle`.
    pub fn rename_bundle(&self, bundle: &mut Bundle) -> Result<RenameReport> {
        let mut report = RenameReport {
            total_files: bundle.len(),
            ..RenameReport::default()
        };
        let mut files: BTreeMap<String, EmittedFile> = BTreeMap::new();

        for (key, file) in &bundle.files {
            if !self.options.filter.matches(file.facade_id.as_deref()) {
                log_status!("rename", "Skipping {} (filtered)", key);
                report.skipped.push(key.clone());
                place(&mut files, &mut report, key, key.clone(), file.clone());
                continue;
            }

            let RenamedFile {
                file: renamed,
                references,
                source_map,
            } = self.rename_file(file).map_err(|e| e.in_file(key))?;
            let new_key = self.mapper.apply(key);

            log_status!(
                "rename",
                "{} -> {} ({} references)",
                key,
                new_key,
                references
            );

            report.total_references += references;
            report.renamed.push(RenamedEntry {
                from: key.clone(),
                to: new_key.clone(),
                file_name: renamed.file_name.clone(),
                references,
                source_map,
            });
            place(&mut files, &mut report, key, new_key, renamed);
        }

        bundle.files = files;
        Ok(report)
    }

    /// Transform one file: facade id, output name, imports and code.
    ///
    /// Filtering of the file itself is the caller's concern; imports are
    /// still checked one by one.
    pub fn rename_file(&self, file: &EmittedFile) -> Result<RenamedFile> {
        let mut renamed = file.clone();

        renamed.facade_id = file.facade_id.as_deref().map(|id| self.mapper.apply(id));
        renamed.file_name = self.mapper.apply(&file.file_name);
        renamed.imports = file
            .imports
            .iter()
            .map(|name| {
                if self.options.filter.matches(Some(name)) {
                    self.mapper.apply(name)
                } else {
                    name.clone()
                }
            })
            .collect();

        let Some(code) = file.code.as_deref().filter(|code| !code.is_empty()) else {
            return Ok(RenamedFile {
                file: renamed,
                references: 0,
                source_map: false,
            });
        };

        let map_options = self
            .options
            .source_map
            .then(|| SourceMapOptions::new(&file.file_name, &renamed.file_name));
        let RewrittenCode {
            rewritten,
            references,
        } = self.rewrite_references(code, map_options.as_ref())?;

        renamed.code = Some(rewritten.code);
        let source_map = rewritten.map.is_some();
        if let Some(map) = rewritten.map {
            renamed.map = Some(map);
        }

        Ok(RenamedFile {
            file: renamed,
            references,
            source_map,
        })
    }

    /// Rewrite every string-valued module reference in `code` through the mapper.
    pub fn rewrite_code(&self, code: &str, map: Option<&SourceMapOptions>) -> Result<Rewritten> {
        self.rewrite_references(code, map).map(|result| result.rewritten)
    }

    fn rewrite_references(&self, code: &str, map: Option<&SourceMapOptions>) -> Result<RewrittenCode> {
        let tree = self.frontend.parse(code, &self.options.parser_options)?;
        let references = collect_references(&self.frontend, &tree);

        let mut rewriter = TextRewriter::new(code);
        for reference in &references {
            let Some(specifier) = reference.specifier() else {
                continue;
            };
            rewriter.overwrite(
                reference.span.start,
                reference.span.end,
                quote(&self.mapper.apply(specifier)),
            )?;
        }

        let references = rewriter.edits().len();
        Ok(RewrittenCode {
            rewritten: rewriter.finish(map),
            references,
        })
    }
}

/// Insert under `new_key`; a key already taken is overwritten and reported.
fn place(
    files: &mut BTreeMap<String, EmittedFile>,
    report: &mut RenameReport,
    old_key: &str,
    new_key: String,
    file: EmittedFile,
) {
    if files.contains_key(&new_key) {
        let message = format!("'{}' replaces an earlier entry renamed to '{}'", old_key, new_key);
        log_status!("rename", "Warning: {}", message);
        report.warnings.push(RenameWarning {
            kind: "file_collision".to_string(),
            file: new_key.clone(),
            message,
        });
    }
    files.insert(new_key, file);
}

// ============================================================================
// Builder
// ============================================================================

pub struct RenamerBuilder {
    mapper: Option<PathMapper>,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    accept_missing_id: bool,
    resolve: Resolve,
    source_map: bool,
    parser_overrides: ParserOverrides,
}

impl Default for RenamerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenamerBuilder {
    pub fn new() -> Self {
        Self {
            mapper: None,
            include: Vec::new(),
            exclude: Vec::new(),
            accept_missing_id: false,
            resolve: Resolve::default(),
            source_map: true,
            parser_overrides: ParserOverrides::default(),
        }
    }

    pub fn map(self, map: impl Fn(&str) -> String + 'static) -> Self {
        self.mapper(PathMapper::new(map))
    }

    pub fn mapper(mut self, mapper: PathMapper) -> Self {
        self.mapper = Some(mapper);
        self
    }

    pub fn rules(self, rules: Vec<MapRule>) -> Result<Self> {
        Ok(self.mapper(PathMapper::from_rules(rules)?))
    }

    pub fn include(mut self, pattern: Pattern) -> Self {
        self.include.push(pattern);
        self
    }

    pub fn exclude(mut self, pattern: Pattern) -> Self {
        self.exclude.push(pattern);
        self
    }

    pub fn accept_missing_id(mut self, accept: bool) -> Self {
        self.accept_missing_id = accept;
        self
    }

    /// Base directory for relative glob patterns (default: working directory).
    pub fn resolve(self, base: impl Into<PathBuf>) -> Self {
        self.resolution(Resolve::Base(base.into()))
    }

    pub fn resolution(mut self, resolve: Resolve) -> Self {
        self.resolve = resolve;
        self
    }

    pub fn source_map(mut self, enabled: bool) -> Self {
        self.source_map = enabled;
        self
    }

    /// Layer parser options over the ES6 module base; later calls stack.
    pub fn parser_options(mut self, overrides: ParserOverrides) -> Self {
        let current = self.parser_overrides;
        self.parser_overrides = ParserOverrides {
            ecma_version: overrides.ecma_version.or(current.ecma_version),
            source_type: overrides.source_type.or(current.source_type),
            jsx: overrides.jsx.or(current.jsx),
            typescript: overrides.typescript.or(current.typescript),
            allow_return_outside_function: overrides
                .allow_return_outside_function
                .or(current.allow_return_outside_function),
        };
        self
    }

    pub fn build(self) -> Result<Renamer> {
        self.build_with(OxcFrontend)
    }

    /// Build against a different syntax front end.
    pub fn build_with<F: SyntaxFrontend>(self, frontend: F) -> Result<Renamer<F>> {
        let mapper = self.mapper.ok_or_else(|| {
            Error::config_missing_key("map", None)
                .with_hint("Call .map(..) or .rules(..) before building the renamer")
        })?;

        let (include, exclude) = match self.resolve.base()? {
            Some(base) => (
                self.include.into_iter().map(|p| p.resolved(&base)).collect(),
                self.exclude.into_iter().map(|p| p.resolved(&base)).collect(),
            ),
            None => (self.include, self.exclude),
        };

        let parser_options = ParserOptions::default().with_overrides(&self.parser_overrides);
        if let Some(version) = parser_options.ignored_ecma_version() {
            log_status!(
                "rename",
                "ecmaVersion {} has no effect; the parser always accepts the latest syntax",
                version
            );
        }

        let options = RenameOptions {
            filter: Filter::new(include, exclude).with_accept_missing(self.accept_missing_id),
            source_map: self.source_map,
            parser_options,
        };

        Ok(Renamer::new(mapper, options, frontend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceKind;
    use crate::error::ErrorCode;
    use sourcemap::SourceMap;

    fn js_to_mjs() -> Renamer {
        Renamer::builder()
            .map(|name| name.replacen(".js", ".mjs", 1))
            .accept_missing_id(true)
            .build()
            .unwrap()
    }

    fn bundle_of(entries: Vec<(&str, EmittedFile)>) -> Bundle {
        let mut bundle = Bundle::new();
        for (key, file) in entries {
            bundle.insert(key, file);
        }
        bundle
    }

    #[test]
    fn build_without_map_fails() {
        let err = Renamer::builder().build().unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigMissingKey);
    }

    #[test]
    fn renames_key_name_facade_and_code() {
        let mut bundle = bundle_of(vec![(
            "index.js",
            EmittedFile::chunk("index.js", "import './dep.js';\n")
                .with_facade("/src/index.js")
                .with_imports(["dep.js"]),
        )]);

        let report = js_to_mjs().rename_bundle(&mut bundle).unwrap();

        assert!(!bundle.contains_key("index.js"));
        let file = bundle.get("index.mjs").unwrap();
        assert_eq!(file.file_name, "index.mjs");
        assert_eq!(file.facade_id.as_deref(), Some("/src/index.mjs"));
        assert_eq!(file.imports, vec!["dep.mjs".to_string()]);
        assert_eq!(file.code.as_deref(), Some("import './dep.mjs';\n"));
        assert!(file.map.is_some());

        assert_eq!(report.total_files, 1);
        assert_eq!(report.total_references, 1);
        assert_eq!(report.renamed[0].to, "index.mjs");
    }

    #[test]
    fn empty_mapping_keeps_originals() {
        let renamer = Renamer::builder()
            .map(|_| String::new())
            .accept_missing_id(true)
            .build()
            .unwrap();
        let mut bundle = bundle_of(vec![("a.js", EmittedFile::chunk("a.js", "require(\"./b.js\");"))]);

        renamer.rename_bundle(&mut bundle).unwrap();

        let file = bundle.get("a.js").unwrap();
        assert_eq!(file.file_name, "a.js");
        // The literal keeps its value but is re-quoted.
        assert_eq!(file.code.as_deref(), Some("require('./b.js');"));
    }

    #[test]
    fn filtered_files_are_untouched() {
        let renamer = Renamer::builder()
            .map(|name| name.replacen(".js", ".mjs", 1))
            .exclude(Pattern::glob("/src/vendor/**"))
            .build()
            .unwrap();
        let original = EmittedFile::chunk("lib.js", "import './dep.js';")
            .with_facade("/src/vendor/lib.js")
            .with_imports(["dep.js"]);
        let mut bundle = bundle_of(vec![("lib.js", original.clone())]);

        let report = renamer.rename_bundle(&mut bundle).unwrap();

        let file = bundle.get("lib.js").unwrap();
        assert_eq!(file.file_name, original.file_name);
        assert_eq!(file.imports, original.imports);
        assert_eq!(file.code, original.code);
        assert!(file.map.is_none());
        assert_eq!(report.skipped, vec!["lib.js".to_string()]);
        assert!(report.renamed.is_empty());
    }

    #[test]
    fn missing_facade_is_skipped_by_default() {
        let renamer = Renamer::builder()
            .map(|name| name.replacen(".js", ".mjs", 1))
            .build()
            .unwrap();
        let mut bundle = bundle_of(vec![("a.js", EmittedFile::chunk("a.js", ""))]);

        renamer.rename_bundle(&mut bundle).unwrap();
        assert!(bundle.contains_key("a.js"));
    }

    #[test]
    fn imports_respect_the_filter() {
        let renamer = Renamer::builder()
            .map(|name| name.replacen(".js", ".mjs", 1))
            .exclude(Pattern::glob("vendor.js"))
            .resolution(Resolve::Disabled)
            .accept_missing_id(true)
            .build()
            .unwrap();
        let mut bundle = bundle_of(vec![(
            "a.js",
            EmittedFile::asset("a.js").with_imports(["b.js", "vendor.js"]),
        )]);

        renamer.rename_bundle(&mut bundle).unwrap();
        assert_eq!(
            bundle.get("a.mjs").unwrap().imports,
            vec!["b.mjs".to_string(), "vendor.js".to_string()]
        );
    }

    #[test]
    fn assets_are_renamed_without_parsing() {
        let mut bundle = bundle_of(vec![("logo.js", EmittedFile::asset("logo.js"))]);
        let report = js_to_mjs().rename_bundle(&mut bundle).unwrap();

        let file = bundle.get("logo.mjs").unwrap();
        assert!(file.code.is_none());
        assert!(file.map.is_none());
        assert!(!report.renamed[0].source_map);
    }

    #[test]
    fn parse_error_leaves_bundle_untouched() {
        let mut bundle = bundle_of(vec![
            ("a.js", EmittedFile::chunk("a.js", "import './x.js';")),
            ("b.js", EmittedFile::chunk("b.js", "import {")),
        ]);

        let err = js_to_mjs().rename_bundle(&mut bundle).unwrap_err();

        assert_eq!(err.code, ErrorCode::ParseSyntaxError);
        assert_eq!(err.details["file"], "b.js");
        assert!(bundle.contains_key("a.js"));
        assert_eq!(bundle.get("a.js").unwrap().code.as_deref(), Some("import './x.js';"));
    }

    #[test]
    fn collisions_keep_last_writer_and_warn() {
        let renamer = Renamer::builder()
            .map(|_| "same.js".to_string())
            .accept_missing_id(true)
            .source_map(false)
            .build()
            .unwrap();
        let mut bundle = bundle_of(vec![
            ("a.js", EmittedFile::chunk("a.js", "1;")),
            ("b.js", EmittedFile::chunk("b.js", "2;")),
        ]);

        let report = renamer.rename_bundle(&mut bundle).unwrap();

        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.get("same.js").unwrap().code.as_deref(), Some("2;"));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, "file_collision");
    }

    fn chunk_with_map() -> EmittedFile {
        let mut file = EmittedFile::chunk("a.js", "require('./b.js');");
        file.map = Some(
            SourceMap::from_slice(
                br#"{"version":3,"sources":["a.ts"],"names":[],"mappings":"AAAA"}"#,
            )
            .unwrap(),
        );
        file
    }

    #[test]
    fn disabled_source_map_keeps_existing_map() {
        let renamer = Renamer::builder()
            .map(|name| name.replacen(".js", ".mjs", 1))
            .accept_missing_id(true)
            .source_map(false)
            .build()
            .unwrap();
        let mut bundle = bundle_of(vec![("a.js", chunk_with_map())]);

        let report = renamer.rename_bundle(&mut bundle).unwrap();

        let file = bundle.get("a.mjs").unwrap();
        assert_eq!(file.code.as_deref(), Some("require('./b.mjs');"));
        let map = file.map.as_ref().unwrap();
        assert_eq!(map.get_source(0), Some("a.ts"));
        assert_eq!(map.get_file(), None);
        assert_eq!(map.get_token_count(), 1);
        assert!(!report.renamed[0].source_map);
    }

    #[test]
    fn enabled_source_map_replaces_existing_map() {
        let mut bundle = bundle_of(vec![("a.js", chunk_with_map())]);

        let report = js_to_mjs().rename_bundle(&mut bundle).unwrap();

        let map = bundle.get("a.mjs").unwrap().map.as_ref().unwrap();
        assert_eq!(map.get_source(0), Some("a.js"));
        assert_eq!(map.get_file(), Some("a.mjs"));
        assert!(report.renamed[0].source_map);
    }

    #[test]
    fn relative_include_matches_absolute_facade() {
        let renamer = Renamer::builder()
            .map(|name| name.replacen(".js", ".mjs", 1))
            .include(Pattern::glob("src/**"))
            .resolve("/proj")
            .build()
            .unwrap();
        let mut bundle = bundle_of(vec![
            (
                "a.js",
                EmittedFile::chunk("a.js", "1;").with_facade("/proj/src/a.js"),
            ),
            (
                "b.js",
                EmittedFile::chunk("b.js", "2;").with_facade("/proj/test/b.js"),
            ),
        ]);

        let report = renamer.rename_bundle(&mut bundle).unwrap();

        assert!(bundle.contains_key("a.mjs"));
        assert_eq!(report.skipped, vec!["b.js".to_string()]);
    }

    #[test]
    fn relative_include_defaults_to_working_directory() {
        let cwd = std::env::current_dir().unwrap();
        let facade = cwd.join("src").join("a.js");
        let renamer = Renamer::builder()
            .map(|name| name.to_string())
            .include(Pattern::glob("src/**"))
            .build()
            .unwrap();

        assert!(renamer
            .options()
            .filter
            .matches(Some(&facade.to_string_lossy())));
    }

    #[test]
    fn source_map_names_old_and_new_file() {
        let mut bundle = bundle_of(vec![("a.js", EmittedFile::chunk("a.js", "require('./b.js');"))]);
        js_to_mjs().rename_bundle(&mut bundle).unwrap();

        let map = bundle.get("a.mjs").unwrap().map.clone().unwrap();
        assert_eq!(map.get_file(), Some("a.mjs"));
        assert_eq!(map.get_source(0), Some("a.js"));
    }

    #[test]
    fn parser_options_stack_over_base() {
        let renamer = Renamer::builder()
            .map(|name| name.to_string())
            .parser_options(ParserOverrides {
                source_type: Some(SourceKind::Script),
                ..ParserOverrides::default()
            })
            .parser_options(ParserOverrides {
                allow_return_outside_function: Some(true),
                ..ParserOverrides::default()
            })
            .build()
            .unwrap();

        let options = renamer.options().parser_options;
        assert_eq!(options.source_type, SourceKind::Script);
        assert!(options.allow_return_outside_function);

        let rewritten = renamer
            .rewrite_code("return require('./a.js');", None)
            .unwrap();
        assert_eq!(rewritten.code, "return require('./a.js');");
    }

    #[test]
    fn non_string_requires_are_left_alone() {
        let rewritten = js_to_mjs()
            .rewrite_code("require(42); require('./a.js');", None)
            .unwrap();
        assert_eq!(rewritten.code, "require(42); require('./a.mjs');");
    }
}
