use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use bundle_rename::filter::Resolve;
use bundle_rename::rename::{RenameReport, RenameWarning};
use bundle_rename::utils::io;
use bundle_rename::{Bundle, MapRule, Pattern, RenameConfig};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct RenameArgs {
    /// Bundle JSON file keyed by output name (`-` reads stdin)
    #[arg(long)]
    bundle: String,
    /// Rename configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Extension rule FROM=TO, applied after configured rules (repeatable)
    #[arg(long = "map", value_name = "FROM=TO")]
    map: Vec<String>,
    /// Only rename files whose facade module matches (glob, or re:<regex>)
    #[arg(long)]
    include: Vec<String>,
    /// Never rename files whose facade module matches (glob, or re:<regex>)
    #[arg(long)]
    exclude: Vec<String>,
    /// Leave relative globs unanchored instead of joining them to the working directory
    #[arg(long)]
    no_resolve: bool,
    /// Also rename files without a facade module
    #[arg(long)]
    accept_missing_id: bool,
    /// Skip source map generation
    #[arg(long)]
    no_source_map: bool,
    /// Where to write the renamed bundle (default: in place)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum RenameOutput {
    #[serde(rename = "rename")]
    Rename {
        dry_run: bool,
        total_files: usize,
        total_references: usize,
        renamed: Vec<EntrySummary>,
        skipped: Vec<String>,
        warnings: Vec<RenameWarning>,
        #[serde(skip_serializing_if = "Option::is_none")]
        written_to: Option<String>,
        /// The renamed bundle itself, when there is no file to write it to.
        #[serde(skip_serializing_if = "Option::is_none")]
        bundle: Option<Bundle>,
    },
}

#[derive(Serialize)]
pub struct EntrySummary {
    pub from: String,
    pub to: String,
    pub references: usize,
    pub source_map: bool,
}

pub fn run(args: RenameArgs) -> CmdResult<RenameOutput> {
    let mut config = match &args.config {
        Some(path) => RenameConfig::load(path)?,
        None => RenameConfig::default(),
    };

    if !args.map.is_empty() {
        let extra = args
            .map
            .iter()
            .map(|spec| MapRule::parse_shorthand(spec))
            .collect::<bundle_rename::Result<Vec<_>>>()?;
        config.map.get_or_insert_with(Vec::new).extend(extra);
    }

    let mut builder = config.into_builder()?;
    for pattern in &args.include {
        builder = builder.include(Pattern::parse(pattern)?);
    }
    for pattern in &args.exclude {
        builder = builder.exclude(Pattern::parse(pattern)?);
    }
    if args.no_resolve {
        builder = builder.resolution(Resolve::Disabled);
    }
    if args.accept_missing_id {
        builder = builder.accept_missing_id(true);
    }
    if args.no_source_map {
        builder = builder.source_map(false);
    }
    let renamer = builder.build()?;

    let content = io::read_input(&args.bundle, "read bundle")?;
    let mut bundle = Bundle::from_json(&content)?;
    let report = renamer.rename_bundle(&mut bundle)?;

    let destination = args
        .output
        .clone()
        .or_else(|| (args.bundle.trim() != "-").then(|| PathBuf::from(&args.bundle)));

    let (written_to, bundle) = match destination {
        Some(path) if !args.dry_run => {
            io::write_file_atomic(&path, &bundle.to_json_pretty()?, "write bundle")?;
            (Some(path.display().to_string()), None)
        }
        Some(_) => (None, None),
        None => (None, Some(bundle)),
    };

    Ok((summarize(report, args.dry_run, written_to, bundle), 0))
}

fn summarize(
    report: RenameReport,
    dry_run: bool,
    written_to: Option<String>,
    bundle: Option<Bundle>,
) -> RenameOutput {
    RenameOutput::Rename {
        dry_run,
        total_files: report.total_files,
        total_references: report.total_references,
        renamed: report
            .renamed
            .into_iter()
            .map(|entry| EntrySummary {
                from: entry.from,
                to: entry.to,
                references: entry.references,
                source_map: entry.source_map,
            })
            .collect(),
        skipped: report.skipped,
        warnings: report.warnings,
        written_to,
        bundle,
    }
}
