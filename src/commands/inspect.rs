use clap::Args;
use serde::Serialize;

use bundle_rename::classify::{collect_references, ModuleReference};
use bundle_rename::log_status;
use bundle_rename::config::SourceKind;
use bundle_rename::utils::io;
use bundle_rename::{OxcFrontend, ParserOptions, SyntaxFrontend};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct InspectArgs {
    /// JavaScript/TypeScript file to inspect (`-` reads stdin)
    file: String,
    /// Parse as a classic script instead of a module
    #[arg(long)]
    script: bool,
    /// Enable TypeScript syntax
    #[arg(long)]
    typescript: bool,
    /// Enable JSX syntax
    #[arg(long)]
    jsx: bool,
    /// Allow `return` at the top level
    #[arg(long)]
    allow_return: bool,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum InspectOutput {
    #[serde(rename = "inspect")]
    Inspect {
        file: String,
        total_references: usize,
        references: Vec<ReferenceSummary>,
    },
}

#[derive(Serialize)]
pub struct ReferenceSummary {
    #[serde(flatten)]
    pub reference: ModuleReference,
    /// One-based line of the literal.
    pub line: usize,
    /// One-based column of the literal, in characters.
    pub column: usize,
}

pub fn run(args: InspectArgs) -> CmdResult<InspectOutput> {
    let source = io::read_input(&args.file, "read source")?;

    let options = ParserOptions {
        source_type: if args.script {
            SourceKind::Script
        } else {
            SourceKind::Module
        },
        typescript: args.typescript,
        jsx: args.jsx,
        allow_return_outside_function: args.allow_return,
        ..ParserOptions::default()
    };

    let tree = OxcFrontend
        .parse(&source, &options)
        .map_err(|e| e.in_file(&args.file))?;
    let references: Vec<ReferenceSummary> = collect_references(&OxcFrontend, &tree)
        .into_iter()
        .map(|reference| {
            let (line, column) = line_column(&source, reference.span.start);
            ReferenceSummary {
                reference,
                line,
                column,
            }
        })
        .collect();

    log_status!("inspect", "{} references in {}", references.len(), args.file);

    Ok((
        InspectOutput::Inspect {
            file: args.file,
            total_references: references.len(),
            references,
        },
        0,
    ))
}

fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (line, before[line_start..].chars().count() + 1)
}
