use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{inspect, rename};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "bundle-rename")]
#[command(version = VERSION)]
#[command(about = "Rename emitted bundle files and rewrite the module references that point at them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rename bundle entries and rewrite require/import/export paths
    Rename(rename::RenameArgs),
    /// List the static module references in one source file
    Inspect(inspect::InspectArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let (json_result, exit_code) = commands::run_json(cli.command);
    output::print_json_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
