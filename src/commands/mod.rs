pub type CmdResult<T> = bundle_rename::Result<(T, i32)>;

pub mod inspect;
pub mod rename;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args))
    };
}

pub(crate) fn run_json(command: crate::Commands) -> (bundle_rename::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Rename(args) => dispatch!(args, rename),
        crate::Commands::Inspect(args) => dispatch!(args, inspect),
    }
}
