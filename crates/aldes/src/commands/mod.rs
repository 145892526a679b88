//! Command dispatch: bridges CLI args -> hub operations -> output formatting.

pub mod config_cmd;
pub mod modes;
pub mod products;
pub mod sensors;
pub mod set_mode;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an account-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Products => products::handle(global).await,
        Command::Sensors(args) => sensors::handle(args, global).await,
        Command::SetMode(args) => set_mode::handle(args, global).await,
        Command::Watch(args) => watch::handle(args, global).await,
        // Local commands are handled before dispatch
        Command::Modes
        | Command::Config(_)
        | Command::Completions(_)
        | Command::Man => unreachable!(),
    }
}
