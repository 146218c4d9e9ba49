//! Command dispatch: bridges CLI args -> registry operations -> output formatting.

pub mod config_cmd;
pub mod notify;
pub mod records;
pub mod server;
pub mod status;
pub mod util;

use arc_core::ResourceRegistry;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    registry: &ResourceRegistry,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => records::list(registry, args, global).await,
        Command::Get(args) => records::get(registry, args, global).await,
        Command::Create(args) => records::create(registry, args, global).await,
        Command::Update(args) => records::update(registry, args, global).await,
        Command::Delete(args) => records::delete(registry, args, global).await,
        Command::Label(args) => records::label(registry, args, global).await,
        Command::Refresh(args) => status::refresh(registry, args, global).await,
        Command::Check => status::check(registry, global).await,
        Command::Debug => status::debug(registry, global).await,
        Command::Notify(args) => notify::handle(registry, args, global).await,
        Command::Server(args) => server::handle(registry, args, global).await,
        // Handled in main before a registry exists
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
