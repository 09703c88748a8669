use anyhow::{bail, Result};

use crate::cli::CreateCommands;
use crate::orchestrator::OrchestrationCore;

/// Dispatch a `create` subcommand to the matching one-shot tool script.
/// These are blocking helper invocations; the exit code is the contract.
pub async fn run(core: &OrchestrationCore, command: CreateCommands) -> Result<()> {
    let result = match &command {
        CreateCommands::Wallet { name, password } => core.create_wallet(name, password).await,
        CreateCommands::Keys { name, password } => core.create_keys(name, password).await,
        CreateCommands::Diddoc {
            name,
            did,
            controller,
            password,
        } => core.create_did_document(name, did, controller, password).await,
    };

    match result {
        Ok(()) => {
            println!("SUCCESS");
            Ok(())
        }
        Err(e) => bail!("{e}"),
    }
}
