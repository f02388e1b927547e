//! Application runtime composition modules.

pub(crate) mod repos;
pub(crate) mod scholar;
pub(crate) mod terminal;

use std::future::Future;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::ProcessExit;
use crate::cli::{Args, Command};

/// Runs the selected sync, racing it against Ctrl-C.
pub(crate) async fn run(args: Args) -> ProcessExit {
    let no_color = terminal::is_no_color_requested(&args);
    terminal::init_tracing(
        terminal::resolve_default_log_level(args.quiet, args.verbose),
        no_color,
    );
    debug!(?args, "CLI arguments parsed");

    let result: Result<()> = tokio::select! {
        result = dispatch(&args.command) => result,
        () = wait_for_interrupt(tokio::signal::ctrl_c()) => {
            info!("Aborted by user.");
            return ProcessExit::Failure;
        }
    };

    match result {
        Ok(()) => ProcessExit::Success,
        Err(err) => {
            error!("{err:#}");
            ProcessExit::Failure
        }
    }
}

/// Resolves once `signal` reports Ctrl-C. A handler that cannot be installed
/// never resolves, so the sync runs to completion.
async fn wait_for_interrupt(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(err) = signal.await {
        warn!("Unable to listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
}

async fn dispatch(command: &Command) -> Result<()> {
    match command {
        Command::Repos(args) => repos::run(args).await,
        Command::Scholar(args) => scholar::run(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_for_interrupt_resolves_on_signal() {
        let signal = async { Ok::<(), std::io::Error>(()) };
        let result = tokio::time::timeout(Duration::from_secs(1), wait_for_interrupt(signal)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_wait_for_interrupt_pends_when_handler_fails() {
        let failing = async { Err::<(), _>(std::io::Error::other("no signal support")) };
        let result =
            tokio::time::timeout(Duration::from_millis(50), wait_for_interrupt(failing)).await;
        assert!(result.is_err(), "a failed handler must not count as an interrupt");
    }
}
