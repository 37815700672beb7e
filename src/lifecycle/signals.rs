//! OS signal handling.
//!
//! SIGINT, SIGTERM and SIGQUIT are forwarded, in arrival order, into a
//! channel consumed by the shutdown coordinator. Every signal is forwarded;
//! deciding that only the first one counts is the coordinator's job.

use std::fmt;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
    Quit,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Terminate => "SIGTERM",
            TerminationSignal::Quit => "SIGQUIT",
        };
        f.write_str(name)
    }
}

/// Register handlers and return the stream of termination signals.
#[cfg(unix)]
pub fn listen() -> std::io::Result<mpsc::Receiver<TerminationSignal>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;
    let (tx, rx) = mpsc::channel(8);

    tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(()) = interrupt.recv() => TerminationSignal::Interrupt,
                Some(()) = terminate.recv() => TerminationSignal::Terminate,
                Some(()) = quit.recv() => TerminationSignal::Quit,
                else => break,
            };
            tracing::debug!(signal = %received, "Signal received");
            if tx.send(received).await.is_err() {
                break;
            }
        }
    });

    Ok(rx)
}

/// Register handlers and return the stream of termination signals.
#[cfg(not(unix))]
pub fn listen() -> std::io::Result<mpsc::Receiver<TerminationSignal>> {
    let (tx, rx) = mpsc::channel(8);

    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(TerminationSignal::Interrupt).await.is_err() {
                break;
            }
        }
    });

    Ok(rx)
}
