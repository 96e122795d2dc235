//! Ctrl+C / SIGTERM for interactive commands

use tokio::sync::watch;
use tracing::debug;

/// Latching flag set by the first SIGINT or SIGTERM
pub struct ShutdownSignal {
    raised: watch::Sender<bool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (raised, _) = watch::channel(false);
        Self { raised }
    }

    pub fn is_shutdown(&self) -> bool {
        *self.raised.borrow()
    }

    pub fn trigger(&self) {
        self.raised.send_replace(true);
    }

    /// Resolves once the flag is set, immediately if it already is
    pub async fn recv(&self) {
        let mut rx = self.raised.subscribe();
        // Sender is owned by self; the channel stays open
        let _ = rx.wait_for(|&raised| raised).await;
    }

    /// Install the OS handlers. Needs a running tokio runtime.
    pub fn setup(&self) -> std::io::Result<()> {
        #[cfg(unix)]
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

        let raised = self.raised.clone();
        tokio::spawn(async move {
            #[cfg(unix)]
            let name = tokio::select! {
                res = tokio::signal::ctrl_c() => res.map(|_| "SIGINT"),
                _ = sigterm.recv() => Ok("SIGTERM"),
            };
            #[cfg(not(unix))]
            let name = tokio::signal::ctrl_c().await.map(|_| "ctrl-c");

            match name {
                Ok(name) => {
                    debug!(signal = name, "shutdown requested");
                    raised.send_replace(true);
                }
                Err(e) => debug!(error = %e, "signal listener failed"),
            }
        });
        Ok(())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
