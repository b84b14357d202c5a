use std::time::Duration;

use anyhow::Context;
use thiserror::Error;
use tokio::{net::TcpListener, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{connection::handle_connection, state::ServerContext};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 6379;
const DEFAULT_EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Error, Debug, PartialEq)]
pub enum CliError {
    #[error("Invalid command line flag: {0}")]
    InvalidCommandLineFlag(String),
    #[error("Invalid value for command line flag {0}")]
    InvalidCommandLineFlagValue(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// `None` turns the background expiry sweep off; keys then only expire lazily.
    pub expiry_sweep_interval: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            expiry_sweep_interval: Some(DEFAULT_EXPIRY_SWEEP_INTERVAL),
        }
    }
}

impl ServerConfig {
    /// Builds the configuration from process arguments, program name first.
    ///
    /// Accepts `--bind <addr>`, `--port <port>` and `--expiry-sweep-ms <ms>`
    /// (`0` disables the sweep).
    pub fn from_args<I: IntoIterator<Item = String>>(command_line_args: I) -> Result<Self, CliError> {
        let mut iter = command_line_args.into_iter().skip(1);
        let mut config = Self::default();

        while let Some(flag) = iter.next() {
            let Some(value) = iter.next() else {
                return Err(CliError::InvalidCommandLineFlagValue(flag));
            };

            let invalid_value = || CliError::InvalidCommandLineFlagValue(flag.clone());

            match flag.as_str() {
                "--bind" => {
                    if value.is_empty() {
                        return Err(invalid_value());
                    }
                    config.bind_address = value;
                }
                "--port" => {
                    config.port = value
                        .parse::<u16>()
                        .ok()
                        .filter(|port| *port > 0)
                        .ok_or_else(invalid_value)?;
                }
                "--expiry-sweep-ms" => {
                    let milliseconds = value
                        .parse::<u64>()
                        .map_err(|_| invalid_value())?;
                    config.expiry_sweep_interval =
                        (milliseconds > 0).then(|| Duration::from_millis(milliseconds));
                }
                _ => return Err(CliError::InvalidCommandLineFlag(flag.clone())),
            }
        }

        Ok(config)
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct RedisServer {
    context: ServerContext,
}

impl RedisServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            context: ServerContext::new(config),
        }
    }

    pub fn context(&self) -> &ServerContext {
        &self.context
    }

    /// Binds the configured address and serves until the process exits.
    pub async fn run(self) -> anyhow::Result<()> {
        let address = self.context.config.listen_address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("failed to bind {}", address))?;

        self.serve(listener).await
    }

    /// Accept loop over an already bound listener. Starts the expiry sweep
    /// when one is configured.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        info!(address = %listener.local_addr()?, "server listening");

        if let Some(interval) = self.context.config.expiry_sweep_interval {
            tokio::spawn(sweep_expired_keys(self.context.clone(), interval));
        }

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let context = self.context.clone();
                    tokio::spawn(async move {
                        handle_connection(stream, peer, context).await;
                    });
                }
                Err(error) => {
                    warn!(%error, "failed to accept connection");
                }
            }
        }
    }
}

/// Periodically drops expired keys that nobody touches.
async fn sweep_expired_keys(context: ServerContext, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let removed = context.store.lock().await.remove_expired();
        if removed > 0 {
            debug!(removed, "expired keys swept");
        }
    }
}
