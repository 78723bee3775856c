use std::fs::File;

use anyhow::{Context, Result};
use hookrelay::discord;
use hookrelay::settings::{Logging, Settings};
use hookrelay::webhook::Dispatcher;
use log::{debug, info};
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use tokio::signal;
use tokio::sync::mpsc;

/// Envelopes waiting for their delivery task to be spawned.
const QUEUE_SIZE: usize = 64;

#[tokio::main]
async fn main() -> Result<()> {
    // Loading .env file
    dotenv::dotenv().ok();

    let settings = Settings::new().await?;
    init_logger(&settings.logging)?;

    info!("Configuring ...");

    let http = discord::new_client(&settings.discord);
    let user = http
        .current_user()
        .exec()
        .await
        .context("failed authenticating with the Discord API")?
        .model()
        .await
        .context("failed reading the current user")?;
    info!("Authenticated as {} ({})", user.name, user.id);

    let dispatcher = Dispatcher::new(settings.webhooks.clone());
    let (sender, mut receiver) = mpsc::channel(QUEUE_SIZE);

    info!("Starting ...");
    let cluster = discord::start(&settings.discord, sender).await?;

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            envelope = receiver.recv() => {
                let envelope = match envelope {
                    Some(envelope) => envelope,
                    None => break,
                };

                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher.post(&envelope).await;
                });
            }
            res = &mut shutdown => {
                res.context("failed setting up CTRL+C listener")?;
                break;
            }
        }
    }

    debug!("Stopping cluster");
    cluster.down();
    info!("Shut down");

    Ok(())
}

/// Set up a combined logger which will log to the terminal and a file, depending on the
/// settings.
fn init_logger(logging: &Logging) -> Result<()> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if let Some(terminal) = &logging.terminal {
        loggers.push(TermLogger::new(
            terminal.filter,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ));
    }

    if let Some(file) = &logging.file {
        let target = File::create(&file.path)
            .with_context(|| format!("failed creating log file at '{}'", file.path.display()))?;
        loggers.push(WriteLogger::new(file.base.filter, Config::default(), target));
    }

    CombinedLogger::init(loggers).context("logger failed to set up")
}
