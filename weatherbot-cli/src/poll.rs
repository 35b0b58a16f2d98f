//! Long-polling delivery: fetch updates, answer each in turn, repeat.

use std::{future::Future, time::Duration};

use anyhow::Context;
use tracing::{debug, info, warn};
use weatherbot_core::{ChatTransport, MessageDispatcher, TelegramClient, Update};

/// Pause after a failed `getUpdates` call.
const RETRY_PAUSE: Duration = Duration::from_secs(3);

pub async fn run(
    dispatcher: &MessageDispatcher,
    telegram: &TelegramClient,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    telegram
        .delete_webhook()
        .await
        .context("Failed to remove webhook before long polling")?;

    tokio::pin!(shutdown);
    let mut offset = None;

    info!("Bot started, waiting for messages");

    loop {
        let updates = tokio::select! {
            _ = &mut shutdown => break,
            updates = telegram.get_updates(offset) => updates,
        };

        match updates {
            Ok(updates) => {
                if let Some(next) = handle_updates(dispatcher, telegram, updates).await {
                    offset = Some(next);
                }
            }
            Err(err) => {
                warn!(error = %err, "getUpdates failed, retrying in {}s", RETRY_PAUSE.as_secs());
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(RETRY_PAUSE) => {}
                }
            }
        }
    }

    info!("Long polling stopped");
    Ok(())
}

/// Answers every text message in `updates`, one after another.
///
/// Returns the offset that acknowledges the whole batch, or `None` for an
/// empty batch.
async fn handle_updates(
    dispatcher: &MessageDispatcher,
    transport: &dyn ChatTransport,
    updates: Vec<Update>,
) -> Option<i64> {
    let mut next_offset = None;

    for update in updates {
        next_offset = Some(update.update_id + 1);

        match update.into_incoming() {
            Some(message) => {
                debug!(chat_id = message.chat_id, "handling message");
                dispatcher.dispatch(message, transport).await;
            }
            None => debug!("skipping update without text"),
        }
    }

    next_offset
}
