//! Poll runtime: the self-rescheduling fetch loop and the identity probe.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;

use miggram_core::{
    classify::{classify, EventKind},
    config::{Config, DEFAULT_IDENTITY_RETRY, DEFAULT_POLL_INTERVAL},
    cursor::{Admit, RawUpdate, UpdateCursor},
    Result,
};

use crate::{client::Client, decorate::decorate, events::dispatch, events::EventHandler};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollSettings {
    /// Pause between the end of one tick and the start of the next.
    pub interval: Duration,
    pub identity_retry: Duration,
    /// Start the polling task at all. The identity probe always runs.
    pub streaming: bool,
    /// Send the offset acknowledgement after each non-empty fetch.
    pub ack_updates: bool,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            identity_retry: DEFAULT_IDENTITY_RETRY,
            streaming: true,
            ack_updates: true,
        }
    }
}

impl From<&Config> for PollSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            interval: cfg.poll_interval,
            identity_retry: cfg.identity_retry,
            streaming: cfg.streaming,
            ack_updates: cfg.ack_updates,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Empty,
    Stale { update_id: i64 },
    /// Admitted, but of a shape no hook handles.
    Skipped { update_id: i64 },
    Dispatched(EventKind),
}

/// Owns the cursor; one tick at a time.
pub struct Poller {
    client: Client,
    handler: Arc<dyn EventHandler>,
    cursor: UpdateCursor,
    ack_updates: bool,
}

impl Poller {
    pub fn new(client: Client, handler: Arc<dyn EventHandler>, ack_updates: bool) -> Self {
        Self {
            client,
            handler,
            cursor: UpdateCursor::new(),
            ack_updates,
        }
    }

    pub fn cursor(&self) -> &UpdateCursor {
        &self.cursor
    }

    /// One fetch → ack → admit → classify → decorate → emit cycle.
    ///
    /// The cursor advances before classification, so a malformed update is
    /// reported once and not redelivered.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        let result = self.client.get_updates(None).await?;
        let batch = RawUpdate::batch_from_value(result)?;

        if self.ack_updates {
            if let Some(offset) = UpdateCursor::ack_offset(&batch) {
                self.acknowledge(offset).await;
            }
        }

        let update = match self.cursor.admit(batch) {
            Admit::Empty => return Ok(TickOutcome::Empty),
            Admit::Stale { update_id } => return Ok(TickOutcome::Stale { update_id }),
            Admit::Fresh(update) => update,
        };
        let update_id = update.update_id;

        let Some(classified) = classify(update)? else {
            tracing::debug!(update_id, "skipping update of unknown shape");
            return Ok(TickOutcome::Skipped { update_id });
        };

        let event = decorate(&self.client, classified);
        let kind = event.kind();
        tracing::debug!(update_id, ?kind, "dispatching update");
        dispatch(self.handler.as_ref(), event).await;
        Ok(TickOutcome::Dispatched(kind))
    }

    /// Ask the server to drop everything below `offset`. The returned batch is
    /// not used.
    async fn acknowledge(&self, offset: i64) {
        if let Err(e) = self.client.get_updates(Some(offset)).await {
            tracing::debug!(offset, error = %e, "offset acknowledgement failed");
        }
    }

    /// Tick until cancelled. A failed tick is logged and the loop carries on.
    pub async fn run(mut self, interval: Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                res = self.tick() => match res {
                    Ok(outcome) => tracing::trace!(?outcome, "tick"),
                    Err(e) if e.is_poll_conflict() => {
                        tracing::debug!(error = %e, "another consumer is polling; skipping tick");
                    }
                    Err(e) => tracing::warn!(error = %e, "poll tick failed"),
                },
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(interval) => {}
            }
        }
        tracing::debug!(last_update = ?self.cursor.last(), "polling stopped");
    }
}

/// Resolve the bot identity, retrying until it succeeds or `cancel` fires.
/// `ready` fires only for the call that stores the identity.
async fn probe_identity(
    client: Client,
    handler: Arc<dyn EventHandler>,
    retry: Duration,
    cancel: CancellationToken,
) {
    loop {
        let res = tokio::select! {
            _ = cancel.cancelled() => return,
            res = client.get_me() => res,
        };

        match res {
            Ok(me) => {
                if client.set_identity(me.clone()) {
                    tracing::info!(
                        id = me.id.0,
                        username = me.username.as_deref().unwrap_or(""),
                        "bot identity resolved"
                    );
                    handler.ready(&me).await;
                }
                return;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    retry_ms = retry.as_millis() as u64,
                    "identity probe failed; retrying"
                );
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = sleep(retry) => {}
        }
    }
}

pub struct Runtime;

impl Runtime {
    /// Spawn the identity probe and, when streaming, the poll loop.
    pub fn start(
        client: Client,
        handler: Arc<dyn EventHandler>,
        settings: PollSettings,
    ) -> BotHandle {
        let cancel = CancellationToken::new();

        let probe = tokio::spawn(probe_identity(
            client.clone(),
            handler.clone(),
            settings.identity_retry,
            cancel.clone(),
        ));

        let poll = settings.streaming.then(|| {
            tracing::info!(
                interval_ms = settings.interval.as_millis() as u64,
                ack = settings.ack_updates,
                "polling started"
            );
            let poller = Poller::new(client, handler, settings.ack_updates);
            tokio::spawn(poller.run(settings.interval, cancel.clone()))
        });

        BotHandle {
            cancel,
            probe,
            poll,
        }
    }
}

pub struct BotHandle {
    cancel: CancellationToken,
    probe: JoinHandle<()>,
    poll: Option<JoinHandle<()>>,
}

impl BotHandle {
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.poll.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel both tasks and wait for them to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.probe.await {
            tracing::warn!(error = %e, "identity probe task failed");
        }
        if let Some(poll) = self.poll {
            if let Err(e) = poll.await {
                tracing::warn!(error = %e, "poll task failed");
            }
        }
    }
}
