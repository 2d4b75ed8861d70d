use crate::inventory::engine::RefreshEngine;
use crate::inventory::reconcile::RefreshMode;
use crate::inventory::token::{AuthContext, TokenProvider};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// No usable access token yet
    AwaitingToken,
    Idle,
    Refreshing,
    /// Sitting out the penalty after a fetch ran out of retries
    BackoffCooldown,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// Upper bound of the random delay added to each interval. Zero outside production.
    pub max_jitter: Duration,
    pub backoff_penalty: Duration,
    pub token_poll: Duration,
    /// Token changed signals arriving this soon after a derivation are ignored
    pub refresh_debounce: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            max_jitter: Duration::ZERO,
            backoff_penalty: Duration::from_secs(5 * 60),
            token_poll: Duration::from_secs(60),
            refresh_debounce: Duration::from_secs(60),
        }
    }
}

impl SchedulerConfig {
    fn next_tick(&self) -> Instant {
        let jitter_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        let jitter = match jitter_ms {
            0 => Duration::ZERO,
            max => Duration::from_millis(rand::rng().random_range(0..max)),
        };
        Instant::now() + self.interval + jitter
    }
}

/// Cloneable handle for everything outside the scheduler task.
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    signal: mpsc::Sender<()>,
    state: watch::Receiver<SchedulerState>,
}

impl RefreshHandle {
    /// Tells the scheduler the admin refresh token changed. Returns `false` once the scheduler is gone.
    pub fn token_changed(&self) -> bool {
        match self.signal.try_send(()) {
            Ok(()) => true,
            // one signal is already pending, that one covers this request
            Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.clone()
    }
}

enum Wake {
    Shutdown,
    Tick,
    TokenChanged,
}

/// Background loop driving inventory refreshes. It is the only writer of the snapshot store and
/// the only caller of [`TokenProvider::refresh`].
pub struct RefreshScheduler {
    engine: Arc<RefreshEngine>,
    tokens: Arc<TokenProvider>,
    config: SchedulerConfig,
    signals: mpsc::Receiver<()>,
    state: watch::Sender<SchedulerState>,
    shutdown: CancellationToken,
}

impl RefreshScheduler {
    pub fn new(
        engine: Arc<RefreshEngine>,
        tokens: Arc<TokenProvider>,
        config: SchedulerConfig,
        shutdown: CancellationToken,
    ) -> (Self, RefreshHandle) {
        let (signal_tx, signal_rx) = mpsc::channel(1);
        let (state_tx, state_rx) = watch::channel(SchedulerState::AwaitingToken);

        let scheduler = Self {
            engine,
            tokens,
            config,
            signals: signal_rx,
            state: state_tx,
            shutdown,
        };
        let handle = RefreshHandle {
            signal: signal_tx,
            state: state_rx,
        };
        (scheduler, handle)
    }

    fn set_state(&self, state: SchedulerState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            tracing::debug!(from = ?*current, to = ?state, "scheduler state");
            *current = state;
            true
        });
    }

    pub async fn run(mut self) {
        tracing::info!(interval_secs = self.config.interval.as_secs(), "refresh scheduler started");
        let mut mode = RefreshMode::Full;

        'token: while let Some(_ctx) = self.await_token().await {
            // A fresh token means a refresh right away
            let mut next_tick = Instant::now();

            loop {
                self.set_state(SchedulerState::Idle);

                match self.wait(next_tick).await {
                    Wake::Shutdown => break 'token,
                    Wake::Tick => {}
                    Wake::TokenChanged => {
                        if self.debounced() {
                            tracing::debug!("ignoring token change, derived too recently");
                            continue;
                        }
                        if let Err(e) = self.tokens.refresh().await {
                            tracing::warn!(error = %e, "cannot refresh admin token");
                            continue 'token;
                        }
                    }
                }

                if self.shutdown.is_cancelled() {
                    break 'token;
                }

                self.set_state(SchedulerState::Refreshing);

                let ctx = match self.tokens.acquire().await {
                    Ok(ctx) => ctx,
                    Err(e) => {
                        tracing::warn!(error = %e, "lost admin token");
                        continue 'token;
                    }
                };
                let Some(identity) = self.tokens.identity() else {
                    continue 'token;
                };

                match self.engine.run_cycle(&ctx, &identity, mode).await {
                    Ok(_) => mode = RefreshMode::Incremental,
                    Err(e) if e.is_retries_exceeded() => {
                        tracing::error!(error = %e, penalty_secs = self.config.backoff_penalty.as_secs(), "refresh failed, backing off");
                        self.set_state(SchedulerState::BackoffCooldown);
                        tokio::select! {
                            _ = self.shutdown.cancelled() => break 'token,
                            _ = sleep(self.config.backoff_penalty) => {}
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "refresh failed"),
                }

                next_tick = self.config.next_tick();
            }
        }

        self.set_state(SchedulerState::Stopped);
        tracing::info!("refresh scheduler stopped");
    }

    /// Polls the token provider until it hands out a context. `None` on shutdown.
    async fn await_token(&mut self) -> Option<AuthContext> {
        self.set_state(SchedulerState::AwaitingToken);
        let mut attempts: u32 = 0;

        loop {
            if self.shutdown.is_cancelled() {
                return None;
            }

            match self.tokens.acquire().await {
                Ok(ctx) => return Some(ctx),
                Err(e) => {
                    attempts += 1;
                    tracing::warn!(
                        character_id = ?self.tokens.identity().map(|i| i.character_id),
                        attempts,
                        error = %e,
                        "no usable token for admin character"
                    );
                }
            }

            let poll = Instant::now() + self.config.token_poll;
            if let Wake::Shutdown = self.wait(poll).await {
                return None;
            }
        }
    }

    async fn wait(&mut self, deadline: Instant) -> Wake {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Wake::Shutdown,
            signal = self.signals.recv() => match signal {
                Some(()) => Wake::TokenChanged,
                // every handle is gone, only the timer can wake us now
                None => {
                    tokio::select! {
                        _ = self.shutdown.cancelled() => Wake::Shutdown,
                        _ = sleep_until(deadline) => Wake::Tick,
                    }
                }
            },
            _ = sleep_until(deadline) => Wake::Tick,
        }
    }

    fn debounced(&self) -> bool {
        self.tokens
            .last_derivation()
            .is_some_and(|at| at.elapsed() < self.config.refresh_debounce)
    }
}
