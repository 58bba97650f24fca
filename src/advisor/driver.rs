// SPDX-License-Identifier: MPL-2.0
//! Tokio-based session driver for the install advisor.
//!
//! [`Session::spawn`] runs the state machine on a background task and
//! wires it to the outside world: platform signals and user actions
//! arrive on bounded channels, the current guidance card is published on
//! a watch channel, and the machine's timer commands become
//! `sleep_until` deadlines inside a `select!` loop. Nothing blocks: the
//! readiness signal, the user's install decision, and the timers are all
//! suspension points of the same loop.
//!
//! Dropping the [`Session`] aborts the task, which deregisters both
//! signal channels and drops every pending deadline, so no timer can
//! fire after teardown.

use super::card::GuidanceCard;
use super::environment::Environment;
use super::machine::{Advisor, Command, Event, InstallChoice, InstallPrompt, State, Timer};
use crate::clock::Clock;
use crate::storage::{Storage, DISMISSED_AT_KEY};
use std::fmt;
use std::future::{pending, Future};
use std::pin::Pin;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Platform install signals fed into the session.
pub enum PlatformSignal {
    /// The "before install" event: native installability confirmed,
    /// carrying the deferred prompt handle.
    PromptAvailable(Box<dyn InstallPrompt>),
    /// The "app installed" event.
    AppInstalled,
}

impl fmt::Debug for PlatformSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformSignal::PromptAvailable(_) => f.write_str("PromptAvailable(..)"),
            PlatformSignal::AppInstalled => f.write_str("AppInstalled"),
        }
    }
}

/// User interactions with the guidance card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Install,
    Dismiss,
}

type PromptFuture = Pin<Box<dyn Future<Output = InstallChoice> + Send>>;

/// Handle to a running advisor session.
///
/// Dropping the handle tears the session down: the background task is
/// aborted, both listeners are deregistered, and pending timers are
/// discarded.
pub struct Session {
    signals: mpsc::Sender<PlatformSignal>,
    actions: mpsc::Sender<UserAction>,
    card: watch::Receiver<Option<GuidanceCard>>,
    task: JoinHandle<()>,
}

impl Session {
    /// Spawns the session task. Must be called within a tokio runtime.
    ///
    /// The mount-time decision (standalone check, dismissal cooldown,
    /// classification) happens immediately on the spawned task; a
    /// suppressed session finishes without registering anything.
    #[must_use]
    pub fn spawn(
        env: Environment,
        storage: Box<dyn Storage + Send>,
        clock: Box<dyn Clock + Send>,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel(8);
        let (action_tx, action_rx) = mpsc::channel(8);
        let (card_tx, card_rx) = watch::channel(None);

        let task = SessionTask {
            advisor: Advisor::new(&env),
            storage,
            clock,
            signal_rx,
            action_rx,
            card_tx,
            display_deadline: None,
            native_delay_deadline: None,
            signal_timeout_deadline: None,
            prompt_future: None,
        };

        Self {
            signals: signal_tx,
            actions: action_tx,
            card: card_rx,
            task: tokio::spawn(task.run()),
        }
    }

    /// Sender for platform install signals.
    #[must_use]
    pub fn signals(&self) -> mpsc::Sender<PlatformSignal> {
        self.signals.clone()
    }

    /// Sender for user actions on the card.
    #[must_use]
    pub fn actions(&self) -> mpsc::Sender<UserAction> {
        self.actions.clone()
    }

    /// Receiver publishing the currently visible card, if any.
    #[must_use]
    pub fn card(&self) -> watch::Receiver<Option<GuidanceCard>> {
        self.card.clone()
    }

    /// Whether the session reached a terminal state and stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct SessionTask {
    advisor: Advisor,
    storage: Box<dyn Storage + Send>,
    clock: Box<dyn Clock + Send>,
    signal_rx: mpsc::Receiver<PlatformSignal>,
    action_rx: mpsc::Receiver<UserAction>,
    card_tx: watch::Sender<Option<GuidanceCard>>,
    display_deadline: Option<Instant>,
    native_delay_deadline: Option<Instant>,
    signal_timeout_deadline: Option<Instant>,
    prompt_future: Option<PromptFuture>,
}

impl SessionTask {
    async fn run(mut self) {
        let dismissed_at = self
            .storage
            .get(DISMISSED_AT_KEY)
            .and_then(|raw| raw.trim().parse::<i64>().ok());
        let now_ms = self.clock.now_millis();
        let commands = self.advisor.mount(now_ms, dismissed_at);
        self.apply(commands);

        loop {
            if self.is_terminal() {
                break;
            }

            let event = tokio::select! {
                signal = self.signal_rx.recv() => match signal {
                    Some(PlatformSignal::PromptAvailable(handle)) => Event::PromptAvailable(handle),
                    Some(PlatformSignal::AppInstalled) => Event::AppInstalled,
                    None => break,
                },
                action = self.action_rx.recv() => match action {
                    Some(UserAction::Install) => Event::InstallClicked,
                    Some(UserAction::Dismiss) => Event::DismissClicked {
                        now_ms: self.clock.now_millis(),
                    },
                    None => break,
                },
                () = deadline(self.display_deadline) => {
                    self.display_deadline = None;
                    Event::TimerFired(Timer::DisplayDelay)
                }
                () = deadline(self.native_delay_deadline) => {
                    self.native_delay_deadline = None;
                    Event::TimerFired(Timer::NativeDisplayDelay)
                }
                () = deadline(self.signal_timeout_deadline) => {
                    self.signal_timeout_deadline = None;
                    Event::TimerFired(Timer::NativeSignalTimeout)
                }
                choice = next_choice(&mut self.prompt_future) => {
                    self.prompt_future = None;
                    Event::InstallChoiceMade(choice)
                }
            };

            let before = self.advisor.state();
            let commands = self.advisor.handle(event);
            log::debug!(
                "install advisor: {:?} -> {:?}",
                before,
                self.advisor.state()
            );
            self.apply(commands);
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self.advisor.state(),
            State::Suppressed | State::Dismissed | State::Installed
        )
    }

    fn apply(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::StartTimer(timer) => {
                    self.set_deadline(timer, Some(Instant::now() + timer.duration()));
                }
                Command::CancelTimer(timer) => self.set_deadline(timer, None),
                Command::ClearTimers => {
                    self.display_deadline = None;
                    self.native_delay_deadline = None;
                    self.signal_timeout_deadline = None;
                }
                Command::WatchPlatformSignals => {
                    // The channels exist from spawn; a driver binding
                    // real browser listeners registers them here.
                }
                Command::ShowCard(variant) => {
                    let _ = self.card_tx.send_replace(GuidanceCard::for_variant(variant));
                }
                Command::HideCard => {
                    let _ = self.card_tx.send_replace(None);
                }
                Command::PersistDismissal(timestamp_ms) => {
                    if let Err(err) = self
                        .storage
                        .set(DISMISSED_AT_KEY, &timestamp_ms.to_string())
                    {
                        // Treated as not-dismissed on the next load.
                        log::warn!("failed to persist dismissal timestamp: {}", err);
                    }
                }
                Command::RunInstallPrompt => {
                    if let Some(handle) = self.advisor.take_prompt() {
                        self.prompt_future = Some(handle.prompt());
                    }
                }
            }
        }
    }

    fn set_deadline(&mut self, timer: Timer, deadline: Option<Instant>) {
        match timer {
            Timer::DisplayDelay => self.display_deadline = deadline,
            Timer::NativeDisplayDelay => self.native_delay_deadline = deadline,
            Timer::NativeSignalTimeout => self.signal_timeout_deadline = deadline,
        }
    }
}

async fn deadline(until: Option<Instant>) {
    match until {
        Some(instant) => sleep_until(instant).await,
        None => pending().await,
    }
}

async fn next_choice(prompt: &mut Option<PromptFuture>) -> InstallChoice {
    match prompt {
        Some(future) => future.as_mut().await,
        None => pending().await,
    }
}
