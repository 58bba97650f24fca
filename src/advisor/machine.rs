// SPDX-License-Identifier: MPL-2.0
//! Session state machine for the install advisor.
//!
//! [`Advisor`] is a pure transition core: [`Advisor::mount`] and
//! [`Advisor::handle`] consume events (platform signals, timer expiries,
//! user actions) and return [`Command`]s describing timers to arm,
//! cards to show or hide, and timestamps to persist. The driver owns
//! real timers and storage; feeding a scripted event sequence here
//! exercises every transition without either.

use super::environment::{classify, Classification, Environment};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Cooldown after a dismissal during which no guidance is shown.
pub const DISMISS_COOLDOWN_MS: i64 = 24 * 60 * 60 * 1000;

/// The advisor's session timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Delay before showing a non-native guidance card.
    DisplayDelay,
    /// Shorter delay before showing the native install card once the
    /// readiness signal has arrived.
    NativeDisplayDelay,
    /// How long to wait for the readiness signal before giving up.
    NativeSignalTimeout,
}

impl Timer {
    #[must_use]
    pub fn duration(self) -> Duration {
        match self {
            Timer::DisplayDelay => Duration::from_millis(2_500),
            Timer::NativeDisplayDelay => Duration::from_millis(1_500),
            Timer::NativeSignalTimeout => Duration::from_millis(3_500),
        }
    }
}

/// Outcome of the platform's deferred install prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallChoice {
    Accepted,
    Dismissed,
}

/// Opaque platform-supplied capability for the native install prompt.
///
/// Held only between the readiness signal and the user's decision, then
/// discarded regardless of the outcome.
pub trait InstallPrompt: Send {
    /// Shows the platform's consent prompt and resolves to the user's
    /// choice.
    fn prompt(self: Box<Self>) -> Pin<Box<dyn Future<Output = InstallChoice> + Send>>;
}

/// Session states. `Dismissed`, `Installed`, and `Suppressed` are
/// terminal for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    /// Already standalone, cooldown active, or no guidance applies.
    Suppressed,
    /// Non-native variant waiting out the display delay.
    DelayPending(Classification),
    /// Native candidate waiting for the platform readiness signal.
    WaitingForNativeSignal,
    /// Readiness signal received; waiting out the shorter display delay.
    NativeReady,
    GuidanceShown(Classification),
    /// Android timed out without a readiness signal; manual steps shown.
    FallbackGuidance,
    /// Native prompt invoked; awaiting the user's asynchronous choice.
    PromptRunning,
    Dismissed,
    Installed,
}

/// Inputs to the state machine.
pub enum Event {
    TimerFired(Timer),
    /// The platform's "before install" signal, carrying the deferred
    /// prompt handle.
    PromptAvailable(Box<dyn InstallPrompt>),
    /// The platform's "app installed" signal.
    AppInstalled,
    InstallClicked,
    InstallChoiceMade(InstallChoice),
    DismissClicked { now_ms: i64 },
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::TimerFired(timer) => f.debug_tuple("TimerFired").field(timer).finish(),
            Event::PromptAvailable(_) => f.write_str("PromptAvailable(..)"),
            Event::AppInstalled => f.write_str("AppInstalled"),
            Event::InstallClicked => f.write_str("InstallClicked"),
            Event::InstallChoiceMade(choice) => {
                f.debug_tuple("InstallChoiceMade").field(choice).finish()
            }
            Event::DismissClicked { now_ms } => f
                .debug_struct("DismissClicked")
                .field("now_ms", now_ms)
                .finish(),
        }
    }
}

/// Instructions for the driver, emitted by each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartTimer(Timer),
    CancelTimer(Timer),
    ClearTimers,
    /// Begin listening for the platform's install signals.
    WatchPlatformSignals,
    ShowCard(Classification),
    HideCard,
    /// Persist the dismissal timestamp (epoch milliseconds).
    PersistDismissal(i64),
    /// Invoke the captured install prompt (take it via
    /// [`Advisor::take_prompt`]).
    RunInstallPrompt,
}

/// The install advisor's transition core.
pub struct Advisor {
    state: State,
    classification: Classification,
    android: bool,
    prompt: Option<Box<dyn InstallPrompt>>,
}

impl Advisor {
    /// Classifies the environment once; no further environment reads
    /// happen for the rest of the session.
    #[must_use]
    pub fn new(env: &Environment) -> Self {
        Self {
            state: State::Idle,
            classification: classify(env),
            android: env.is_android(),
            prompt: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// Takes ownership of the captured prompt handle, if any.
    pub fn take_prompt(&mut self) -> Option<Box<dyn InstallPrompt>> {
        self.prompt.take()
    }

    /// Runs the mount-time decision: standalone and cooldown checks
    /// first, then the classification routes into either the native
    /// signal wait or the plain display delay.
    ///
    /// A suppressed session emits no commands at all, so no listeners
    /// are registered and no timers are armed.
    pub fn mount(&mut self, now_ms: i64, dismissed_at: Option<i64>) -> Vec<Command> {
        if self.classification == Classification::None {
            self.state = State::Suppressed;
            return vec![];
        }

        if let Some(ts) = dismissed_at {
            if now_ms.saturating_sub(ts) < DISMISS_COOLDOWN_MS {
                self.state = State::Suppressed;
                return vec![];
            }
        }

        match self.classification {
            Classification::NativeInstall => {
                self.state = State::WaitingForNativeSignal;
                vec![
                    Command::WatchPlatformSignals,
                    Command::StartTimer(Timer::NativeSignalTimeout),
                ]
            }
            variant => {
                self.state = State::DelayPending(variant);
                vec![
                    Command::WatchPlatformSignals,
                    Command::StartTimer(Timer::DisplayDelay),
                ]
            }
        }
    }

    /// Feeds one event into the machine. Events that do not apply to
    /// the current state (stale timers, duplicate signals) are ignored.
    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::AppInstalled => self.on_app_installed(),
            Event::TimerFired(timer) => self.on_timer(timer),
            Event::PromptAvailable(handle) => self.on_prompt_available(handle),
            Event::InstallClicked => self.on_install_clicked(),
            Event::InstallChoiceMade(choice) => self.on_install_choice(choice),
            Event::DismissClicked { now_ms } => self.on_dismiss(now_ms),
        }
    }

    /// The "app installed" signal preempts everything: any pending
    /// display delay is cancelled so guidance never appears afterwards.
    fn on_app_installed(&mut self) -> Vec<Command> {
        match self.state {
            State::Dismissed | State::Installed | State::Suppressed => vec![],
            _ => {
                self.state = State::Installed;
                self.prompt = None;
                vec![Command::ClearTimers, Command::HideCard]
            }
        }
    }

    fn on_timer(&mut self, timer: Timer) -> Vec<Command> {
        match (timer, self.state) {
            (Timer::DisplayDelay, State::DelayPending(variant)) => {
                self.state = State::GuidanceShown(variant);
                vec![Command::ShowCard(variant)]
            }
            (Timer::NativeDisplayDelay, State::NativeReady) => {
                self.state = State::GuidanceShown(Classification::NativeInstall);
                vec![Command::ShowCard(Classification::NativeInstall)]
            }
            (Timer::NativeSignalTimeout, State::WaitingForNativeSignal) => {
                if self.android {
                    // Android has no other detection path; show the
                    // manual steps immediately.
                    self.state = State::FallbackGuidance;
                    vec![Command::ShowCard(Classification::AndroidFallback)]
                } else {
                    // Desktop without the signal: expected outcome, no
                    // guidance this session.
                    self.state = State::Suppressed;
                    vec![]
                }
            }
            _ => vec![],
        }
    }

    fn on_prompt_available(&mut self, handle: Box<dyn InstallPrompt>) -> Vec<Command> {
        if self.state == State::WaitingForNativeSignal {
            self.prompt = Some(handle);
            self.state = State::NativeReady;
            vec![
                Command::CancelTimer(Timer::NativeSignalTimeout),
                Command::StartTimer(Timer::NativeDisplayDelay),
            ]
        } else {
            vec![]
        }
    }

    fn on_install_clicked(&mut self) -> Vec<Command> {
        let native_shown = self.state == State::GuidanceShown(Classification::NativeInstall);
        if native_shown && self.prompt.is_some() {
            self.state = State::PromptRunning;
            vec![Command::RunInstallPrompt]
        } else {
            vec![]
        }
    }

    fn on_install_choice(&mut self, choice: InstallChoice) -> Vec<Command> {
        if self.state != State::PromptRunning {
            return vec![];
        }
        self.prompt = None;
        match choice {
            InstallChoice::Accepted => {
                self.state = State::Installed;
                vec![Command::HideCard]
            }
            // Rejection hides the card but does not start the
            // dismissal cooldown; only the explicit dismiss control
            // persists a timestamp.
            InstallChoice::Dismissed => {
                self.state = State::Dismissed;
                vec![Command::HideCard]
            }
        }
    }

    fn on_dismiss(&mut self, now_ms: i64) -> Vec<Command> {
        match self.state {
            State::GuidanceShown(_) | State::FallbackGuidance => {
                self.state = State::Dismissed;
                self.prompt = None;
                vec![Command::HideCard, Command::PersistDismissal(now_ms)]
            }
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::environment::Environment;

    const HOUR_MS: i64 = 60 * 60 * 1000;

    struct NoopPrompt;

    impl InstallPrompt for NoopPrompt {
        fn prompt(self: Box<Self>) -> Pin<Box<dyn Future<Output = InstallChoice> + Send>> {
            Box::pin(std::future::ready(InstallChoice::Accepted))
        }
    }

    fn ios_safari_env() -> Environment {
        Environment::with_user_agent(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) \
             AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1",
        )
    }

    fn android_env() -> Environment {
        Environment::with_user_agent(
            "Mozilla/5.0 (Linux; Android 14; Pixel 8) \
             AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.6422.113 Mobile Safari/537.36",
        )
    }

    fn desktop_env() -> Environment {
        Environment::with_user_agent(
            "Mozilla/5.0 (X11; Linux x86_64) \
             AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
        )
    }

    #[test]
    fn standalone_mounts_suppressed_with_no_commands() {
        let env = Environment {
            display_mode_standalone: true,
            ..ios_safari_env()
        };
        let mut advisor = Advisor::new(&env);
        let commands = advisor.mount(0, None);
        assert_eq!(advisor.state(), State::Suppressed);
        assert!(commands.is_empty());
    }

    #[test]
    fn recent_dismissal_suppresses_regardless_of_platform() {
        let now = 100 * HOUR_MS;
        for env in [ios_safari_env(), android_env(), desktop_env()] {
            let mut advisor = Advisor::new(&env);
            let commands = advisor.mount(now, Some(now - HOUR_MS));
            assert_eq!(advisor.state(), State::Suppressed);
            assert!(commands.is_empty());
        }
    }

    #[test]
    fn expired_dismissal_does_not_suppress() {
        let now = 100 * HOUR_MS;
        let mut advisor = Advisor::new(&ios_safari_env());
        let commands = advisor.mount(now, Some(now - 25 * HOUR_MS));
        assert_eq!(
            advisor.state(),
            State::DelayPending(Classification::IosSafari)
        );
        assert!(commands.contains(&Command::StartTimer(Timer::DisplayDelay)));
    }

    #[test]
    fn ios_safari_shows_card_after_display_delay() {
        let mut advisor = Advisor::new(&ios_safari_env());
        advisor.mount(0, None);

        let commands = advisor.handle(Event::TimerFired(Timer::DisplayDelay));
        assert_eq!(advisor.state(), State::GuidanceShown(Classification::IosSafari));
        assert_eq!(commands, vec![Command::ShowCard(Classification::IosSafari)]);
    }

    #[test]
    fn native_candidate_waits_for_readiness_signal() {
        let mut advisor = Advisor::new(&desktop_env());
        let commands = advisor.mount(0, None);
        assert_eq!(advisor.state(), State::WaitingForNativeSignal);
        assert_eq!(
            commands,
            vec![
                Command::WatchPlatformSignals,
                Command::StartTimer(Timer::NativeSignalTimeout),
            ]
        );
    }

    #[test]
    fn readiness_signal_swaps_timeout_for_short_delay() {
        let mut advisor = Advisor::new(&desktop_env());
        advisor.mount(0, None);

        let commands = advisor.handle(Event::PromptAvailable(Box::new(NoopPrompt)));
        assert_eq!(advisor.state(), State::NativeReady);
        assert_eq!(
            commands,
            vec![
                Command::CancelTimer(Timer::NativeSignalTimeout),
                Command::StartTimer(Timer::NativeDisplayDelay),
            ]
        );

        let commands = advisor.handle(Event::TimerFired(Timer::NativeDisplayDelay));
        assert_eq!(
            advisor.state(),
            State::GuidanceShown(Classification::NativeInstall)
        );
        assert_eq!(
            commands,
            vec![Command::ShowCard(Classification::NativeInstall)]
        );
    }

    #[test]
    fn android_timeout_shows_fallback_immediately() {
        let mut advisor = Advisor::new(&android_env());
        advisor.mount(0, None);

        let commands = advisor.handle(Event::TimerFired(Timer::NativeSignalTimeout));
        assert_eq!(advisor.state(), State::FallbackGuidance);
        assert_eq!(
            commands,
            vec![Command::ShowCard(Classification::AndroidFallback)]
        );
    }

    #[test]
    fn desktop_timeout_stays_silent() {
        let mut advisor = Advisor::new(&desktop_env());
        advisor.mount(0, None);

        let commands = advisor.handle(Event::TimerFired(Timer::NativeSignalTimeout));
        assert_eq!(advisor.state(), State::Suppressed);
        assert!(commands.is_empty());
    }

    #[test]
    fn app_installed_preempts_pending_display_delay() {
        let mut advisor = Advisor::new(&ios_safari_env());
        advisor.mount(0, None);

        let commands = advisor.handle(Event::AppInstalled);
        assert_eq!(advisor.state(), State::Installed);
        assert_eq!(commands, vec![Command::ClearTimers, Command::HideCard]);

        // The delay timer firing late must not resurface the card.
        let commands = advisor.handle(Event::TimerFired(Timer::DisplayDelay));
        assert!(commands.is_empty());
        assert_eq!(advisor.state(), State::Installed);
    }

    #[test]
    fn app_installed_works_after_guidance_shown() {
        let mut advisor = Advisor::new(&ios_safari_env());
        advisor.mount(0, None);
        advisor.handle(Event::TimerFired(Timer::DisplayDelay));

        let commands = advisor.handle(Event::AppInstalled);
        assert_eq!(advisor.state(), State::Installed);
        assert!(commands.contains(&Command::HideCard));
    }

    #[test]
    fn dismiss_persists_timestamp_and_terminates() {
        let mut advisor = Advisor::new(&ios_safari_env());
        advisor.mount(0, None);
        advisor.handle(Event::TimerFired(Timer::DisplayDelay));

        let commands = advisor.handle(Event::DismissClicked { now_ms: 42_000 });
        assert_eq!(advisor.state(), State::Dismissed);
        assert_eq!(
            commands,
            vec![Command::HideCard, Command::PersistDismissal(42_000)]
        );
    }

    #[test]
    fn dismiss_from_fallback_guidance_persists() {
        let mut advisor = Advisor::new(&android_env());
        advisor.mount(0, None);
        advisor.handle(Event::TimerFired(Timer::NativeSignalTimeout));

        let commands = advisor.handle(Event::DismissClicked { now_ms: 7 });
        assert_eq!(advisor.state(), State::Dismissed);
        assert!(commands.contains(&Command::PersistDismissal(7)));
    }

    #[test]
    fn install_click_requires_native_card_and_handle() {
        // Non-native guidance: install click is a no-op.
        let mut advisor = Advisor::new(&ios_safari_env());
        advisor.mount(0, None);
        advisor.handle(Event::TimerFired(Timer::DisplayDelay));
        assert!(advisor.handle(Event::InstallClicked).is_empty());

        // Native guidance with a captured handle: prompt runs.
        let mut advisor = Advisor::new(&desktop_env());
        advisor.mount(0, None);
        advisor.handle(Event::PromptAvailable(Box::new(NoopPrompt)));
        advisor.handle(Event::TimerFired(Timer::NativeDisplayDelay));
        let commands = advisor.handle(Event::InstallClicked);
        assert_eq!(commands, vec![Command::RunInstallPrompt]);
        assert_eq!(advisor.state(), State::PromptRunning);
        assert!(advisor.take_prompt().is_some());
    }

    #[test]
    fn accepted_choice_installs_and_hides() {
        let mut advisor = Advisor::new(&desktop_env());
        advisor.mount(0, None);
        advisor.handle(Event::PromptAvailable(Box::new(NoopPrompt)));
        advisor.handle(Event::TimerFired(Timer::NativeDisplayDelay));
        advisor.handle(Event::InstallClicked);

        let commands = advisor.handle(Event::InstallChoiceMade(InstallChoice::Accepted));
        assert_eq!(advisor.state(), State::Installed);
        assert_eq!(commands, vec![Command::HideCard]);
    }

    #[test]
    fn rejected_choice_hides_without_persisting() {
        let mut advisor = Advisor::new(&desktop_env());
        advisor.mount(0, None);
        advisor.handle(Event::PromptAvailable(Box::new(NoopPrompt)));
        advisor.handle(Event::TimerFired(Timer::NativeDisplayDelay));
        advisor.handle(Event::InstallClicked);

        let commands = advisor.handle(Event::InstallChoiceMade(InstallChoice::Dismissed));
        assert_eq!(advisor.state(), State::Dismissed);
        assert_eq!(commands, vec![Command::HideCard]);
        assert!(!commands
            .iter()
            .any(|c| matches!(c, Command::PersistDismissal(_))));
    }

    #[test]
    fn late_readiness_signal_is_ignored_after_timeout() {
        let mut advisor = Advisor::new(&desktop_env());
        advisor.mount(0, None);
        advisor.handle(Event::TimerFired(Timer::NativeSignalTimeout));

        let commands = advisor.handle(Event::PromptAvailable(Box::new(NoopPrompt)));
        assert!(commands.is_empty());
        assert_eq!(advisor.state(), State::Suppressed);
    }

    #[test]
    fn stale_timer_events_are_ignored_in_terminal_states() {
        let mut advisor = Advisor::new(&ios_safari_env());
        advisor.mount(0, None);
        advisor.handle(Event::TimerFired(Timer::DisplayDelay));
        advisor.handle(Event::DismissClicked { now_ms: 0 });

        for timer in [Timer::DisplayDelay, Timer::NativeDisplayDelay, Timer::NativeSignalTimeout] {
            assert!(advisor.handle(Event::TimerFired(timer)).is_empty());
        }
        assert_eq!(advisor.state(), State::Dismissed);
    }
}
