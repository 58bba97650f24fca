// SPDX-License-Identifier: MPL-2.0
//! Install guidance for running the game as an installed web app.
//!
//! The advisor runs once per session: it classifies the browser
//! environment, waits out the display delay or the platform's native
//! readiness signal, and presents one of six mutually exclusive guidance
//! variants (or none). Dismissals are persisted with a 24 hour cooldown.
//!
//! The core is a pure state machine ([`machine::Advisor`]) fed by
//! events; timers, channels, and storage writes live in the tokio-based
//! [`driver::Session`] so every transition is testable without real
//! timers or browser APIs.

pub mod card;
pub mod driver;
pub mod environment;
pub mod machine;

pub use card::{GuidanceCard, Step, StepIcon};
pub use driver::{PlatformSignal, Session, UserAction};
pub use environment::{classify, Classification, Environment};
pub use machine::{Advisor, Command, Event, InstallChoice, InstallPrompt, State, Timer};
