// SPDX-License-Identifier: MPL-2.0
//! `runner_shell` is the browser-platform shell of the Sky Dash runner
//! game: a persisted UI-language store and install guidance for playing
//! the game as an installed (standalone) web app.
//!
//! The two subsystems are independent. The language store resolves
//! symbolic text keys against embedded Fluent dictionaries and persists
//! the active language across sessions. The install advisor classifies
//! the browser environment once per session and runs an event-driven
//! state machine deciding which of six guidance variants (or none) to
//! present, honoring a 24 hour dismissal cooldown.

pub mod advisor;
pub mod clock;
pub mod error;
pub mod i18n;
pub mod storage;
