// SPDX-License-Identifier: MPL-2.0
//! Internationalization (i18n) support for the game shell.
//!
//! This module provides the bilingual localization store using the Fluent
//! localization system. Translation files are embedded at compile time,
//! the active language is persisted across sessions through the storage
//! adapter, and lookups return a tagged result so a missing translation
//! stays observable instead of silently falling back.

pub mod store;

pub use store::{Language, LanguageStore, Resolved, Source, TextKey};
