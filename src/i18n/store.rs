// SPDX-License-Identifier: MPL-2.0
use crate::storage::{Storage, LANGUAGE_KEY};
use fluent_bundle::{FluentBundle, FluentResource};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use unic_langid::LanguageIdentifier;

#[derive(RustEmbed)]
#[folder = "assets/i18n/"]
struct Asset;

/// UI language. The set is closed so an invalid language is rejected by
/// the type system rather than at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Zh];

    /// BCP-47 identifier of the backing fluent bundle.
    #[must_use]
    pub fn locale(self) -> &'static str {
        match self {
            Language::En => "en-US",
            Language::Zh => "zh-CN",
        }
    }

    fn ftl_file(self) -> &'static str {
        match self {
            Language::En => "en-US.ftl",
            Language::Zh => "zh-CN.ftl",
        }
    }

    fn langid(self) -> LanguageIdentifier {
        self.locale().parse().expect("locale literal is valid BCP-47")
    }
}

/// The fixed dictionary key set: HUD strings plus every install-guidance
/// string. Adding a key here without adding it to both `.ftl` files
/// fails the completeness test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKey {
    GameTitle,
    HudScore,
    HudBestScore,
    MenuPlay,
    MenuPause,
    GameOverTitle,
    GameOverRestart,
    InstallTitle,
    InstallNativeHint,
    InstallButton,
    InstallDismiss,
    IosStepShare,
    IosStepAdd,
    IosStepConfirm,
    IosOtherStepOpen,
    IosOtherStepShare,
    IosOtherStepAdd,
    InAppStepMenu,
    InAppStepBrowser,
    AndroidStepMenu,
    AndroidStepAdd,
}

impl TextKey {
    pub const ALL: [TextKey; 21] = [
        TextKey::GameTitle,
        TextKey::HudScore,
        TextKey::HudBestScore,
        TextKey::MenuPlay,
        TextKey::MenuPause,
        TextKey::GameOverTitle,
        TextKey::GameOverRestart,
        TextKey::InstallTitle,
        TextKey::InstallNativeHint,
        TextKey::InstallButton,
        TextKey::InstallDismiss,
        TextKey::IosStepShare,
        TextKey::IosStepAdd,
        TextKey::IosStepConfirm,
        TextKey::IosOtherStepOpen,
        TextKey::IosOtherStepShare,
        TextKey::IosOtherStepAdd,
        TextKey::InAppStepMenu,
        TextKey::InAppStepBrowser,
        TextKey::AndroidStepMenu,
        TextKey::AndroidStepAdd,
    ];

    /// Fluent message id for this key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TextKey::GameTitle => "game-title",
            TextKey::HudScore => "hud-score",
            TextKey::HudBestScore => "hud-best-score",
            TextKey::MenuPlay => "menu-play",
            TextKey::MenuPause => "menu-pause",
            TextKey::GameOverTitle => "game-over-title",
            TextKey::GameOverRestart => "game-over-restart",
            TextKey::InstallTitle => "install-title",
            TextKey::InstallNativeHint => "install-native-hint",
            TextKey::InstallButton => "install-button",
            TextKey::InstallDismiss => "install-dismiss",
            TextKey::IosStepShare => "install-ios-step-share",
            TextKey::IosStepAdd => "install-ios-step-add",
            TextKey::IosStepConfirm => "install-ios-step-confirm",
            TextKey::IosOtherStepOpen => "install-ios-other-step-open",
            TextKey::IosOtherStepShare => "install-ios-other-step-share",
            TextKey::IosOtherStepAdd => "install-ios-other-step-add",
            TextKey::InAppStepMenu => "install-in-app-step-menu",
            TextKey::InAppStepBrowser => "install-in-app-step-browser",
            TextKey::AndroidStepMenu => "install-android-step-menu",
            TextKey::AndroidStepAdd => "install-android-step-add",
        }
    }
}

/// Where a resolved text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Found in the active language's dictionary.
    Active,
    /// Missing from the active language, found in the default language.
    DefaultFallback,
    /// Missing everywhere; the text is the raw message id.
    KeyPlaceholder,
}

/// Tagged lookup result. The UI decides whether a placeholder is
/// acceptable to show; tests assert that it never occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub text: String,
    pub source: Source,
}

/// Process-wide language state with a persistence adapter.
///
/// The store loads its language from storage once at construction and
/// writes the whole persisted state back on every mutation.
pub struct LanguageStore {
    bundles: HashMap<Language, FluentBundle<FluentResource>>,
    active: Language,
    storage: Box<dyn Storage + Send>,
}

/// Whole-object serialization of the store's persisted state.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedLanguage {
    language: Language,
}

impl LanguageStore {
    /// Builds the fluent bundles from the embedded assets and restores
    /// the persisted language. A missing or unreadable record falls back
    /// to the default language.
    #[must_use]
    pub fn load(storage: Box<dyn Storage + Send>) -> Self {
        let mut bundles = HashMap::new();
        for language in Language::ALL {
            let content = Asset::get(language.ftl_file())
                .expect("translation file is embedded at compile time");
            let res = FluentResource::try_new(
                String::from_utf8_lossy(content.data.as_ref()).to_string(),
            )
            .expect("embedded FTL file parses");
            let mut bundle = FluentBundle::new(vec![language.langid()]);
            bundle.add_resource(res).expect("embedded FTL has no duplicate ids");
            bundles.insert(language, bundle);
        }

        let active = match storage.get(LANGUAGE_KEY) {
            Some(raw) => match toml::from_str::<PersistedLanguage>(&raw) {
                Ok(persisted) => persisted.language,
                Err(err) => {
                    log::warn!("ignoring unreadable language record: {}", err);
                    Language::default()
                }
            },
            None => Language::default(),
        };

        Self {
            bundles,
            active,
            storage,
        }
    }

    /// The active language.
    #[must_use]
    pub fn language(&self) -> Language {
        self.active
    }

    /// Replaces the active language and persists the new store state.
    ///
    /// A storage failure is logged and absorbed; the in-memory switch
    /// still takes effect for this session.
    pub fn set_language(&mut self, language: Language) {
        self.active = language;
        let persisted = PersistedLanguage { language };
        match toml::to_string(&persisted) {
            Ok(serialized) => {
                if let Err(err) = self.storage.set(LANGUAGE_KEY, &serialized) {
                    log::warn!("failed to persist language: {}", err);
                }
            }
            Err(err) => log::warn!("failed to serialize language record: {}", err),
        }
    }

    /// Resolves a key against the active language with a tagged result.
    ///
    /// Fallback chain: active language, then default language, then the
    /// raw message id. The completeness test keeps the fallback arms
    /// dead in practice.
    #[must_use]
    pub fn resolve(&self, key: TextKey) -> Resolved {
        if let Some(text) = self.format_in(self.active, key) {
            return Resolved {
                text,
                source: Source::Active,
            };
        }
        if self.active != Language::default() {
            if let Some(text) = self.format_in(Language::default(), key) {
                return Resolved {
                    text,
                    source: Source::DefaultFallback,
                };
            }
        }
        Resolved {
            text: key.as_str().to_string(),
            source: Source::KeyPlaceholder,
        }
    }

    /// Convenience lookup that discards the source tag.
    #[must_use]
    pub fn text(&self, key: TextKey) -> String {
        self.resolve(key).text
    }

    fn format_in(&self, language: Language, key: TextKey) -> Option<String> {
        let bundle = self.bundles.get(&language)?;
        let msg = bundle.get_message(key.as_str())?;
        let pattern = msg.value()?;
        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, None, &mut errors);
        if errors.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    }
}
