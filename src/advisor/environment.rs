// SPDX-License-Identifier: MPL-2.0
//! Browser environment snapshot and platform classification.
//!
//! Classification is an ordered rule table evaluated first-match-wins,
//! so the precedence between standalone detection, in-app browsers, and
//! OS-specific checks is data rather than nested branching. In-app
//! detection outranks OS detection because in-app webviews run on any
//! OS and always block installation.

/// User-agent substrings identifying in-app browsers (messaging and
/// social apps embedding a restricted webview).
const IN_APP_SIGNATURES: &[&str] = &[
    "fban",
    "fbav",
    "fb_iab",
    "instagram",
    "line/",
    "micromessenger",
    "snapchat",
    "tiktok",
    "twitter",
    "; wv)",
];

/// Tokens that identify non-Safari browsers on iOS. They all share the
/// WebKit engine, so Safari itself is recognized by the absence of
/// these.
const IOS_NON_SAFARI_TOKENS: &[&str] =
    &["crios", "fxios", "edgios", "opios", "gsa", "duckduckgo", "chrome/"];

/// One-shot snapshot of the signals the host page reads at mount.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// The raw user-agent string.
    pub user_agent: String,
    /// `(display-mode: standalone)` media query result.
    pub display_mode_standalone: bool,
    /// iOS Safari's alternate standalone flag (`navigator.standalone`).
    pub navigator_standalone: bool,
    /// `navigator.platform` hint.
    pub platform: String,
    /// `navigator.maxTouchPoints`; disambiguates iPadOS reporting a
    /// desktop Mac platform string.
    pub max_touch_points: u8,
}

impl Environment {
    /// Snapshot for a plain browser tab with the given user agent.
    #[must_use]
    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..Self::default()
        }
    }

    /// The page already runs as an installed app.
    #[must_use]
    pub fn is_standalone(&self) -> bool {
        self.display_mode_standalone || self.navigator_standalone
    }

    /// The page is inside a messaging/social app's embedded webview.
    #[must_use]
    pub fn is_in_app_browser(&self) -> bool {
        let ua = self.user_agent.to_lowercase();
        IN_APP_SIGNATURES.iter().any(|sig| ua.contains(sig))
    }

    /// The device runs iOS or iPadOS. iPads on recent iPadOS report a
    /// Mac platform string, hence the touch-point check.
    #[must_use]
    pub fn is_ios(&self) -> bool {
        let ua = self.user_agent.to_lowercase();
        ua.contains("iphone")
            || ua.contains("ipad")
            || ua.contains("ipod")
            || (self.platform == "MacIntel" && self.max_touch_points > 1)
    }

    /// The browser identity is first-party Safari (as opposed to other
    /// WebKit-based browsers carrying their own tokens).
    #[must_use]
    pub fn is_safari(&self) -> bool {
        let ua = self.user_agent.to_lowercase();
        ua.contains("safari")
            && !ua.contains("android")
            && !IOS_NON_SAFARI_TOKENS.iter().any(|tok| ua.contains(tok))
    }

    /// The device runs Android.
    #[must_use]
    pub fn is_android(&self) -> bool {
        self.user_agent.to_lowercase().contains("android")
    }
}

/// Which installation guidance variant applies this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Already installed; show nothing.
    None,
    /// Native install flow is plausible, pending the readiness signal.
    NativeInstall,
    /// iOS running first-party Safari.
    IosSafari,
    /// iOS running a non-Safari browser.
    IosOtherBrowser,
    /// Restricted in-app webview.
    InAppBrowser,
    /// Android without a readiness signal; produced only by the state
    /// machine's timeout path, never by [`classify`].
    AndroidFallback,
}

type Predicate = fn(&Environment) -> bool;

fn ios_safari(env: &Environment) -> bool {
    env.is_ios() && env.is_safari()
}

fn ios_other_browser(env: &Environment) -> bool {
    env.is_ios() && !env.is_safari()
}

/// Ordered classification rules; the first matching predicate wins.
const RULES: &[(Predicate, Classification)] = &[
    (Environment::is_standalone, Classification::None),
    (Environment::is_in_app_browser, Classification::InAppBrowser),
    (ios_safari, Classification::IosSafari),
    (ios_other_browser, Classification::IosOtherBrowser),
];

/// Classifies the environment. Runs exactly once per session; the
/// result is never persisted.
#[must_use]
pub fn classify(env: &Environment) -> Classification {
    for (predicate, classification) in RULES {
        if predicate(env) {
            return *classification;
        }
    }
    Classification::NativeInstall
}
