// SPDX-License-Identifier: MPL-2.0
//! View models for the guidance card.
//!
//! The card is plain data: a title, up to three numbered steps, and the
//! two controls. Texts are [`TextKey`]s so the rendering layer resolves
//! them through the language store at draw time.

use super::environment::Classification;
use crate::i18n::TextKey;

/// Icon shown next to a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepIcon {
    Share,
    AddToHome,
    Menu,
    Browser,
}

/// One numbered instruction on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub number: u8,
    pub text: TextKey,
    pub icon: Option<StepIcon>,
}

/// The rendered guidance surface for one classification variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuidanceCard {
    pub variant: Classification,
    pub title: TextKey,
    /// Optional lead-in line (native variant only).
    pub hint: Option<TextKey>,
    pub steps: Vec<Step>,
    /// Whether the card carries the native install button.
    pub install_button: bool,
    pub dismiss_label: TextKey,
}

impl GuidanceCard {
    /// Builds the card for a classification, or `None` when no guidance
    /// applies.
    #[must_use]
    pub fn for_variant(variant: Classification) -> Option<Self> {
        let card = match variant {
            Classification::None => return None,
            Classification::NativeInstall => Self {
                variant,
                title: TextKey::InstallTitle,
                hint: Some(TextKey::InstallNativeHint),
                steps: vec![],
                install_button: true,
                dismiss_label: TextKey::InstallDismiss,
            },
            Classification::IosSafari => Self::with_steps(
                variant,
                &[
                    (TextKey::IosStepShare, Some(StepIcon::Share)),
                    (TextKey::IosStepAdd, Some(StepIcon::AddToHome)),
                    (TextKey::IosStepConfirm, None),
                ],
            ),
            Classification::IosOtherBrowser => Self::with_steps(
                variant,
                &[
                    (TextKey::IosOtherStepOpen, Some(StepIcon::Browser)),
                    (TextKey::IosOtherStepShare, Some(StepIcon::Share)),
                    (TextKey::IosOtherStepAdd, Some(StepIcon::AddToHome)),
                ],
            ),
            Classification::InAppBrowser => Self::with_steps(
                variant,
                &[
                    (TextKey::InAppStepMenu, Some(StepIcon::Menu)),
                    (TextKey::InAppStepBrowser, Some(StepIcon::Browser)),
                ],
            ),
            Classification::AndroidFallback => Self::with_steps(
                variant,
                &[
                    (TextKey::AndroidStepMenu, Some(StepIcon::Menu)),
                    (TextKey::AndroidStepAdd, Some(StepIcon::AddToHome)),
                ],
            ),
        };
        Some(card)
    }

    fn with_steps(variant: Classification, steps: &[(TextKey, Option<StepIcon>)]) -> Self {
        let steps = steps
            .iter()
            .enumerate()
            .map(|(index, &(text, icon))| Step {
                number: index as u8 + 1,
                text,
                icon,
            })
            .collect();
        Self {
            variant,
            title: TextKey::InstallTitle,
            hint: None,
            steps,
            install_button: false,
            dismiss_label: TextKey::InstallDismiss,
        }
    }
}
