//! Pure preference transitions.
//!
//! [`step`] never touches the page. It returns the next state together with
//! the list of [`Effect`]s that make the page match it, and whether the new
//! state has to be saved.

use super::state::{next_line_spacing, PreferenceState, FONT_FLOOR, FONT_STEP};
use crate::models::{ColorblindMode, ContrastMode, DEFAULT_FONT_SIZE};

pub const READABLE_FONTS_CLASS: &str = "readable-fonts";
pub const SPEECH_CLASS: &str = "text-to-speech";
pub const READING_HELPER_CLASS: &str = "text-helper";

/// Shown when speech is requested on a surface without speech synthesis
pub const SPEECH_UNSUPPORTED: &str = "Your browser does not support text-to-speech.";

/// A user-initiated change of preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    IncreaseFont,
    DecreaseFont,
    ResetFont,
    HighContrast,
    InvertedContrast,
    ResetContrast,
    ToggleReadableFonts,
    CycleLineSpacing,
    ToggleSpeech,
    ToggleReadingHelper,
    SetColorblind(ColorblindMode),
}

/// A change to apply to the document surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Font size in percent of the base size
    SetFontSize(u32),
    /// Line spacing in percent of the base line height
    SetLineSpacing(u32),
    AddClass(&'static str),
    RemoveClass(&'static str),
    CancelSpeech,
    /// Read the given text aloud
    Speak(String),
    AttachPointerTracking,
    DetachPointerTracking,
    HideOverlay,
    ShowNotice(String),
}

/// Outcome of a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub state: PreferenceState,
    pub effects: Vec<Effect>,
    pub persist: bool,
}

impl Step {
    const fn unchanged(state: PreferenceState) -> Self {
        Self {
            state,
            effects: Vec::new(),
            persist: false,
        }
    }

    const fn saved(state: PreferenceState, effects: Vec<Effect>) -> Self {
        Self {
            state,
            effects,
            persist: true,
        }
    }

    fn with_effects(mut self, effects: Vec<Effect>) -> Self {
        self.effects = effects;
        self
    }
}

fn contrast_effects(mode: ContrastMode) -> Vec<Effect> {
    let mut effects: Vec<Effect> = [ContrastMode::High, ContrastMode::Inverted]
        .into_iter()
        .filter_map(ContrastMode::css_class)
        .map(Effect::RemoveClass)
        .collect();
    if let Some(class) = mode.css_class() {
        effects.push(Effect::AddClass(class));
    }
    effects
}

fn colorblind_effects(mode: ColorblindMode) -> Vec<Effect> {
    let mut effects: Vec<Effect> = ColorblindMode::ACTIVE
        .into_iter()
        .filter_map(ColorblindMode::css_class)
        .map(Effect::RemoveClass)
        .collect();
    if let Some(class) = mode.css_class() {
        effects.push(Effect::AddClass(class));
    }
    effects
}

const fn class_effect(enabled: bool, class: &'static str) -> Effect {
    if enabled {
        Effect::AddClass(class)
    } else {
        Effect::RemoveClass(class)
    }
}

fn speech_on(state: &mut PreferenceState, speech_supported: bool) -> Vec<Effect> {
    if speech_supported {
        state.speech = true;
        vec![Effect::AddClass(SPEECH_CLASS)]
    } else {
        state.speech = false;
        vec![Effect::ShowNotice(SPEECH_UNSUPPORTED.to_string())]
    }
}

/// Effects of a click on a text element: while speech is on, stop the current
/// utterance and read the element's trimmed text. Nothing is persisted.
pub fn speak_effects(state: &PreferenceState, text: &str) -> Vec<Effect> {
    let text = text.trim();
    if !state.speech || text.is_empty() {
        return Vec::new();
    }
    vec![Effect::CancelSpeech, Effect::Speak(text.to_string())]
}

fn reading_helper_effects(enabled: bool) -> Vec<Effect> {
    if enabled {
        vec![
            Effect::AddClass(READING_HELPER_CLASS),
            Effect::AttachPointerTracking,
        ]
    } else {
        vec![
            Effect::RemoveClass(READING_HELPER_CLASS),
            Effect::DetachPointerTracking,
            Effect::HideOverlay,
        ]
    }
}

/// Compute the result of `transition` applied to `current`.
pub fn step(current: &PreferenceState, transition: Transition, speech_supported: bool) -> Step {
    let mut state = *current;

    let effects = match transition {
        Transition::IncreaseFont => {
            state.font_size = state.font_size.saturating_add(FONT_STEP);
            vec![Effect::SetFontSize(state.font_size)]
        }
        Transition::DecreaseFont => {
            if state.font_size <= FONT_FLOOR {
                return Step::unchanged(state);
            }
            state.font_size -= FONT_STEP;
            vec![Effect::SetFontSize(state.font_size)]
        }
        Transition::ResetFont => {
            state.font_size = DEFAULT_FONT_SIZE;
            vec![Effect::SetFontSize(state.font_size)]
        }
        Transition::HighContrast => {
            state.contrast = ContrastMode::High;
            contrast_effects(state.contrast)
        }
        Transition::InvertedContrast => {
            state.contrast = ContrastMode::Inverted;
            contrast_effects(state.contrast)
        }
        Transition::ResetContrast => {
            state.contrast = ContrastMode::Normal;
            contrast_effects(state.contrast)
        }
        Transition::ToggleReadableFonts => {
            state.readable_fonts = !state.readable_fonts;
            vec![class_effect(state.readable_fonts, READABLE_FONTS_CLASS)]
        }
        Transition::CycleLineSpacing => {
            state.line_spacing = next_line_spacing(state.line_spacing);
            vec![Effect::SetLineSpacing(state.line_spacing)]
        }
        Transition::ToggleSpeech => {
            if state.speech {
                state.speech = false;
                vec![Effect::RemoveClass(SPEECH_CLASS), Effect::CancelSpeech]
            } else {
                speech_on(&mut state, speech_supported)
            }
        }
        Transition::ToggleReadingHelper => {
            state.reading_helper = !state.reading_helper;
            reading_helper_effects(state.reading_helper)
        }
        Transition::SetColorblind(mode) => {
            state.colorblind = mode;
            colorblind_effects(mode)
        }
    };

    Step::saved(state, effects)
}

/// Effects that bring a fresh page in line with loaded preferences.
///
/// Nothing is persisted; speech is dropped from the state when the surface
/// cannot synthesize it.
pub fn initial(loaded: &PreferenceState, speech_supported: bool) -> Step {
    let mut state = *loaded;
    let mut effects = vec![Effect::SetFontSize(state.font_size)];
    effects.extend(contrast_effects(state.contrast));
    if state.readable_fonts {
        effects.push(Effect::AddClass(READABLE_FONTS_CLASS));
    }
    effects.push(Effect::SetLineSpacing(state.line_spacing));
    if state.speech {
        effects.extend(speech_on(&mut state, speech_supported));
    }
    if state.reading_helper {
        effects.extend(reading_helper_effects(true));
    }
    effects.extend(colorblind_effects(state.colorblind));

    Step::unchanged(state).with_effects(effects)
}
