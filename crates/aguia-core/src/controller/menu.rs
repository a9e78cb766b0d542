//! Floating menu model: one toggle button and one panel of entries.

use super::transition::Transition;
use crate::models::ColorblindMode;

/// One panel entry and the transition it triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub icon: &'static str,
    pub label: &'static str,
    pub transition: Transition,
}

const fn entry(icon: &'static str, label: &'static str, transition: Transition) -> MenuEntry {
    MenuEntry {
        icon,
        label,
        transition,
    }
}

/// Panel entries, in display order
pub const ENTRIES: [MenuEntry; 10] = [
    entry("🔍+", "Increase font", Transition::IncreaseFont),
    entry("🔍-", "Decrease font", Transition::DecreaseFont),
    entry("🔄", "Reset font", Transition::ResetFont),
    entry("🌓", "High contrast", Transition::HighContrast),
    entry("🔄", "Inverted colors", Transition::InvertedContrast),
    entry("🌈", "Reset contrast", Transition::ResetContrast),
    entry("📝", "Readable fonts", Transition::ToggleReadableFonts),
    entry("↕️", "Line spacing", Transition::CycleLineSpacing),
    entry("🔊", "Text to speech", Transition::ToggleSpeech),
    entry("👁️", "Reading helper", Transition::ToggleReadingHelper),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTarget {
    Button,
    Entry(usize),
}

/// Everything the page can report to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    ButtonClicked,
    EntryClicked(usize),
    ColorblindSelected(ColorblindMode),
    PointerEntered(HoverTarget),
    PointerLeft(HoverTarget),
    PointerMoved { x: f64, y: f64 },
    /// A click on page content outside the menu, with the element's text
    ContentClicked { text: String },
}

/// What the controller has to do after the menu saw an event
#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    Nothing,
    Run(Transition),
    TrackPointer { x: f64, y: f64 },
    Speak(String),
}

/// Open/closed and hover state of the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Menu {
    open: bool,
    hovered: Option<HoverTarget>,
}

impl Menu {
    pub const fn is_open(&self) -> bool {
        self.open
    }

    pub const fn hovered(&self) -> Option<HoverTarget> {
        self.hovered
    }

    /// Route an event. This is the only place UI events are interpreted.
    pub fn handle(&mut self, event: UiEvent) -> MenuAction {
        match event {
            UiEvent::ButtonClicked => {
                self.open = !self.open;
                MenuAction::Nothing
            }
            UiEvent::EntryClicked(index) => ENTRIES.get(index).map_or_else(
                || {
                    tracing::debug!(index, "Ignoring click on unknown menu entry");
                    MenuAction::Nothing
                },
                |entry| MenuAction::Run(entry.transition),
            ),
            UiEvent::ColorblindSelected(mode) => MenuAction::Run(Transition::SetColorblind(mode)),
            UiEvent::PointerEntered(target) => {
                self.hovered = Some(target);
                MenuAction::Nothing
            }
            UiEvent::PointerLeft(target) => {
                if self.hovered == Some(target) {
                    self.hovered = None;
                }
                MenuAction::Nothing
            }
            UiEvent::PointerMoved { x, y } => MenuAction::TrackPointer { x, y },
            UiEvent::ContentClicked { text } => MenuAction::Speak(text),
        }
    }
}
