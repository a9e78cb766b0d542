//! The page the controller renders onto.
//!
//! A browser binding implements [`DocumentSurface`] over the real DOM; tests
//! implement it with a recorder.

use std::time::Duration;

use super::transition::Effect;

/// Height of the reading-helper band, in pixels
pub const OVERLAY_HEIGHT: f64 = 30.0;
/// How long a status notice stays visible
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

/// Viewport-relative bounding box of an element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Document-relative placement of the reading-helper band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

pub trait DocumentSurface {
    /// Set a custom property on the root element (`--font-size-multiplier`, ...).
    fn set_root_property(&mut self, name: &str, value: &str);

    /// Set an inline style property on the body.
    fn set_body_style(&mut self, name: &str, value: &str);

    fn add_body_class(&mut self, class: &str);

    fn remove_body_class(&mut self, class: &str);

    /// Whether speech synthesis is available.
    fn supports_speech(&self) -> bool;

    fn cancel_speech(&mut self);

    /// Queue `text` for speech synthesis.
    fn speak(&mut self, text: &str);

    /// Start or stop delivering pointer moves to the controller.
    fn set_pointer_tracking(&mut self, enabled: bool);

    /// Bounds of the text-bearing element under the pointer, excluding the overlay itself.
    fn text_element_at(&self, x: f64, y: f64) -> Option<Rect>;

    fn scroll_y(&self) -> f64;

    /// Show the overlay at `overlay`, or hide it on `None`.
    fn place_overlay(&mut self, overlay: Option<Overlay>);

    fn show_notice(&mut self, message: &str, duration: Duration);
}

/// Apply one effect to the surface.
pub fn apply_effect<S: DocumentSurface + ?Sized>(surface: &mut S, effect: &Effect) {
    match effect {
        Effect::SetFontSize(percent) => {
            let value = format!("{percent}%");
            surface.set_root_property("--font-size-multiplier", &value);
            surface.set_body_style("font-size", &value);
        }
        Effect::SetLineSpacing(percent) => {
            surface.set_root_property("--line-height-multiplier", &format!("{percent}%"));
            let line_height = f64::from(*percent) / 100.0 * 1.5;
            surface.set_body_style("line-height", &line_height.to_string());
        }
        Effect::AddClass(class) => surface.add_body_class(class),
        Effect::RemoveClass(class) => surface.remove_body_class(class),
        Effect::CancelSpeech => surface.cancel_speech(),
        Effect::Speak(text) => surface.speak(text),
        Effect::AttachPointerTracking => surface.set_pointer_tracking(true),
        Effect::DetachPointerTracking => surface.set_pointer_tracking(false),
        Effect::HideOverlay => surface.place_overlay(None),
        Effect::ShowNotice(message) => surface.show_notice(message, NOTICE_DURATION),
    }
}

/// Where the reading-helper band goes for a pointer at (`x`, `y`).
///
/// One element lookup per call; `None` when no text element is under the pointer.
pub fn overlay_for<S: DocumentSurface + ?Sized>(surface: &S, x: f64, y: f64) -> Option<Overlay> {
    surface.text_element_at(x, y).map(|rect| Overlay {
        left: rect.left,
        top: surface.scroll_y() + rect.top,
        width: rect.width,
        height: OVERLAY_HEIGHT,
    })
}
