//! The client preference controller.

use super::backend::PreferenceBackend;
use super::menu::{Menu, MenuAction, UiEvent};
use super::state::PreferenceState;
use super::surface::{apply_effect, overlay_for, DocumentSurface, NOTICE_DURATION};
use super::transition::{initial, speak_effects, step, Effect, Transition};
use crate::models::SaveOutcome;

/// Owns the active preferences of one page and keeps the surface in sync with them.
pub struct PreferenceController<S, B> {
    state: PreferenceState,
    surface: S,
    backend: B,
    menu: Menu,
}

impl<S, B> PreferenceController<S, B>
where
    S: DocumentSurface,
    B: PreferenceBackend,
{
    /// Load the user's preferences and apply them to the surface.
    ///
    /// A failed load falls back to defaults.
    pub async fn start(mut surface: S, backend: B) -> Self {
        let loaded = match backend.load().await {
            Ok(prefs) => PreferenceState::from(&prefs),
            Err(error) => {
                tracing::warn!(%error, "Failed to load preferences, using defaults");
                PreferenceState::default()
            }
        };

        let setup = initial(&loaded, surface.supports_speech());
        for effect in &setup.effects {
            apply_effect(&mut surface, effect);
        }

        Self {
            state: setup.state,
            surface,
            backend,
            menu: Menu::default(),
        }
    }

    /// Run one transition: update state, apply its effects, then save.
    ///
    /// Returns the save outcome, or `None` when the transition changed nothing.
    pub async fn dispatch(&mut self, transition: Transition) -> Option<SaveOutcome> {
        let next = step(&self.state, transition, self.surface.supports_speech());
        self.state = next.state;
        self.apply(&next.effects);

        if !next.persist {
            return None;
        }
        Some(self.save().await)
    }

    /// Feed a UI event through the menu.
    pub async fn handle_event(&mut self, event: UiEvent) -> Option<SaveOutcome> {
        match self.menu.handle(event) {
            MenuAction::Nothing => None,
            MenuAction::Run(transition) => self.dispatch(transition).await,
            MenuAction::TrackPointer { x, y } => {
                self.pointer_moved(x, y);
                None
            }
            MenuAction::Speak(text) => {
                self.content_clicked(&text);
                None
            }
        }
    }

    /// Read a clicked element's text aloud while speech is enabled.
    pub fn content_clicked(&mut self, text: &str) {
        let effects = speak_effects(&self.state, text);
        self.apply(&effects);
    }

    /// Reposition the reading-helper band for a pointer at (`x`, `y`).
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if !self.state.reading_helper {
            return;
        }
        let overlay = overlay_for(&self.surface, x, y);
        self.surface.place_overlay(overlay);
    }

    pub const fn state(&self) -> &PreferenceState {
        &self.state
    }

    pub const fn surface(&self) -> &S {
        &self.surface
    }

    pub const fn menu(&self) -> &Menu {
        &self.menu
    }

    fn apply(&mut self, effects: &[Effect]) {
        for effect in effects {
            apply_effect(&mut self.surface, effect);
        }
    }

    /// A failed save keeps the applied effects; it only shows a notice.
    async fn save(&mut self) -> SaveOutcome {
        let prefs = self.state.to_client_prefs();
        let outcome = match self.backend.save(&prefs).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(%error, "Failed to save preferences");
                SaveOutcome::failed(SaveOutcome::FAILED)
            }
        };

        let notice = if outcome.success {
            SaveOutcome::SAVED
        } else {
            SaveOutcome::FAILED
        };
        self.surface.show_notice(notice, NOTICE_DURATION);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::backend::LocalBackend;
    use crate::controller::menu::ENTRIES;
    use crate::controller::surface::{Overlay, Rect};
    use crate::models::{Caller, Capability, ClientPrefs, ContrastMode, UserId};
    use crate::service::PreferenceService;
    use crate::{Error, Result};
    use pretty_assertions::assert_eq;
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSurface {
        speech: bool,
        root: BTreeMap<String, String>,
        body: BTreeMap<String, String>,
        classes: BTreeSet<String>,
        cancelled: usize,
        spoken: Vec<String>,
        tracking: bool,
        element: Option<Rect>,
        scroll: f64,
        lookups: std::cell::Cell<usize>,
        overlay: Option<Overlay>,
        notices: Vec<String>,
    }

    impl DocumentSurface for RecordingSurface {
        fn set_root_property(&mut self, name: &str, value: &str) {
            self.root.insert(name.to_string(), value.to_string());
        }

        fn set_body_style(&mut self, name: &str, value: &str) {
            self.body.insert(name.to_string(), value.to_string());
        }

        fn add_body_class(&mut self, class: &str) {
            self.classes.insert(class.to_string());
        }

        fn remove_body_class(&mut self, class: &str) {
            self.classes.remove(class);
        }

        fn supports_speech(&self) -> bool {
            self.speech
        }

        fn cancel_speech(&mut self) {
            self.cancelled += 1;
        }

        fn speak(&mut self, text: &str) {
            self.spoken.push(text.to_string());
        }

        fn set_pointer_tracking(&mut self, enabled: bool) {
            self.tracking = enabled;
        }

        fn text_element_at(&self, _x: f64, _y: f64) -> Option<Rect> {
            self.lookups.set(self.lookups.get() + 1);
            self.element
        }

        fn scroll_y(&self) -> f64 {
            self.scroll
        }

        fn place_overlay(&mut self, overlay: Option<Overlay>) {
            self.overlay = overlay;
        }

        fn show_notice(&mut self, message: &str, _duration: Duration) {
            self.notices.push(message.to_string());
        }
    }

    /// Records saves in memory; can be told to fail.
    #[derive(Default)]
    struct MemoryBackend {
        stored: ClientPrefs,
        fail_load: bool,
        fail_save: bool,
        saves: Mutex<Vec<ClientPrefs>>,
    }

    impl PreferenceBackend for MemoryBackend {
        async fn load(&self) -> Result<ClientPrefs> {
            if self.fail_load {
                return Err(Error::Database("unreachable".to_string()));
            }
            Ok(self.stored)
        }

        async fn save(&self, prefs: &ClientPrefs) -> Result<SaveOutcome> {
            self.saves.lock().unwrap().push(*prefs);
            if self.fail_save {
                return Err(Error::Database("write failed".to_string()));
            }
            Ok(SaveOutcome::saved())
        }
    }

    fn surface() -> RecordingSurface {
        RecordingSurface {
            speech: true,
            ..RecordingSurface::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn start_applies_loaded_preferences() {
        let backend = MemoryBackend {
            stored: ClientPrefs {
                fontsize: 130,
                contrast: ContrastMode::High,
                linespacing: 150,
                texthelper: true,
                ..ClientPrefs::default()
            },
            ..MemoryBackend::default()
        };
        let controller = PreferenceController::start(surface(), backend).await;

        let page = controller.surface();
        assert_eq!(page.root["--font-size-multiplier"], "130%");
        assert_eq!(page.body["font-size"], "130%");
        assert_eq!(page.root["--line-height-multiplier"], "150%");
        assert_eq!(page.body["line-height"], "2.25");
        assert!(page.classes.contains("high-contrast"));
        assert!(page.classes.contains("text-helper"));
        assert!(page.tracking);
        assert!(page.notices.is_empty());
        assert!(controller.backend.saves.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn start_falls_back_to_defaults_when_load_fails() {
        let backend = MemoryBackend {
            fail_load: true,
            ..MemoryBackend::default()
        };
        let controller = PreferenceController::start(surface(), backend).await;
        assert_eq!(*controller.state(), PreferenceState::default());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn every_transition_saves_the_full_state() {
        let mut controller = PreferenceController::start(surface(), MemoryBackend::default()).await;

        let outcome = controller.dispatch(Transition::IncreaseFont).await.unwrap();
        assert!(outcome.success);
        controller.dispatch(Transition::CycleLineSpacing).await;

        let saves = controller.backend.saves.lock().unwrap().clone();
        assert_eq!(saves.len(), 2);
        assert_eq!(saves[1].fontsize, 110);
        assert_eq!(saves[1].linespacing, 125);
        assert_eq!(
            controller.surface().notices,
            vec![SaveOutcome::SAVED, SaveOutcome::SAVED]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn decrease_at_floor_does_not_save() {
        let backend = MemoryBackend {
            stored: ClientPrefs {
                fontsize: 70,
                ..ClientPrefs::default()
            },
            ..MemoryBackend::default()
        };
        let mut controller = PreferenceController::start(surface(), backend).await;

        assert!(controller.dispatch(Transition::DecreaseFont).await.is_none());
        assert_eq!(controller.state().font_size, 70);
        assert!(controller.backend.saves.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_save_keeps_visual_effect() {
        let backend = MemoryBackend {
            fail_save: true,
            ..MemoryBackend::default()
        };
        let mut controller = PreferenceController::start(surface(), backend).await;

        let outcome = controller.dispatch(Transition::HighContrast).await.unwrap();
        assert!(!outcome.success);
        assert!(controller.surface().classes.contains("high-contrast"));
        assert_eq!(controller.state().contrast, ContrastMode::High);
        assert_eq!(controller.surface().notices, vec![SaveOutcome::FAILED]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn high_then_inverted_leaves_only_inverted() {
        let mut controller = PreferenceController::start(surface(), MemoryBackend::default()).await;

        controller.dispatch(Transition::HighContrast).await;
        controller.dispatch(Transition::InvertedContrast).await;

        let classes = &controller.surface().classes;
        assert!(classes.contains("inverted-colors"));
        assert!(!classes.contains("high-contrast"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn speech_without_support_notifies_and_stays_off() {
        let mut controller =
            PreferenceController::start(RecordingSurface::default(), MemoryBackend::default())
                .await;

        controller.dispatch(Transition::ToggleSpeech).await;

        assert!(!controller.state().speech);
        assert!(!controller.surface().classes.contains("text-to-speech"));
        assert_eq!(
            controller.surface().notices.first().map(String::as_str),
            Some(crate::controller::transition::SPEECH_UNSUPPORTED)
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn content_click_speaks_only_while_speech_is_on() {
        let mut controller = PreferenceController::start(surface(), MemoryBackend::default()).await;
        let click = || UiEvent::ContentClicked {
            text: "  Course overview  ".to_string(),
        };

        assert!(controller.handle_event(click()).await.is_none());
        assert!(controller.surface().spoken.is_empty());
        assert_eq!(controller.surface().cancelled, 0);

        controller.dispatch(Transition::ToggleSpeech).await;
        assert!(controller.handle_event(click()).await.is_none());
        controller.content_clicked("   ");

        let page = controller.surface();
        assert_eq!(page.spoken, vec!["Course overview".to_string()]);
        assert_eq!(page.cancelled, 1);
        assert_eq!(controller.backend.saves.lock().unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reading_helper_follows_pointer() {
        let mut page = surface();
        page.element = Some(Rect {
            left: 12.0,
            top: 40.0,
            width: 300.0,
            height: 18.0,
        });
        page.scroll = 500.0;
        let mut controller = PreferenceController::start(page, MemoryBackend::default()).await;

        controller.pointer_moved(20.0, 45.0);
        assert_eq!(controller.surface().lookups.get(), 0);

        controller.dispatch(Transition::ToggleReadingHelper).await;
        controller
            .handle_event(UiEvent::PointerMoved { x: 20.0, y: 45.0 })
            .await;
        assert_eq!(controller.surface().lookups.get(), 1);
        assert_eq!(
            controller.surface().overlay,
            Some(Overlay {
                left: 12.0,
                top: 540.0,
                width: 300.0,
                height: 30.0,
            })
        );

        controller.dispatch(Transition::ToggleReadingHelper).await;
        assert!(!controller.surface().tracking);
        assert_eq!(controller.surface().overlay, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn menu_entries_drive_transitions() {
        let mut controller = PreferenceController::start(surface(), MemoryBackend::default()).await;

        assert!(controller.handle_event(UiEvent::ButtonClicked).await.is_none());
        assert!(controller.menu().is_open());

        let readable = ENTRIES
            .iter()
            .position(|entry| entry.transition == Transition::ToggleReadableFonts)
            .unwrap();
        let outcome = controller
            .handle_event(UiEvent::EntryClicked(readable))
            .await
            .unwrap();
        assert!(outcome.success);
        assert!(controller.surface().classes.contains("readable-fonts"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn local_backend_persists_through_service() {
        let service = PreferenceService::open_in_memory().await.unwrap();
        let user: UserId = "17".parse().unwrap();
        let caller = Caller::new(user.clone(), [Capability::EditOwnProfile]);

        let mut controller =
            PreferenceController::start(surface(), LocalBackend::new(service.clone(), caller))
                .await;
        controller.dispatch(Transition::IncreaseFont).await;
        controller.dispatch(Transition::InvertedContrast).await;

        let stored = service.fetch_preferences(&user).await;
        assert_eq!(stored.fontsize, 110);
        assert_eq!(stored.contrast, ContrastMode::Inverted);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn local_backend_without_capability_reports_failure() {
        let service = PreferenceService::open_in_memory().await.unwrap();
        let caller = Caller::new("17".parse().unwrap(), []);

        let mut controller =
            PreferenceController::start(surface(), LocalBackend::new(service.clone(), caller))
                .await;
        let outcome = controller.dispatch(Transition::ResetFont).await.unwrap();

        assert!(!outcome.success);
        assert!(service.users_with_preferences().await.unwrap().is_empty());
    }
}
