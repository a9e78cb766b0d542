//! Client-side preference controller.
//!
//! State lives in [`PreferenceState`]; [`transition::step`] turns a
//! [`Transition`] into the next state plus a list of [`Effect`]s; the
//! [`PreferenceController`] applies those effects to a [`DocumentSurface`]
//! and saves through a [`PreferenceBackend`].

pub mod backend;
mod client;
pub mod menu;
pub mod state;
pub mod surface;
pub mod transition;

pub use backend::{LocalBackend, PreferenceBackend};
pub use client::PreferenceController;
pub use menu::{HoverTarget, Menu, MenuAction, MenuEntry, UiEvent};
pub use state::PreferenceState;
pub use surface::{DocumentSurface, Overlay, Rect};
pub use transition::{Effect, Step, Transition};
