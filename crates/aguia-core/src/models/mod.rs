//! Data models for Aguia

mod preferences;
mod stored_row;
mod user;

pub use preferences::{
    ClientPrefs, ColorblindMode, ContrastMode, ExtendedPreferences, FrontendPrefs,
    PreferenceRecord, PreferenceUpdate, SaveOutcome, DEFAULT_FONT_SIZE, DEFAULT_LINE_SPACING,
};
pub use stored_row::{FieldValue, StoredRow};
pub use user::{Caller, Capability, EmptyUserId, UserId};
