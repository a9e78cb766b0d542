//! Accessibility preference models

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::UserId;

/// Default font size, in percent of the page's base size
pub const DEFAULT_FONT_SIZE: u32 = 100;
/// Default line spacing, in percent of the page's base line height
pub const DEFAULT_LINE_SPACING: u32 = 100;

/// Page contrast mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContrastMode {
    #[default]
    Normal,
    High,
    Inverted,
}

impl ContrastMode {
    /// Parse a contrast token from either schema; unknown tokens fall back to `Normal`.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "high" | "alto" => Self::High,
            "inverted" | "invertido" => Self::Inverted,
            _ => Self::Normal,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "high",
            Self::Inverted => "inverted",
        }
    }

    /// Token stored in the legacy `contraste` column
    #[must_use]
    pub const fn legacy_token(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "alto",
            Self::Inverted => "invertido",
        }
    }

    /// Body class that renders this mode, if any
    #[must_use]
    pub const fn css_class(self) -> Option<&'static str> {
        match self {
            Self::Normal => None,
            Self::High => Some("high-contrast"),
            Self::Inverted => Some("inverted-colors"),
        }
    }
}

impl From<String> for ContrastMode {
    fn from(value: String) -> Self {
        Self::from_token(&value)
    }
}

impl From<ContrastMode> for String {
    fn from(value: ContrastMode) -> Self {
        value.as_str().to_string()
    }
}

/// Colour-vision simulation/correction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColorblindMode {
    #[default]
    None,
    Protanopia,
    Deuteranopia,
    Tritanopia,
}

impl ColorblindMode {
    /// All non-default modes, in menu order
    pub const ACTIVE: [Self; 3] = [Self::Protanopia, Self::Deuteranopia, Self::Tritanopia];

    /// Parse a mode name; anything outside the known set becomes `None`.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "protanopia" => Self::Protanopia,
            "deuteranopia" => Self::Deuteranopia,
            "tritanopia" => Self::Tritanopia,
            _ => Self::None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Protanopia => "protanopia",
            Self::Deuteranopia => "deuteranopia",
            Self::Tritanopia => "tritanopia",
        }
    }

    #[must_use]
    pub const fn css_class(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Protanopia => Some("colorblind-protanopia"),
            Self::Deuteranopia => Some("colorblind-deuteranopia"),
            Self::Tritanopia => Some("colorblind-tritanopia"),
        }
    }
}

impl From<String> for ColorblindMode {
    fn from(value: String) -> Self {
        Self::from_token(&value)
    }
}

impl From<ColorblindMode> for String {
    fn from(value: ColorblindMode) -> Self {
        value.as_str().to_string()
    }
}

/// Secondary display adjustments kept alongside the core preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedPreferences {
    pub color_intensity_mode: i64,
    pub font_mode: i64,
    pub letter_spacing: i64,
    pub emphasize_links: bool,
    pub header_highlight: bool,
    pub highlighted_letters: bool,
    pub reading_mask_mode: i64,
    pub horizontal_mask_level: i64,
    pub vertical_mask_level: i64,
    pub custom_cursor: bool,
    pub reduce_animations: bool,
}

/// The persisted per-user accessibility settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub user_id: UserId,
    /// Font size in percent
    pub font_size: u32,
    pub contrast: ContrastMode,
    pub readable_fonts: bool,
    /// Line spacing in percent
    pub line_spacing: u32,
    pub speech: bool,
    pub reading_helper: bool,
    pub colorblind: ColorblindMode,
    pub extended: ExtendedPreferences,
    /// Unix seconds of the last save; `None` for a record that was never stored
    pub last_modified: Option<i64>,
}

impl PreferenceRecord {
    /// All-defaults record, equivalent to "nothing saved yet"
    #[must_use]
    pub fn defaults(user_id: UserId) -> Self {
        Self {
            user_id,
            font_size: DEFAULT_FONT_SIZE,
            contrast: ContrastMode::Normal,
            readable_fonts: false,
            line_spacing: DEFAULT_LINE_SPACING,
            speech: false,
            reading_helper: false,
            colorblind: ColorblindMode::None,
            extended: ExtendedPreferences::default(),
            last_modified: None,
        }
    }
}

/// Wire shape exchanged with the client through `get_preferences`/`save_preferences`
///
/// Every field is optional on input and takes its documented default when
/// missing or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPrefs {
    #[serde(default = "default_font_size", deserialize_with = "loose_font_size")]
    pub fontsize: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contrast: ContrastMode,
    #[serde(default, with = "flag")]
    pub readablefonts: bool,
    #[serde(default = "default_line_spacing", deserialize_with = "loose_line_spacing")]
    pub linespacing: i64,
    #[serde(default, with = "flag")]
    pub speech: bool,
    #[serde(default, with = "flag")]
    pub texthelper: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub colorblind: ColorblindMode,
}

impl Default for ClientPrefs {
    fn default() -> Self {
        Self {
            fontsize: default_font_size(),
            contrast: ContrastMode::Normal,
            readablefonts: false,
            linespacing: default_line_spacing(),
            speech: false,
            texthelper: false,
            colorblind: ColorblindMode::None,
        }
    }
}

const fn default_font_size() -> i64 {
    DEFAULT_FONT_SIZE as i64
}

const fn default_line_spacing() -> i64 {
    DEFAULT_LINE_SPACING as i64
}

/// Partial change to the core preferences; `None` leaves the stored value untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreferenceUpdate {
    pub font_size: Option<u32>,
    pub contrast: Option<ContrastMode>,
    pub readable_fonts: Option<bool>,
    pub line_spacing: Option<u32>,
    pub speech: Option<bool>,
    pub reading_helper: Option<bool>,
    pub colorblind: Option<ColorblindMode>,
}

impl PreferenceUpdate {
    pub const fn is_empty(&self) -> bool {
        self.font_size.is_none()
            && self.contrast.is_none()
            && self.readable_fonts.is_none()
            && self.line_spacing.is_none()
            && self.speech.is_none()
            && self.reading_helper.is_none()
            && self.colorblind.is_none()
    }
}

/// Shape consumed by the in-page scripts, with line spacing as an ordinal level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendPrefs {
    pub font_size: u32,
    pub high_contrast: bool,
    pub readable_fonts: bool,
    pub text_to_speech: bool,
    pub reading_helper: bool,
    pub colorblind: ColorblindMode,
    pub line_spacing: u8,
    #[serde(flatten)]
    pub extended: ExtendedPreferences,
}

/// Result of a save, reported to the client instead of an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub success: bool,
    pub message: String,
}

impl SaveOutcome {
    pub const SAVED: &'static str = "Preferences saved successfully";
    pub const FAILED: &'static str = "Error saving preferences";

    #[must_use]
    pub fn saved() -> Self {
        Self {
            success: true,
            message: Self::SAVED.to_string(),
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseScalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// `None` for an explicit `null`.
#[allow(clippy::cast_possible_truncation)]
fn loose_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(scalar) = Option::<LooseScalar>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match scalar {
        LooseScalar::Bool(value) => Ok(Some(i64::from(value))),
        LooseScalar::Int(value) => Ok(Some(value)),
        LooseScalar::Float(value) => Ok(Some(value as i64)),
        LooseScalar::Text(text) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got `{text}`"))),
    }
}

fn loose_font_size<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_int(deserializer)?.unwrap_or_else(default_font_size))
}

fn loose_line_spacing<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_int(deserializer)?.unwrap_or_else(default_line_spacing))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Booleans travel as `0`/`1` integers on the wire.
mod flag {
    use super::{Deserialize, Deserializer, LooseScalar, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<LooseScalar>::deserialize(deserializer)? {
            None => false,
            Some(LooseScalar::Bool(value)) => value,
            Some(LooseScalar::Int(value)) => value != 0,
            Some(LooseScalar::Float(value)) => value != 0.0,
            Some(LooseScalar::Text(text)) => matches!(
                text.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ),
        })
    }
}
