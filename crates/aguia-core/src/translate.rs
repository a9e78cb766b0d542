//! Mapping between stored rows, the typed record, and the client shapes.
//!
//! Two column families exist in the storage history: the legacy one
//! (`tamanho_fonte`, `contraste` with `alto`/`invertido` tokens, ...) and the
//! current one (`fontsize`, `contrast`, ...). Reads accept either family and
//! prefer the legacy column when both are present. Writes emit both families so
//! a row written here reads the same whichever column wins.
//!
//! Nothing in this module fails on bad stored data: unknown or out-of-range
//! values fall back to the field default.

use serde_json::Value;
use thiserror::Error;

use crate::models::{
    ClientPrefs, ColorblindMode, ContrastMode, ExtendedPreferences, FieldValue, FrontendPrefs,
    PreferenceRecord, PreferenceUpdate, StoredRow, UserId, DEFAULT_FONT_SIZE,
    DEFAULT_LINE_SPACING,
};

/// Line-spacing percentages indexed by ordinal level
pub const LINE_SPACING_LEVELS: [u32; 4] = [100, 150, 200, 250];

/// A preference column under its legacy and current names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub legacy: &'static str,
    pub current: &'static str,
}

impl Column {
    const fn new(legacy: &'static str, current: &'static str) -> Self {
        Self { legacy, current }
    }

    /// Legacy-first lookup
    fn pick(self, row: &StoredRow) -> Option<&FieldValue> {
        row.get(self.legacy).or_else(|| row.get(self.current))
    }
}

pub const FONT_SIZE: Column = Column::new("tamanho_fonte", "fontsize");
pub const CONTRAST: Column = Column::new("contraste", "contrast");
pub const READABLE_FONTS: Column = Column::new("fontes_legiveis", "readablefonts");
pub const LINE_SPACING: Column = Column::new("espaco_linhas", "linespacing");
pub const SPEECH: Column = Column::new("texto_para_fala", "speech");
pub const READING_HELPER: Column = Column::new("auxiliar_leitura", "texthelper");
pub const COLORBLIND: Column = Column::new("daltonismo", "colorblind");
pub const COLOR_INTENSITY: Column = Column::new("intensidade_cores", "color_intensity");
pub const FONT_MODE: Column = Column::new("modo_fonte", "font_mode");
pub const LETTER_SPACING: Column = Column::new("espaco_letras", "letter_spacing");
pub const EMPHASIZE_LINKS: Column = Column::new("destaque_links", "emphasize_links");
pub const HEADER_HIGHLIGHT: Column = Column::new("destaque_cabecalho", "header_highlight");
pub const HIGHLIGHTED_LETTERS: Column = Column::new("destaque_letras", "highlighted_letters");
pub const READING_MASK_MODE: Column = Column::new("mascara_leitura_modo", "reading_mask_mode");
pub const HORIZONTAL_MASK_LEVEL: Column =
    Column::new("mascara_horizontal_nivel", "horizontal_mask_level");
pub const VERTICAL_MASK_LEVEL: Column =
    Column::new("mascara_vertical_nivel", "vertical_mask_level");
pub const CUSTOM_CURSOR: Column = Column::new("cursor_personalizado", "custom_cursor");
pub const REDUCE_ANIMATIONS: Column = Column::new("reduzir_animacoes", "reduce_animations");
pub const LAST_MODIFIED: Column = Column::new("modificado_em", "timemodified");

pub const COLUMNS: [Column; 19] = [
    FONT_SIZE,
    CONTRAST,
    READABLE_FONTS,
    LINE_SPACING,
    SPEECH,
    READING_HELPER,
    COLORBLIND,
    COLOR_INTENSITY,
    FONT_MODE,
    LETTER_SPACING,
    EMPHASIZE_LINKS,
    HEADER_HIGHLIGHT,
    HIGHLIGHTED_LETTERS,
    READING_MASK_MODE,
    HORIZONTAL_MASK_LEVEL,
    VERTICAL_MASK_LEVEL,
    CUSTOM_CURSOR,
    REDUCE_ANIMATIONS,
    LAST_MODIFIED,
];

/// Whether `name` is a preference column of either family
pub fn is_known_column(name: &str) -> bool {
    COLUMNS
        .iter()
        .any(|column| column.legacy == name || column.current == name)
}

/// Rejected client input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPreference {
    #[error("Font size must be a positive percentage, got {0}")]
    FontSize(i64),
    #[error("Line spacing must be a positive percentage, got {0}")]
    LineSpacing(i64),
}

/// Ordinal level (0..=3) for a line-spacing percentage
pub const fn line_spacing_level(percent: i64) -> u8 {
    if percent >= 250 {
        3
    } else if percent >= 200 {
        2
    } else if percent >= 150 {
        1
    } else {
        0
    }
}

/// Percentage for an ordinal level; out-of-range levels map to 100
pub fn line_spacing_percent(level: i64) -> u32 {
    usize::try_from(level)
        .ok()
        .and_then(|index| LINE_SPACING_LEVELS.get(index).copied())
        .unwrap_or(DEFAULT_LINE_SPACING)
}

fn positive_percent(value: Option<&FieldValue>, default: u32) -> u32 {
    value
        .and_then(FieldValue::as_i64)
        .and_then(|value| u32::try_from(value).ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn flag(row: &StoredRow, column: Column) -> bool {
    column
        .pick(row)
        .and_then(FieldValue::as_flag)
        .unwrap_or(false)
}

fn int(row: &StoredRow, column: Column) -> i64 {
    column.pick(row).and_then(FieldValue::as_i64).unwrap_or(0)
}

/// Build the typed record from a stored row of either schema
pub fn to_record(user_id: UserId, row: &StoredRow) -> PreferenceRecord {
    PreferenceRecord {
        user_id,
        font_size: positive_percent(FONT_SIZE.pick(row), DEFAULT_FONT_SIZE),
        contrast: CONTRAST
            .pick(row)
            .map_or(ContrastMode::Normal, |value| {
                ContrastMode::from_token(&value.as_text())
            }),
        readable_fonts: flag(row, READABLE_FONTS),
        line_spacing: positive_percent(LINE_SPACING.pick(row), DEFAULT_LINE_SPACING),
        speech: flag(row, SPEECH),
        reading_helper: flag(row, READING_HELPER),
        colorblind: COLORBLIND
            .pick(row)
            .map_or(ColorblindMode::None, |value| {
                ColorblindMode::from_token(&value.as_text())
            }),
        extended: ExtendedPreferences {
            color_intensity_mode: int(row, COLOR_INTENSITY),
            font_mode: int(row, FONT_MODE),
            letter_spacing: int(row, LETTER_SPACING),
            emphasize_links: flag(row, EMPHASIZE_LINKS),
            header_highlight: flag(row, HEADER_HIGHLIGHT),
            highlighted_letters: flag(row, HIGHLIGHTED_LETTERS),
            reading_mask_mode: int(row, READING_MASK_MODE),
            horizontal_mask_level: int(row, HORIZONTAL_MASK_LEVEL),
            vertical_mask_level: int(row, VERTICAL_MASK_LEVEL),
            custom_cursor: flag(row, CUSTOM_CURSOR),
            reduce_animations: flag(row, REDUCE_ANIMATIONS),
        },
        last_modified: LAST_MODIFIED.pick(row).and_then(FieldValue::as_i64),
    }
}

/// Shape returned by `get_preferences`
pub fn to_client_shape(record: &PreferenceRecord) -> ClientPrefs {
    ClientPrefs {
        fontsize: i64::from(record.font_size),
        contrast: record.contrast,
        readablefonts: record.readable_fonts,
        linespacing: i64::from(record.line_spacing),
        speech: record.speech,
        texthelper: record.reading_helper,
        colorblind: record.colorblind,
    }
}

/// Shape consumed by the in-page scripts
pub fn to_frontend_shape(record: &PreferenceRecord) -> FrontendPrefs {
    FrontendPrefs {
        font_size: record.font_size,
        high_contrast: record.contrast == ContrastMode::High,
        readable_fonts: record.readable_fonts,
        text_to_speech: record.speech,
        reading_helper: record.reading_helper,
        colorblind: record.colorblind,
        line_spacing: line_spacing_level(i64::from(record.line_spacing)),
        extended: record.extended,
    }
}

impl TryFrom<&ClientPrefs> for PreferenceUpdate {
    type Error = InvalidPreference;

    fn try_from(prefs: &ClientPrefs) -> Result<Self, Self::Error> {
        let font_size = u32::try_from(prefs.fontsize)
            .ok()
            .filter(|value| *value > 0)
            .ok_or(InvalidPreference::FontSize(prefs.fontsize))?;
        let line_spacing = u32::try_from(prefs.linespacing)
            .ok()
            .filter(|value| *value > 0)
            .ok_or(InvalidPreference::LineSpacing(prefs.linespacing))?;

        Ok(Self {
            font_size: Some(font_size),
            contrast: Some(prefs.contrast),
            readable_fonts: Some(prefs.readablefonts),
            line_spacing: Some(line_spacing),
            speech: Some(prefs.speech),
            reading_helper: Some(prefs.texthelper),
            colorblind: Some(prefs.colorblind),
        })
    }
}

/// Merge `update` over `existing` (or defaults) and stamp the modification time.
pub fn to_storage_shape(
    user_id: &UserId,
    update: &PreferenceUpdate,
    existing: Option<&PreferenceRecord>,
    now: i64,
) -> PreferenceRecord {
    let mut record = existing
        .cloned()
        .unwrap_or_else(|| PreferenceRecord::defaults(user_id.clone()));
    record.user_id = user_id.clone();

    if let Some(font_size) = update.font_size {
        record.font_size = font_size;
    }
    if let Some(contrast) = update.contrast {
        record.contrast = contrast;
    }
    if let Some(readable_fonts) = update.readable_fonts {
        record.readable_fonts = readable_fonts;
    }
    if let Some(line_spacing) = update.line_spacing {
        record.line_spacing = line_spacing;
    }
    if let Some(speech) = update.speech {
        record.speech = speech;
    }
    if let Some(reading_helper) = update.reading_helper {
        record.reading_helper = reading_helper;
    }
    if let Some(colorblind) = update.colorblind {
        record.colorblind = colorblind;
    }

    record.last_modified = Some(now);
    record
}

fn put(row: &mut StoredRow, column: Column, value: impl Into<FieldValue> + Clone) {
    row.insert(column.legacy, value.clone());
    row.insert(column.current, value);
}

/// Stored row for a record, with both column families populated
pub fn to_row(record: &PreferenceRecord) -> StoredRow {
    let mut row = StoredRow::new();
    put(&mut row, FONT_SIZE, record.font_size);
    row.insert(CONTRAST.legacy, record.contrast.legacy_token());
    row.insert(CONTRAST.current, record.contrast.as_str());
    put(&mut row, READABLE_FONTS, record.readable_fonts);
    put(&mut row, LINE_SPACING, record.line_spacing);
    put(&mut row, SPEECH, record.speech);
    put(&mut row, READING_HELPER, record.reading_helper);
    put(&mut row, COLORBLIND, record.colorblind.as_str());

    let extended = &record.extended;
    put(&mut row, COLOR_INTENSITY, extended.color_intensity_mode);
    put(&mut row, FONT_MODE, extended.font_mode);
    put(&mut row, LETTER_SPACING, extended.letter_spacing);
    put(&mut row, EMPHASIZE_LINKS, extended.emphasize_links);
    put(&mut row, HEADER_HIGHLIGHT, extended.header_highlight);
    put(&mut row, HIGHLIGHTED_LETTERS, extended.highlighted_letters);
    put(&mut row, READING_MASK_MODE, extended.reading_mask_mode);
    put(&mut row, HORIZONTAL_MASK_LEVEL, extended.horizontal_mask_level);
    put(&mut row, VERTICAL_MASK_LEVEL, extended.vertical_mask_level);
    put(&mut row, CUSTOM_CURSOR, extended.custom_cursor);
    put(&mut row, REDUCE_ANIMATIONS, extended.reduce_animations);

    if let Some(last_modified) = record.last_modified {
        put(&mut row, LAST_MODIFIED, last_modified);
    }
    row
}

#[allow(clippy::cast_possible_truncation)]
fn json_int(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(flag) => Some(i64::from(*flag)),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !matches!(text.trim(), "" | "0" | "false"),
        other => json_int(other).is_some_and(|value| value != 0),
    }
}

/// Apply one change expressed with a frontend key (`fontSize`, `highContrast`, ...).
///
/// Returns `false` and leaves the record untouched for keys that have no column.
pub fn apply_frontend_update(record: &mut PreferenceRecord, key: &str, value: &Value) -> bool {
    let as_int = || json_int(value).unwrap_or(0);
    let extended = &mut record.extended;

    match key {
        "fontSize" => {
            record.font_size = u32::try_from(as_int())
                .ok()
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_FONT_SIZE);
        }
        "highContrast" => {
            record.contrast = if json_truthy(value) {
                ContrastMode::High
            } else {
                ContrastMode::Normal
            };
        }
        "readableFonts" => record.readable_fonts = json_truthy(value),
        "fontMode" => {
            extended.font_mode = as_int();
            record.readable_fonts = extended.font_mode != 0;
        }
        "lineSpacing" => record.line_spacing = line_spacing_percent(as_int()),
        "textToSpeech" => record.speech = json_truthy(value),
        "readingHelper" => record.reading_helper = json_truthy(value),
        "colorblind" => {
            record.colorblind = value
                .as_str()
                .map_or(ColorblindMode::None, ColorblindMode::from_token);
        }
        "colorIntensityMode" => extended.color_intensity_mode = as_int(),
        "letterSpacing" => extended.letter_spacing = as_int(),
        "emphasizeLinks" => extended.emphasize_links = json_truthy(value),
        "headerHighlight" => extended.header_highlight = json_truthy(value),
        "highlightedLetters" => extended.highlighted_letters = json_truthy(value),
        "readingMaskMode" => extended.reading_mask_mode = as_int(),
        "horizontalMaskLevel" => extended.horizontal_mask_level = as_int(),
        "verticalMaskLevel" => extended.vertical_mask_level = as_int(),
        "customCursor" => extended.custom_cursor = json_truthy(value),
        "reduceAnimations" => extended.reduce_animations = json_truthy(value),
        _ => {
            tracing::debug!(key, "Ignoring preference key with no stored column");
            return false;
        }
    }
    true
}
