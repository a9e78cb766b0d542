//! In-memory values the client controller works on.

use crate::models::{
    ClientPrefs, ColorblindMode, ContrastMode, DEFAULT_FONT_SIZE, DEFAULT_LINE_SPACING,
};

/// Font size change per increase/decrease, in percent
pub const FONT_STEP: u32 = 10;
/// Decreasing stops once the font size is at or below this value
pub const FONT_FLOOR: u32 = 70;
/// Line-spacing increment of the cyclic control, in percent
pub const LINE_SPACING_STEP: u32 = 25;
/// The cyclic control wraps back to the default from this value upward
pub const LINE_SPACING_CEILING: u32 = 200;

/// Active preference values on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceState {
    pub font_size: u32,
    pub contrast: ContrastMode,
    pub readable_fonts: bool,
    pub line_spacing: u32,
    pub speech: bool,
    pub reading_helper: bool,
    pub colorblind: ColorblindMode,
}

impl Default for PreferenceState {
    fn default() -> Self {
        Self::from(&ClientPrefs::default())
    }
}

impl From<&ClientPrefs> for PreferenceState {
    /// Zero or negative sizes coming from the server are treated as unset.
    fn from(prefs: &ClientPrefs) -> Self {
        let percent = |value: i64, default: u32| {
            u32::try_from(value)
                .ok()
                .filter(|value| *value > 0)
                .unwrap_or(default)
        };

        Self {
            font_size: percent(prefs.fontsize, DEFAULT_FONT_SIZE),
            contrast: prefs.contrast,
            readable_fonts: prefs.readablefonts,
            line_spacing: percent(prefs.linespacing, DEFAULT_LINE_SPACING),
            speech: prefs.speech,
            reading_helper: prefs.texthelper,
            colorblind: prefs.colorblind,
        }
    }
}

impl PreferenceState {
    /// Wire shape sent with every save
    pub fn to_client_prefs(&self) -> ClientPrefs {
        ClientPrefs {
            fontsize: i64::from(self.font_size),
            contrast: self.contrast,
            readablefonts: self.readable_fonts,
            linespacing: i64::from(self.line_spacing),
            speech: self.speech,
            texthelper: self.reading_helper,
            colorblind: self.colorblind,
        }
    }
}

/// Next value of the cyclic line-spacing control.
pub const fn next_line_spacing(current: u32) -> u32 {
    if current >= LINE_SPACING_CEILING {
        DEFAULT_LINE_SPACING
    } else {
        current + LINE_SPACING_STEP
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_line_spacing_cycles() {
        let mut spacing = DEFAULT_LINE_SPACING;
        let mut seen = Vec::new();
        for _ in 0..6 {
            spacing = next_line_spacing(spacing);
            seen.push(spacing);
        }
        assert_eq!(seen, vec![125, 150, 175, 200, 100, 125]);
        assert_eq!(next_line_spacing(250), 100);
    }

    #[test]
    fn test_state_from_client_prefs_ignores_non_positive_sizes() {
        let prefs = ClientPrefs {
            fontsize: 0,
            linespacing: -3,
            speech: true,
            ..ClientPrefs::default()
        };
        let state = PreferenceState::from(&prefs);
        assert_eq!(state.font_size, 100);
        assert_eq!(state.line_spacing, 100);
        assert!(state.speech);
    }

    #[test]
    fn test_state_round_trips_client_prefs() {
        let prefs = ClientPrefs {
            fontsize: 130,
            contrast: ContrastMode::High,
            readablefonts: true,
            linespacing: 175,
            speech: false,
            texthelper: true,
            colorblind: ColorblindMode::Deuteranopia,
        };
        assert_eq!(PreferenceState::from(&prefs).to_client_prefs(), prefs);
    }
}
