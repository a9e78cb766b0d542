use std::env;
use std::path::{Path, PathBuf};

use aguia_core::models::{ClientPrefs, PreferenceUpdate};
use aguia_core::{Caller, Capability, PreferenceService, UserId};

use crate::error::CliError;

/// User id the CLI acts as; it holds every capability because it runs against the local file
const OPERATOR_ID: &str = "aguia-cli";

pub async fn open_service(db_path: &Path) -> Result<PreferenceService, CliError> {
    Ok(PreferenceService::open_path(db_path).await?)
}

pub fn operator() -> Result<Caller, CliError> {
    Ok(Caller::new(
        parse_user_id(OPERATOR_ID)?,
        [Capability::EditOwnProfile, Capability::ManagePrivacy],
    ))
}

pub fn parse_user_id(raw: &str) -> Result<UserId, CliError> {
    Ok(raw.parse::<UserId>()?)
}

pub fn format_preference_lines(prefs: &ClientPrefs) -> Vec<String> {
    vec![
        format!("fontsize      {}%", prefs.fontsize),
        format!("contrast      {}", prefs.contrast.as_str()),
        format!("readablefonts {}", on_off(prefs.readablefonts)),
        format!("linespacing   {}%", prefs.linespacing),
        format!("speech        {}", on_off(prefs.speech)),
        format!("texthelper    {}", on_off(prefs.texthelper)),
        format!("colorblind    {}", prefs.colorblind.as_str()),
    ]
}

const fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Overlay the fields set in `update` onto a full client preference set.
pub fn apply_update_to_prefs(prefs: &mut ClientPrefs, update: &PreferenceUpdate) {
    if let Some(font_size) = update.font_size {
        prefs.fontsize = i64::from(font_size);
    }
    if let Some(contrast) = update.contrast {
        prefs.contrast = contrast;
    }
    if let Some(readable_fonts) = update.readable_fonts {
        prefs.readablefonts = readable_fonts;
    }
    if let Some(line_spacing) = update.line_spacing {
        prefs.linespacing = i64::from(line_spacing);
    }
    if let Some(speech) = update.speech {
        prefs.speech = speech;
    }
    if let Some(reading_helper) = update.reading_helper {
        prefs.texthelper = reading_helper;
    }
    if let Some(colorblind) = update.colorblind {
        prefs.colorblind = colorblind;
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("AGUIA_DATABASE_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aguia")
        .join("aguia.db")
}
