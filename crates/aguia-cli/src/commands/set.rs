use std::path::Path;

use aguia_core::models::PreferenceUpdate;

use crate::cli::PreferenceArgs;
use crate::commands::common::{format_preference_lines, open_service, operator, parse_user_id};
use crate::error::CliError;

pub async fn run_set(user: &str, values: PreferenceArgs, db_path: &Path) -> Result<(), CliError> {
    let user_id = parse_user_id(user)?;
    let update = PreferenceUpdate::from(values);
    if update.is_empty() {
        return Err(CliError::NothingToSet);
    }

    let service = open_service(db_path).await?;
    let outcome = service
        .apply_update(&operator()?, &user_id, &update)
        .await
        .map_err(aguia_core::Error::from)?;
    if !outcome.success {
        return Err(CliError::SaveRejected(outcome.message));
    }

    for line in format_preference_lines(&service.fetch_preferences(&user_id).await) {
        println!("{line}");
    }
    Ok(())
}
