use aguia_core::controller::PreferenceBackend;
use aguia_core::models::PreferenceUpdate;

use crate::cli::{PreferenceArgs, RemoteTarget};
use crate::commands::common::{apply_update_to_prefs, format_preference_lines};
use crate::error::CliError;
use crate::remote::HttpBackend;

pub async fn run_remote_get(target: &RemoteTarget, as_json: bool) -> Result<(), CliError> {
    let backend = HttpBackend::new(&target.url, &target.token)?;
    let prefs = backend.load().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&prefs)?);
    } else {
        for line in format_preference_lines(&prefs) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Fetch the remote set, overlay the given flags and save the full set back.
pub async fn run_remote_save(target: &RemoteTarget, values: PreferenceArgs) -> Result<(), CliError> {
    let update = PreferenceUpdate::from(values);
    if update.is_empty() {
        return Err(CliError::NothingToSet);
    }

    let backend = HttpBackend::new(&target.url, &target.token)?;
    let mut prefs = backend.load().await?;
    apply_update_to_prefs(&mut prefs, &update);

    let outcome = backend.save(&prefs).await?;
    if !outcome.success {
        return Err(CliError::SaveRejected(outcome.message));
    }
    println!("{}", outcome.message);
    Ok(())
}
