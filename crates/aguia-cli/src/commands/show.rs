use std::path::Path;

use aguia_core::translate::to_client_shape;
use aguia_core::PreferenceRecord;

use crate::commands::common::{format_preference_lines, open_service, parse_user_id};
use crate::error::CliError;

pub async fn run_show(user: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let user_id = parse_user_id(user)?;
    let service = open_service(db_path).await?;
    let record = service.fetch_record(&user_id).await?;
    let stored = record.is_some();
    let prefs =
        to_client_shape(&record.unwrap_or_else(|| PreferenceRecord::defaults(user_id.clone())));

    if as_json {
        println!("{}", serde_json::to_string_pretty(&prefs)?);
    } else {
        if !stored {
            println!("# no stored preferences for {user_id}, showing defaults");
        }
        for line in format_preference_lines(&prefs) {
            println!("{line}");
        }
    }

    Ok(())
}
