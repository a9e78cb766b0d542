use std::path::Path;

use crate::commands::common::open_service;
use crate::error::CliError;

pub async fn run_users(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let service = open_service(db_path).await?;
    let ids = service
        .users_with_preferences()
        .await?
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&ids)?);
    } else {
        for id in ids {
            println!("{id}");
        }
    }
    Ok(())
}
