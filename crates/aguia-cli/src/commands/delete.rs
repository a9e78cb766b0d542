use std::path::Path;

use crate::commands::common::{open_service, operator, parse_user_id};
use crate::error::CliError;

pub async fn run_delete(user: &str, db_path: &Path) -> Result<bool, CliError> {
    let user_id = parse_user_id(user)?;
    let service = open_service(db_path).await?;

    let removed = service.delete_preferences(&operator()?, &user_id).await?;
    if removed {
        println!("Erased preferences for {user_id}");
    } else {
        println!("No preferences stored for {user_id}");
    }
    Ok(removed)
}
