use std::path::{Path, PathBuf};

use aguia_core::export::{render_privacy_export, suggested_export_file_name};

use crate::cli::ExportFormat;
use crate::commands::common::{open_service, parse_user_id};
use crate::error::CliError;

pub async fn run_export(
    user: &str,
    format: ExportFormat,
    output_path: Option<&Path>,
    db_path: &Path,
) -> Result<(), CliError> {
    let user_id = parse_user_id(user)?;
    let service = open_service(db_path).await?;
    let export = service
        .export_user_data(&user_id)
        .await?
        .ok_or_else(|| CliError::NoStoredPreferences(user_id.to_string()))?;

    let format = format.into();
    let rendered = render_privacy_export(&export, format)?;

    if let Some(path) = output_path {
        let path: PathBuf = if path.is_dir() {
            path.join(suggested_export_file_name(
                &export.user_id,
                format,
                export.exported_at,
            ))
        } else {
            path.to_path_buf()
        };
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}
