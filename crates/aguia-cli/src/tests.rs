use std::path::PathBuf;

use aguia_core::models::{ClientPrefs, ColorblindMode, ContrastMode, PreferenceUpdate};
use aguia_core::PreferenceService;
use clap::Parser;

use crate::cli::{
    Cli, ColorblindArg, Commands, CompletionShell, ContrastArg, ExportFormat, PreferenceArgs,
    RemoteCommands,
};
use crate::commands::common::{
    apply_update_to_prefs, format_preference_lines, operator, resolve_db_path,
};
use crate::commands::completions::run_completions;
use crate::commands::delete::run_delete;
use crate::commands::export::run_export;
use crate::commands::set::run_set;
use crate::error::CliError;

fn db_in(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("nested").join("aguia.db")
}

#[test]
fn explicit_db_path_wins() {
    let path = resolve_db_path(Some(PathBuf::from("/tmp/custom.db")));
    assert_eq!(path, PathBuf::from("/tmp/custom.db"));
}

#[test]
fn operator_can_manage_any_user() {
    let caller = operator().unwrap();
    assert!(caller.can_edit(&"42".parse().unwrap()));
}

#[test]
fn cli_parses_partial_set() {
    let cli = Cli::try_parse_from([
        "aguia",
        "--db-path",
        "prefs.db",
        "set",
        "--user",
        "42",
        "--fontsize",
        "130",
        "--contrast",
        "inverted",
        "--speech",
        "true",
    ])
    .unwrap();

    assert_eq!(cli.db_path, Some(PathBuf::from("prefs.db")));
    let Commands::Set { user, values } = cli.command else {
        panic!("expected set command");
    };
    assert_eq!(user, "42");
    let update = PreferenceUpdate::from(values);
    assert_eq!(update.font_size, Some(130));
    assert_eq!(update.contrast, Some(ContrastMode::Inverted));
    assert_eq!(update.speech, Some(true));
    assert_eq!(update.line_spacing, None);
}

#[test]
fn cli_rejects_zero_font_size() {
    assert!(Cli::try_parse_from(["aguia", "set", "--user", "42", "--fontsize", "0"]).is_err());
}

#[test]
fn cli_parses_remote_save() {
    let cli = Cli::try_parse_from([
        "aguia",
        "remote",
        "save",
        "--url",
        "https://lms.example.edu",
        "--token",
        "abc",
        "--colorblind",
        "tritanopia",
    ])
    .unwrap();

    let Commands::Remote {
        command: RemoteCommands::Save { target, values },
    } = cli.command
    else {
        panic!("expected remote save");
    };
    assert_eq!(target.url, "https://lms.example.edu");
    assert_eq!(values.colorblind, Some(ColorblindArg::Tritanopia));
}

#[test]
fn preference_lines_show_every_field() {
    let lines = format_preference_lines(&ClientPrefs::default());
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0], "fontsize      100%");
    assert_eq!(lines[1], "contrast      normal");
    assert_eq!(lines[6], "colorblind    none");
}

#[test]
fn overlay_only_touches_given_fields() {
    let mut prefs = ClientPrefs {
        fontsize: 150,
        ..ClientPrefs::default()
    };
    let update = PreferenceUpdate::from(PreferenceArgs {
        contrast: Some(ContrastArg::High),
        colorblind: Some(ColorblindArg::Protanopia),
        ..PreferenceArgs::default()
    });

    apply_update_to_prefs(&mut prefs, &update);

    assert_eq!(prefs.fontsize, 150);
    assert_eq!(prefs.contrast, ContrastMode::High);
    assert_eq!(prefs.colorblind, ColorblindMode::Protanopia);
    assert!(!prefs.speech);
}

#[tokio::test(flavor = "multi_thread")]
async fn set_requires_at_least_one_flag() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_set("42", PreferenceArgs::default(), &db_in(&dir))
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::NothingToSet));
}

#[tokio::test(flavor = "multi_thread")]
async fn set_keeps_values_not_given() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = db_in(&dir);

    run_set(
        "42",
        PreferenceArgs {
            fontsize: Some(140),
            ..PreferenceArgs::default()
        },
        &db_path,
    )
    .await
    .unwrap();
    run_set(
        "42",
        PreferenceArgs {
            linespacing: Some(150),
            ..PreferenceArgs::default()
        },
        &db_path,
    )
    .await
    .unwrap();

    let service = PreferenceService::open_path(&db_path).await.unwrap();
    let prefs = service.fetch_preferences(&"42".parse().unwrap()).await;
    assert_eq!(prefs.fontsize, 140);
    assert_eq!(prefs.linespacing, 150);
}

#[tokio::test(flavor = "multi_thread")]
async fn blank_user_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_delete("  ", &db_in(&dir)).await.unwrap_err();
    assert!(matches!(err, CliError::EmptyUserId));
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_reports_whether_anything_was_removed() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = db_in(&dir);
    run_set(
        "42",
        PreferenceArgs {
            readablefonts: Some(true),
            ..PreferenceArgs::default()
        },
        &db_path,
    )
    .await
    .unwrap();

    assert!(run_delete("42", &db_path).await.unwrap());
    assert!(!run_delete("42", &db_path).await.unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn export_writes_into_directory_with_suggested_name() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = db_in(&dir);
    run_set(
        "42",
        PreferenceArgs {
            fontsize: Some(120),
            ..PreferenceArgs::default()
        },
        &db_path,
    )
    .await
    .unwrap();

    let out_dir = dir.path().join("exports");
    std::fs::create_dir_all(&out_dir).unwrap();
    run_export("42", ExportFormat::Json, Some(&out_dir), &db_path)
        .await
        .unwrap();

    let entries = std::fs::read_dir(&out_dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect::<Vec<_>>();
    assert_eq!(entries.len(), 1);
    let name = entries[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("aguia-42-"));
    assert!(name.ends_with(".json"));

    let payload: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&entries[0]).unwrap()).unwrap();
    assert_eq!(payload["user_id"], "42");
    assert_eq!(payload["preferences"]["tamanho_fonte"], 120);
}

#[tokio::test(flavor = "multi_thread")]
async fn export_of_unknown_user_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_export("nobody", ExportFormat::Markdown, None, &db_in(&dir))
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::NoStoredPreferences(_)));
}

#[test]
fn completions_write_bash_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("aguia.bash");

    run_completions(CompletionShell::Bash, Some(&output)).unwrap();

    let script = std::fs::read_to_string(&output).unwrap();
    assert!(script.contains("aguia"));
}
