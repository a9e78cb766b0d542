//! Database migrations
//!
//! The preference table grew in three steps, mirroring the deployed history:
//! the legacy core columns, then the legacy extended columns, then the current
//! column family. Older databases therefore carry rows populated in only one
//! family, which is why reads go through the translator.

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 3;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        apply(conn, 1, &migrate_v1()).await?;
    }
    if version < 2 {
        apply(conn, 2, &migrate_v2()).await?;
    }
    if version < 3 {
        apply(conn, 3, &migrate_v3()).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Run one version's statements in a transaction and record the version.
async fn apply(conn: &Connection, version: i32, statements: &[String]) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn
        .execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
        .await
    {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version {version} of {CURRENT_VERSION}");
    Ok(())
}

fn add_columns(columns: &[(&str, &str)]) -> Vec<String> {
    columns
        .iter()
        .map(|(name, kind)| format!("ALTER TABLE aguia_preferences ADD COLUMN {name} {kind}"))
        .collect()
}

/// Version 1: legacy core columns
fn migrate_v1() -> Vec<String> {
    vec![
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS aguia_preferences (
            user_id TEXT PRIMARY KEY NOT NULL,
            tamanho_fonte INTEGER,
            contraste TEXT,
            fontes_legiveis INTEGER,
            espaco_linhas INTEGER,
            texto_para_fala INTEGER,
            auxiliar_leitura INTEGER,
            daltonismo TEXT,
            modificado_em INTEGER
        )"
        .to_string(),
    ]
}

/// Version 2: legacy extended columns
fn migrate_v2() -> Vec<String> {
    add_columns(&[
        ("intensidade_cores", "INTEGER"),
        ("modo_fonte", "INTEGER"),
        ("espaco_letras", "INTEGER"),
        ("destaque_links", "INTEGER"),
        ("destaque_cabecalho", "INTEGER"),
        ("destaque_letras", "INTEGER"),
        ("mascara_leitura_modo", "INTEGER"),
        ("mascara_horizontal_nivel", "INTEGER"),
        ("mascara_vertical_nivel", "INTEGER"),
        ("cursor_personalizado", "INTEGER"),
        ("reduzir_animacoes", "INTEGER"),
    ])
}

/// Version 3: current column family
fn migrate_v3() -> Vec<String> {
    let mut statements = add_columns(&[
        ("fontsize", "INTEGER"),
        ("contrast", "TEXT"),
        ("readablefonts", "INTEGER"),
        ("linespacing", "INTEGER"),
        ("speech", "INTEGER"),
        ("texthelper", "INTEGER"),
        ("colorblind", "TEXT"),
        ("color_intensity", "INTEGER"),
        ("font_mode", "INTEGER"),
        ("letter_spacing", "INTEGER"),
        ("emphasize_links", "INTEGER"),
        ("header_highlight", "INTEGER"),
        ("highlighted_letters", "INTEGER"),
        ("reading_mask_mode", "INTEGER"),
        ("horizontal_mask_level", "INTEGER"),
        ("vertical_mask_level", "INTEGER"),
        ("custom_cursor", "INTEGER"),
        ("reduce_animations", "INTEGER"),
        ("timemodified", "INTEGER"),
    ]);
    statements.push(
        "CREATE INDEX IF NOT EXISTS idx_aguia_preferences_modified
            ON aguia_preferences(timemodified DESC)"
            .to_string(),
    );
    statements
}
