//! Preference service shared by the HTTP server, the CLI, and the client controller.
//!
//! This is the only write path for preference values. Reads never fail from
//! the caller's point of view; saves report persistence problems through
//! [`SaveOutcome`] and reserve `Err` for permission denials.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::db::{Database, LibSqlPreferenceRepository, PreferenceRepository};
use crate::export::PrivacyExport;
use crate::models::{
    Caller, Capability, ClientPrefs, FrontendPrefs, PreferenceRecord, PreferenceUpdate,
    SaveOutcome, UserId,
};
use crate::translate::{
    apply_frontend_update, to_client_shape, to_frontend_shape, to_record, to_row,
    to_storage_shape,
};
use crate::util::unix_timestamp_now;
use crate::{Error, Result};

/// Returned when a caller may not change the target user's preferences
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("User {caller} may not change preferences of user {target}")]
pub struct AccessDenied {
    pub caller: UserId,
    pub target: UserId,
}

impl From<AccessDenied> for Error {
    fn from(err: AccessDenied) -> Self {
        Self::PermissionDenied(err.to_string())
    }
}

/// Thread-safe service over the preference store.
#[derive(Clone)]
pub struct PreferenceService {
    db: Arc<Mutex<Database>>,
}

impl PreferenceService {
    /// Open a service backed by the database file at `db_path`.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!("Using preference database at {}", db_path.display());
        let db = Database::open(&db_path).await?;
        Ok(Self::from_database(db))
    }

    /// Open an in-memory service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self::from_database(db))
    }

    pub fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Stored record for a user, or `None` when nothing was saved yet.
    pub async fn fetch_record(&self, user_id: &UserId) -> Result<Option<PreferenceRecord>> {
        let db = self.db.lock().await;
        let repo = LibSqlPreferenceRepository::new(db.connection());
        let row = repo.find(user_id).await?;
        Ok(row.map(|row| to_record(user_id.clone(), &row)))
    }

    /// Stored record or defaults; lower-layer failures are logged and masked.
    pub async fn fetch_or_default(&self, user_id: &UserId) -> PreferenceRecord {
        match self.fetch_record(user_id).await {
            Ok(Some(record)) => record,
            Ok(None) => PreferenceRecord::defaults(user_id.clone()),
            Err(error) => {
                tracing::warn!(%error, "Failed to read preferences, using defaults");
                PreferenceRecord::defaults(user_id.clone())
            }
        }
    }

    /// Client shape of the user's preferences. Never fails.
    pub async fn fetch_preferences(&self, user_id: &UserId) -> ClientPrefs {
        to_client_shape(&self.fetch_or_default(user_id).await)
    }

    /// Frontend shape of the user's preferences. Never fails.
    pub async fn fetch_frontend_preferences(&self, user_id: &UserId) -> FrontendPrefs {
        to_frontend_shape(&self.fetch_or_default(user_id).await)
    }

    /// Validate and store the full client shape for `user_id`.
    pub async fn save_preferences(
        &self,
        caller: &Caller,
        user_id: &UserId,
        prefs: &ClientPrefs,
    ) -> std::result::Result<SaveOutcome, AccessDenied> {
        Self::authorize(caller, user_id)?;

        let update = match PreferenceUpdate::try_from(prefs) {
            Ok(update) => update,
            Err(error) => {
                tracing::debug!(%error, "Rejected preference values");
                return Ok(SaveOutcome::failed(error.to_string()));
            }
        };

        Ok(self.save_update(user_id, &update).await)
    }

    /// Store a partial update; fields left as `None` keep their stored value.
    pub async fn apply_update(
        &self,
        caller: &Caller,
        user_id: &UserId,
        update: &PreferenceUpdate,
    ) -> std::result::Result<SaveOutcome, AccessDenied> {
        Self::authorize(caller, user_id)?;
        Ok(self.save_update(user_id, update).await)
    }

    /// Change a single value addressed by its frontend key (`fontSize`, `lineSpacing`, ...).
    pub async fn update_preference(
        &self,
        caller: &Caller,
        user_id: &UserId,
        key: &str,
        value: &serde_json::Value,
    ) -> std::result::Result<SaveOutcome, AccessDenied> {
        Self::authorize(caller, user_id)?;

        let now = unix_timestamp_now();
        let written = self
            .write_record(user_id, |existing| {
                let mut record =
                    existing.unwrap_or_else(|| PreferenceRecord::defaults(user_id.clone()));
                if !apply_frontend_update(&mut record, key, value) {
                    return None;
                }
                record.last_modified = Some(now);
                Some(record)
            })
            .await;

        Ok(match written {
            Ok(Some(_)) => SaveOutcome::saved(),
            Ok(None) => SaveOutcome::failed(format!("Unknown preference: {key}")),
            Err(error) => {
                tracing::error!(%error, "Failed to store preference update");
                SaveOutcome::failed(SaveOutcome::FAILED)
            }
        })
    }

    /// Erase one user's preferences (the user themself or a privacy manager).
    pub async fn delete_preferences(&self, caller: &Caller, user_id: &UserId) -> Result<bool> {
        Self::authorize_erase(caller, user_id)?;

        let db = self.db.lock().await;
        let repo = LibSqlPreferenceRepository::new(db.connection());
        let removed = repo.delete(user_id).await?;
        tracing::info!(removed, "Erased stored preferences for one user");
        Ok(removed)
    }

    /// Erase the preferences of several users.
    pub async fn delete_preferences_for_users(
        &self,
        caller: &Caller,
        user_ids: &[UserId],
    ) -> Result<u64> {
        Self::require_privacy_manager(caller)?;

        let db = self.db.lock().await;
        let repo = LibSqlPreferenceRepository::new(db.connection());
        let removed = repo.delete_many(user_ids).await?;
        tracing::info!(removed, requested = user_ids.len(), "Erased stored preferences");
        Ok(removed)
    }

    /// Erase every stored preference record.
    pub async fn delete_all_preferences(&self, caller: &Caller) -> Result<u64> {
        Self::require_privacy_manager(caller)?;

        let db = self.db.lock().await;
        let repo = LibSqlPreferenceRepository::new(db.connection());
        let removed = repo.delete_all().await?;
        tracing::warn!(removed, "Erased all stored preferences");
        Ok(removed)
    }

    /// Users that currently have a stored record.
    pub async fn users_with_preferences(&self) -> Result<Vec<UserId>> {
        let db = self.db.lock().await;
        let repo = LibSqlPreferenceRepository::new(db.connection());
        repo.list_user_ids().await
    }

    /// Everything stored for a user, or `None` when there is no record.
    pub async fn export_user_data(&self, user_id: &UserId) -> Result<Option<PrivacyExport>> {
        let record = self.fetch_record(user_id).await?;
        Ok(record.map(|record| PrivacyExport::from_record(&record, unix_timestamp_now())))
    }

    /// Check that `caller` may change the preferences stored for `user_id`.
    pub fn authorize(caller: &Caller, user_id: &UserId) -> std::result::Result<(), AccessDenied> {
        if caller.can_edit(user_id) {
            Ok(())
        } else {
            tracing::warn!("Denied preference change for another user");
            Err(AccessDenied {
                caller: caller.user_id.clone(),
                target: user_id.clone(),
            })
        }
    }

    /// Check that `caller` may erase `user_id`'s record: the user themself or a privacy manager.
    pub fn authorize_erase(
        caller: &Caller,
        user_id: &UserId,
    ) -> std::result::Result<(), AccessDenied> {
        if caller.user_id == *user_id || caller.has(Capability::ManagePrivacy) {
            Ok(())
        } else {
            Err(AccessDenied {
                caller: caller.user_id.clone(),
                target: user_id.clone(),
            })
        }
    }

    fn require_privacy_manager(caller: &Caller) -> Result<()> {
        if caller.has(Capability::ManagePrivacy) {
            Ok(())
        } else {
            Err(Error::PermissionDenied(format!(
                "{} requires {}",
                caller.user_id,
                Capability::ManagePrivacy.as_str()
            )))
        }
    }

    async fn save_update(&self, user_id: &UserId, update: &PreferenceUpdate) -> SaveOutcome {
        let now = unix_timestamp_now();
        let written = self
            .write_record(user_id, |existing| {
                Some(to_storage_shape(user_id, update, existing.as_ref(), now))
            })
            .await;

        match written {
            Ok(_) => SaveOutcome::saved(),
            Err(error) => {
                tracing::error!(%error, "Failed to store preferences");
                SaveOutcome::failed(SaveOutcome::FAILED)
            }
        }
    }

    /// Read-modify-write under the database lock. `change` returning `None` skips the write.
    async fn write_record<F>(&self, user_id: &UserId, change: F) -> Result<Option<PreferenceRecord>>
    where
        F: FnOnce(Option<PreferenceRecord>) -> Option<PreferenceRecord>,
    {
        let db = self.db.lock().await;
        let repo = LibSqlPreferenceRepository::new(db.connection());

        let existing = repo
            .find(user_id)
            .await?
            .map(|row| to_record(user_id.clone(), &row));
        let Some(record) = change(existing) else {
            return Ok(None);
        };

        repo.upsert(user_id, &to_row(&record)).await?;
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColorblindMode, ContrastMode};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn user(id: &str) -> UserId {
        id.parse().unwrap()
    }

    fn owner(id: &str) -> Caller {
        Caller::new(user(id), [Capability::EditOwnProfile])
    }

    fn admin() -> Caller {
        Caller::new(user("admin"), [Capability::ManagePrivacy])
    }

    fn prefs(fontsize: i64, contrast: ContrastMode) -> ClientPrefs {
        ClientPrefs {
            fontsize,
            contrast,
            ..ClientPrefs::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_without_record_returns_defaults() {
        let service = PreferenceService::open_in_memory().await.unwrap();

        assert_eq!(
            service.fetch_preferences(&user("1")).await,
            ClientPrefs::default()
        );
        assert!(service.fetch_record(&user("1")).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn save_then_fetch_returns_saved_values() {
        let service = PreferenceService::open_in_memory().await.unwrap();
        let saved = ClientPrefs {
            fontsize: 150,
            contrast: ContrastMode::Inverted,
            readablefonts: true,
            linespacing: 200,
            speech: true,
            texthelper: true,
            colorblind: ColorblindMode::Protanopia,
        };

        let outcome = service
            .save_preferences(&owner("1"), &user("1"), &saved)
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::saved());
        assert_eq!(service.fetch_preferences(&user("1")).await, saved);

        let record = service.fetch_record(&user("1")).await.unwrap().unwrap();
        assert!(record.last_modified.is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn save_for_other_user_is_denied_without_write() {
        let service = PreferenceService::open_in_memory().await.unwrap();

        let denied = service
            .save_preferences(&owner("1"), &user("2"), &prefs(120, ContrastMode::High))
            .await
            .unwrap_err();
        assert_eq!(denied.target, user("2"));

        let no_capability = Caller::new(user("3"), []);
        assert!(service
            .save_preferences(&no_capability, &user("3"), &ClientPrefs::default())
            .await
            .is_err());

        assert!(service.users_with_preferences().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn privacy_manager_may_save_for_others() {
        let service = PreferenceService::open_in_memory().await.unwrap();

        let outcome = service
            .save_preferences(&admin(), &user("2"), &prefs(120, ContrastMode::High))
            .await
            .unwrap();
        assert!(outcome.success);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invalid_values_report_failure_without_write() {
        let service = PreferenceService::open_in_memory().await.unwrap();

        let outcome = service
            .save_preferences(&owner("1"), &user("1"), &prefs(0, ContrastMode::Normal))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(service.fetch_record(&user("1")).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rapid_saves_leave_one_record_with_later_values() {
        let service = PreferenceService::open_in_memory().await.unwrap();
        let caller = owner("1");

        service
            .save_preferences(&caller, &user("1"), &prefs(110, ContrastMode::High))
            .await
            .unwrap();
        service
            .save_preferences(&caller, &user("1"), &prefs(130, ContrastMode::Normal))
            .await
            .unwrap();

        assert_eq!(service.users_with_preferences().await.unwrap(), vec![user("1")]);
        assert_eq!(
            service.fetch_preferences(&user("1")).await,
            prefs(130, ContrastMode::Normal)
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_saves_keep_a_single_record() {
        let service = PreferenceService::open_in_memory().await.unwrap();
        let caller = owner("1");
        let first = prefs(110, ContrastMode::High);
        let second = prefs(130, ContrastMode::Inverted);

        let target = user("1");
        let other = service.clone();
        let (a, b) = tokio::join!(
            service.save_preferences(&caller, &target, &first),
            other.save_preferences(&caller, &target, &second),
        );
        assert!(a.unwrap().success && b.unwrap().success);

        assert_eq!(service.users_with_preferences().await.unwrap().len(), 1);
        let stored = service.fetch_preferences(&user("1")).await;
        assert!(stored == first || stored == second);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn save_keeps_extended_fields() {
        let service = PreferenceService::open_in_memory().await.unwrap();
        let caller = owner("1");

        service
            .update_preference(&caller, &user("1"), "customCursor", &json!(true))
            .await
            .unwrap();
        service
            .save_preferences(&caller, &user("1"), &prefs(140, ContrastMode::Normal))
            .await
            .unwrap();

        let frontend = service.fetch_frontend_preferences(&user("1")).await;
        assert!(frontend.extended.custom_cursor);
        assert_eq!(frontend.font_size, 140);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_preference_with_unknown_key_writes_nothing() {
        let service = PreferenceService::open_in_memory().await.unwrap();

        let outcome = service
            .update_preference(&owner("1"), &user("1"), "ocrLanguage", &json!("pt"))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(service.fetch_record(&user("1")).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn partial_update_preserves_other_fields() {
        let service = PreferenceService::open_in_memory().await.unwrap();
        let caller = owner("1");
        service
            .save_preferences(&caller, &user("1"), &prefs(150, ContrastMode::High))
            .await
            .unwrap();

        let update = PreferenceUpdate {
            speech: Some(true),
            ..PreferenceUpdate::default()
        };
        service.apply_update(&caller, &user("1"), &update).await.unwrap();

        let stored = service.fetch_preferences(&user("1")).await;
        assert_eq!(stored.fontsize, 150);
        assert_eq!(stored.contrast, ContrastMode::High);
        assert!(stored.speech);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn privacy_operations_respect_capabilities() {
        let service = PreferenceService::open_in_memory().await.unwrap();
        for id in ["1", "2", "3"] {
            service
                .save_preferences(&owner(id), &user(id), &ClientPrefs::default())
                .await
                .unwrap();
        }

        assert!(matches!(
            service.delete_preferences(&owner("1"), &user("2")).await,
            Err(Error::PermissionDenied(_))
        ));
        assert!(service.delete_preferences(&owner("1"), &user("1")).await.unwrap());

        assert!(service
            .delete_preferences_for_users(&owner("2"), &[user("2")])
            .await
            .is_err());
        assert_eq!(
            service
                .delete_preferences_for_users(&admin(), &[user("2")])
                .await
                .unwrap(),
            1
        );

        assert!(service.delete_all_preferences(&owner("3")).await.is_err());
        assert_eq!(service.delete_all_preferences(&admin()).await.unwrap(), 1);
        assert!(service.users_with_preferences().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn export_user_data_only_for_stored_users() {
        let service = PreferenceService::open_in_memory().await.unwrap();
        assert!(service.export_user_data(&user("1")).await.unwrap().is_none());

        service
            .save_preferences(&owner("1"), &user("1"), &prefs(120, ContrastMode::High))
            .await
            .unwrap();
        let export = service.export_user_data(&user("1")).await.unwrap().unwrap();
        assert_eq!(export.user_id, "1");
        assert_eq!(export.preferences["contraste"], json!("alto"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn store_failures_fall_back_to_defaults_and_failed_outcome() {
        let db = Database::open_in_memory().await.unwrap();
        db.connection()
            .execute("DROP TABLE aguia_preferences", ())
            .await
            .unwrap();
        let service = PreferenceService::from_database(db);

        assert!(service.fetch_record(&user("1")).await.is_err());
        assert_eq!(
            service.fetch_preferences(&user("1")).await,
            ClientPrefs::default()
        );

        let outcome = service
            .save_preferences(&owner("1"), &user("1"), &prefs(130, ContrastMode::High))
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::failed(SaveOutcome::FAILED));
        assert!(!outcome.success);
    }
}
