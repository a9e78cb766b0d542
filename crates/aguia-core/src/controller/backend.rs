//! Where the controller loads and saves preferences.

use crate::error::Result;
use crate::models::{Caller, ClientPrefs, SaveOutcome};
use crate::service::PreferenceService;

/// Persistence seam of the client controller
///
/// Implemented in-process by [`LocalBackend`] and over HTTP by the CLI's remote client.
#[allow(async_fn_in_trait)]
pub trait PreferenceBackend {
    /// Preferences of the current user
    async fn load(&self) -> Result<ClientPrefs>;

    /// Store the full preference set of the current user
    async fn save(&self, prefs: &ClientPrefs) -> Result<SaveOutcome>;
}

/// Backend talking directly to a [`PreferenceService`] on behalf of one caller
#[derive(Clone)]
pub struct LocalBackend {
    service: PreferenceService,
    caller: Caller,
}

impl LocalBackend {
    pub const fn new(service: PreferenceService, caller: Caller) -> Self {
        Self { service, caller }
    }
}

impl PreferenceBackend for LocalBackend {
    async fn load(&self) -> Result<ClientPrefs> {
        Ok(self.service.fetch_preferences(&self.caller.user_id).await)
    }

    async fn save(&self, prefs: &ClientPrefs) -> Result<SaveOutcome> {
        let outcome = self
            .service
            .save_preferences(&self.caller, &self.caller.user_id, prefs)
            .await?;
        Ok(outcome)
    }
}
