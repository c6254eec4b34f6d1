//! Profile page view-model: the signed-in user's profile, name editing,
//! password change and notification preferences.

use crate::client::AuthClient;
use crate::errors::ClientError;
use crate::models::user::{
    NotificationPreferences, PasswordForm, PreferencesPatch, ProfileForm, UserProfile,
};
use crate::notice::{Notice, NoticeBoard};

pub const MSG_LOAD_PROFILE_FAILED: &str = "Failed to load profile";
pub const MSG_PROFILE_NOT_LOADED: &str = "Profile is not loaded";
pub const MSG_PROFILE_UPDATED: &str = "Profile updated successfully";
pub const MSG_PROFILE_UPDATE_FAILED: &str = "Failed to update profile";
pub const MSG_PASSWORD_CHANGED: &str = "Password changed successfully";
pub const MSG_PASSWORD_CHANGE_FAILED: &str = "Failed to change password";
pub const MSG_LOAD_PREFERENCES_FAILED: &str = "Failed to load preferences";
pub const MSG_PREFERENCES_UPDATED: &str = "Preferences updated";
pub const MSG_PREFERENCES_UPDATE_FAILED: &str = "Failed to update preferences";

pub struct ProfilePage {
    client: AuthClient,
    profile: Option<UserProfile>,
    preferences: NotificationPreferences,
    /// Present while the name fields are being edited.
    edit: Option<ProfileForm>,
    notices: NoticeBoard,
}

impl ProfilePage {
    pub fn new(client: AuthClient, notices: NoticeBoard) -> Self {
        Self {
            client,
            profile: None,
            preferences: NotificationPreferences::default(),
            edit: None,
            notices,
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn preferences(&self) -> &NotificationPreferences {
        &self.preferences
    }

    pub fn edit_form(&self) -> Option<&ProfileForm> {
        self.edit.as_ref()
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notices.current()
    }

    /// Loads the profile and the notification preferences.
    pub async fn load(&mut self) {
        self.load_profile().await;
        self.load_preferences().await;
    }

    /// Fetches the stored preferences. On failure the previous values stay in
    /// place and an error notice is posted, since they may not match the backend.
    pub async fn load_preferences(&mut self) -> bool {
        match self.client.fetch_preferences().await {
            Ok(prefs) => {
                self.preferences = prefs;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load preferences");
                self.notices.error(MSG_LOAD_PREFERENCES_FAILED);
                false
            }
        }
    }

    pub async fn load_profile(&mut self) -> bool {
        match self.client.fetch_profile().await {
            Ok(profile) => {
                tracing::debug!(user_id = %profile.id, "loaded profile");
                self.profile = Some(profile);
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load profile");
                self.notices.error(MSG_LOAD_PROFILE_FAILED);
                false
            }
        }
    }

    pub fn begin_edit(&mut self) -> Option<&mut ProfileForm> {
        let form = ProfileForm::from_profile(self.profile.as_ref()?);
        self.edit = Some(form);
        self.edit.as_mut()
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    /// Saves the edit form if one is open.
    pub async fn save_edit(&mut self) {
        if let Some(form) = self.edit.clone() {
            self.save_profile(&form).await;
        }
    }

    /// Sends the name fields, then re-fetches the profile so the page shows
    /// what the backend stored.
    pub async fn save_profile(&mut self, form: &ProfileForm) {
        let Some(user_id) = self.profile.as_ref().map(|p| p.id.clone()) else {
            self.notices.error(MSG_PROFILE_NOT_LOADED);
            return;
        };

        match self.client.update_profile(&user_id, &form.to_update()).await {
            Ok(()) => {
                tracing::info!(user_id = %user_id, "profile updated");
                self.edit = None;
                self.notices.success(MSG_PROFILE_UPDATED);
                self.load_profile().await;
            }
            Err(e) => self.report(&e, MSG_PROFILE_UPDATE_FAILED, "profile update failed"),
        }
    }

    /// Validates locally first; a mismatch or empty field never reaches the
    /// backend. The form is cleared after a successful change.
    pub async fn change_password(&mut self, form: &mut PasswordForm) {
        let change = match form.validate() {
            Ok(change) => change,
            Err(msg) => {
                self.notices.error(msg);
                return;
            }
        };

        match self.client.change_password(&change).await {
            Ok(()) => {
                tracing::info!("password changed");
                form.clear();
                self.notices.success(MSG_PASSWORD_CHANGED);
            }
            Err(e) => self.report(&e, MSG_PASSWORD_CHANGE_FAILED, "password change failed"),
        }
    }

    pub async fn update_preferences(&mut self, prefs: NotificationPreferences) {
        match self.client.update_preferences(&prefs).await {
            Ok(()) => {
                tracing::info!(digest = %prefs.digest_frequency, "preferences updated");
                self.preferences = prefs;
                self.notices.success(MSG_PREFERENCES_UPDATED);
            }
            Err(e) => {
                tracing::error!(error = %e, "preferences update failed");
                self.notices.error(MSG_PREFERENCES_UPDATE_FAILED);
            }
        }
    }

    /// Re-reads the stored preferences and sends them back with `patch`
    /// applied. Nothing is sent if the read fails, so unknown values are never
    /// overwritten with defaults.
    pub async fn patch_preferences(&mut self, patch: PreferencesPatch) {
        if !self.load_preferences().await {
            return;
        }
        let prefs = patch.apply(self.preferences);
        self.update_preferences(prefs).await;
    }

    fn report(&mut self, err: &ClientError, fallback: &str, what: &str) {
        tracing::error!(error = %err, "{}", what);
        self.notices.error(err.user_message(fallback));
    }
}
