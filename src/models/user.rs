use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(deserialize_with = "super::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub username: String,
}

impl UserProfile {
    /// Display name, else "first last", else username.
    pub fn label(&self) -> String {
        if let Some(d) = non_blank(self.display_name.as_deref()) {
            return d.to_string();
        }
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .filter_map(non_blank)
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            self.username.clone()
        } else {
            full
        }
    }
}

/// `/api/auth/me` answers with the user bare or wrapped in `user`/`data`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProfileEnvelope {
    User { user: UserProfile },
    Data { data: UserProfile },
    Bare(UserProfile),
}

impl ProfileEnvelope {
    pub fn into_profile(self) -> UserProfile {
        match self {
            ProfileEnvelope::User { user } => user,
            ProfileEnvelope::Data { data } => data,
            ProfileEnvelope::Bare(p) => p,
        }
    }
}

/// Editable name fields. Email and username are not editable here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
}

impl ProfileForm {
    pub fn from_profile(p: &UserProfile) -> Self {
        Self {
            first_name: p.first_name.clone().unwrap_or_default(),
            last_name: p.last_name.clone().unwrap_or_default(),
            display_name: p.display_name.clone().unwrap_or_default(),
        }
    }

    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            first_name: blank_to_none(&self.first_name),
            last_name: blank_to_none(&self.last_name),
            display_name: blank_to_none(&self.display_name),
        }
    }
}

/// Body of `PUT /api/v1/users/{id}`. Blank fields go out as JSON `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
}

/// Password form including the repeated entry, which never leaves the client.
#[derive(Default)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordForm {
    pub fn new(
        current_password: impl Into<String>,
        new_password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            current_password: current_password.into(),
            new_password: new_password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// Checks the form locally and builds the request body.
    pub fn validate(&self) -> Result<PasswordChange, String> {
        if self.current_password.is_empty()
            || self.new_password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err("All password fields are required".to_string());
        }
        if self.new_password != self.confirm_password {
            return Err("New passwords do not match".to_string());
        }
        Ok(PasswordChange {
            current_password: self.current_password.clone(),
            new_password: self.new_password.clone(),
        })
    }

    pub fn clear(&mut self) {
        self.current_password.zeroize();
        self.new_password.zeroize();
        self.confirm_password.zeroize();
    }
}

impl fmt::Debug for PasswordForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordForm").finish_non_exhaustive()
    }
}

impl Drop for PasswordForm {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Body of `POST /api/v1/change-password`.
#[derive(Serialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

impl fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordChange").finish_non_exhaustive()
    }
}

impl Drop for PasswordChange {
    fn drop(&mut self) {
        self.current_password.zeroize();
        self.new_password.zeroize();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestFrequency {
    Never,
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl DigestFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestFrequency::Never => "never",
            DigestFrequency::Daily => "daily",
            DigestFrequency::Weekly => "weekly",
            DigestFrequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for DigestFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "never" => Ok(DigestFrequency::Never),
            "daily" => Ok(DigestFrequency::Daily),
            "weekly" => Ok(DigestFrequency::Weekly),
            "monthly" => Ok(DigestFrequency::Monthly),
            other => Err(format!(
                "unknown digest frequency '{}', expected never, daily, weekly or monthly",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    #[serde(default = "default_true")]
    pub email_notifications: bool,
    #[serde(default = "default_true")]
    pub security_alerts: bool,
    #[serde(default)]
    pub workflow_updates: bool,
    #[serde(default)]
    pub digest_frequency: DigestFrequency,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            security_alerts: true,
            workflow_updates: false,
            digest_frequency: DigestFrequency::Weekly,
        }
    }
}

/// Partial preferences change; `None` keeps the stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreferencesPatch {
    pub email_notifications: Option<bool>,
    pub security_alerts: Option<bool>,
    pub workflow_updates: Option<bool>,
    pub digest_frequency: Option<DigestFrequency>,
}

impl PreferencesPatch {
    pub fn apply(&self, base: NotificationPreferences) -> NotificationPreferences {
        NotificationPreferences {
            email_notifications: self.email_notifications.unwrap_or(base.email_notifications),
            security_alerts: self.security_alerts.unwrap_or(base.security_alerts),
            workflow_updates: self.workflow_updates.unwrap_or(base.workflow_updates),
            digest_frequency: self.digest_frequency.unwrap_or(base.digest_frequency),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PreferencesEnvelope {
    Data { data: NotificationPreferences },
    Bare(NotificationPreferences),
}

impl PreferencesEnvelope {
    pub fn into_preferences(self) -> NotificationPreferences {
        match self {
            PreferencesEnvelope::Data { data } => data,
            PreferencesEnvelope::Bare(p) => p,
        }
    }
}

fn default_true() -> bool {
    true
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn blank_to_none(s: &str) -> Option<String> {
    non_blank(Some(s)).map(String::from)
}
