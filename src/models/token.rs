use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A credential tracked by the authorization backend: either an API key
/// (carries `key_id`) or an OAuth-issued token (carries `client_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(deserialize_with = "super::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub key_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub name: String,
    /// A `null` flag reads as inactive.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub last_used_at: Option<String>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenStatus {
    Active,
    Expired,
    Inactive,
}

impl TokenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Active => "Active",
            TokenStatus::Expired => "Expired",
            TokenStatus::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(TokenStatus::Active),
            "expired" => Ok(TokenStatus::Expired),
            "inactive" => Ok(TokenStatus::Inactive),
            other => Err(format!(
                "unknown status '{}', expected active, expired or inactive",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    ApiKey,
    OAuth,
    Unknown,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::ApiKey => "api_key",
            TokenKind::OAuth => "oauth",
            TokenKind::Unknown => "unknown",
        }
    }
}

impl TokenRecord {
    /// Status as of `now`. An inactive record is `Inactive` no matter what
    /// its expiry says; otherwise a past expiry makes it `Expired`.
    pub fn status_at(&self, now: DateTime<Utc>) -> TokenStatus {
        if !self.is_active {
            return TokenStatus::Inactive;
        }
        match self.expiry() {
            Some(exp) if exp < now => TokenStatus::Expired,
            _ => TokenStatus::Active,
        }
    }

    pub fn status(&self) -> TokenStatus {
        self.status_at(Utc::now())
    }

    pub fn kind(&self) -> TokenKind {
        if self.key_id.is_some() {
            TokenKind::ApiKey
        } else if self.client_id.is_some() {
            TokenKind::OAuth
        } else {
            TokenKind::Unknown
        }
    }

    /// Value sent as the `token` form field when revoking this record.
    pub fn revocation_id(&self) -> &str {
        self.key_id.as_deref().unwrap_or(&self.id)
    }

    /// Parsed expiry. Unparseable values count as "no expiry".
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expires_at.as_deref().and_then(parse_timestamp)
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    pub fn last_used(&self) -> Option<DateTime<Utc>> {
        self.last_used_at.as_deref().and_then(parse_timestamp)
    }

    /// Case-insensitive substring match over name, key id and client id.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            Some(self.name.as_str()),
            self.key_id.as_deref(),
            self.client_id.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Accepts RFC 3339, offsets without a colon (`+0000`), naive
/// `YYYY-MM-DDTHH:MM:SS[.f]` (taken as UTC) and bare `YYYY-MM-DD` dates
/// (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenList {
    #[serde(default)]
    pub tokens: Vec<TokenRecord>,
}

/// Aggregate counters recomputed by the backend on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStats {
    #[serde(default)]
    pub total_cached_tokens: u64,
    #[serde(default)]
    pub active_tokens: u64,
    #[serde(default)]
    pub api_key_count: u64,
    #[serde(default)]
    pub expired_tokens: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenStatsEnvelope {
    pub data: TokenStats,
}

/// Per-status tallies over a token snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub active: usize,
    pub expired: usize,
    pub inactive: usize,
}

impl StatusCounts {
    pub fn tally<'a>(tokens: impl IntoIterator<Item = &'a TokenRecord>, now: DateTime<Utc>) -> Self {
        tokens
            .into_iter()
            .fold(Self::default(), |mut acc, t| {
                match t.status_at(now) {
                    TokenStatus::Active => acc.active += 1,
                    TokenStatus::Expired => acc.expired += 1,
                    TokenStatus::Inactive => acc.inactive += 1,
                }
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(is_active: bool, expires_at: Option<&str>) -> TokenRecord {
        TokenRecord {
            id: "tok_1".into(),
            key_id: None,
            client_id: None,
            name: "ci-deploy".into(),
            is_active,
            created_at: Some("2019-06-01T00:00:00Z".into()),
            expires_at: expires_at.map(String::from),
            last_used_at: None,
            scopes: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_inactive_wins_over_expiry() {
        assert_eq!(record(false, None).status_at(now()), TokenStatus::Inactive);
        assert_eq!(
            record(false, Some("2020-01-01")).status_at(now()),
            TokenStatus::Inactive
        );
        assert_eq!(
            record(false, Some("2099-01-01T00:00:00Z")).status_at(now()),
            TokenStatus::Inactive
        );
    }

    #[test]
    fn test_past_expiry_is_expired() {
        let t = record(true, Some("2020-01-01"));
        assert_eq!(t.status_at(now()), TokenStatus::Expired);
        assert_eq!(t.status_at(now()).to_string(), "Expired");
        // Evaluated against the real clock too, which is well past 2020.
        assert_eq!(t.status(), TokenStatus::Expired);
    }

    #[test]
    fn test_no_or_future_expiry_is_active() {
        assert_eq!(record(true, None).status_at(now()), TokenStatus::Active);
        assert_eq!(
            record(true, Some("2030-01-01T00:00:00+02:00")).status_at(now()),
            TokenStatus::Active
        );
    }

    #[test]
    fn test_expiry_equal_to_now_is_still_active() {
        let t = record(true, Some("2024-03-15T12:00:00Z"));
        assert_eq!(t.status_at(now()), TokenStatus::Active);
    }

    #[test]
    fn test_unparseable_expiry_counts_as_none() {
        let t = record(true, Some("next tuesday"));
        assert!(t.expiry().is_none());
        assert_eq!(t.status_at(now()), TokenStatus::Active);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_timestamp("2024-01-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T05:04:05+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T03:04:05"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02 03:04:05.000"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-02"),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_parse_timestamp_colonless_offset() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_timestamp("2024-01-02T03:04:05+0000"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T05:04:05.000+0200"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02 03:04:05-0000"), Some(expected));

        let t = record(true, Some("2020-01-01T00:00:00+0000"));
        assert_eq!(t.status_at(now()), TokenStatus::Expired);
    }

    #[test]
    fn test_created_and_last_used_parse() {
        let mut t = record(true, None);
        assert_eq!(
            t.created(),
            Some(Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap())
        );
        assert!(t.last_used().is_none());
        t.last_used_at = Some("2024-03-01".into());
        assert_eq!(
            t.last_used(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_null_name_and_flag_do_not_drop_the_list() {
        let list: TokenList = serde_json::from_value(serde_json::json!({
            "tokens": [
                { "id": "1", "name": "CI deploy key", "is_active": true },
                { "id": "2", "name": null, "is_active": null, "expires_at": null }
            ]
        }))
        .unwrap();
        assert_eq!(list.tokens.len(), 2);
        assert_eq!(list.tokens[1].name, "");
        assert!(!list.tokens[1].is_active);
        assert_eq!(list.tokens[1].status_at(now()), TokenStatus::Inactive);
    }

    #[test]
    fn test_kind_and_revocation_id() {
        let mut t = record(true, None);
        assert_eq!(t.kind(), TokenKind::Unknown);
        assert_eq!(t.revocation_id(), "tok_1");

        t.client_id = Some("dashboard".into());
        assert_eq!(t.kind(), TokenKind::OAuth);
        assert_eq!(t.revocation_id(), "tok_1");

        t.key_id = Some("ak_live_42".into());
        assert_eq!(t.kind(), TokenKind::ApiKey);
        assert_eq!(t.revocation_id(), "ak_live_42");
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let mut t = record(true, None);
        t.client_id = Some("Billing-Service".into());
        assert!(t.matches("CI-DEP"));
        assert!(t.matches("billing"));
        assert!(t.matches("   "));
        assert!(!t.matches("nightly"));
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("Expired".parse::<TokenStatus>(), Ok(TokenStatus::Expired));
        assert!("revoked".parse::<TokenStatus>().is_err());
    }

    #[test]
    fn test_deserialize_minimal_record_and_stats() {
        let t: TokenRecord = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "name": "n",
            "is_active": true,
            "expires_at": null
        }))
        .unwrap();
        assert!(t.scopes.is_none());
        assert_eq!(t.status_at(now()), TokenStatus::Active);

        let stats: TokenStatsEnvelope = serde_json::from_value(serde_json::json!({
            "data": { "total_cached_tokens": 7, "active_tokens": 5 }
        }))
        .unwrap();
        assert_eq!(stats.data.total_cached_tokens, 7);
        assert_eq!(stats.data.expired_tokens, 0);
    }

    #[test]
    fn test_status_counts() {
        let tokens = vec![
            record(true, None),
            record(true, Some("2020-01-01")),
            record(false, None),
            record(true, Some("2030-01-01")),
        ];
        let counts = StatusCounts::tally(&tokens, now());
        assert_eq!(
            counts,
            StatusCounts {
                active: 2,
                expired: 1,
                inactive: 1
            }
        );
    }
}
