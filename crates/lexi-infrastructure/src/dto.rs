//! Wire types for the backend's JSON API.
//!
//! These mirror the backend's field names and are converted into domain types
//! at the edge, so nothing outside this crate sees `app_user_id` or
//! `vocabulary_db_id`.

use lexi_core::oauth::ExchangeResult;
use lexi_core::query::{Phonetic, WordResult};
use lexi_core::save::WordEntry;
use lexi_core::session::{
    AccountProfile, AccountStatus, DatabaseChoice, LocalIdentity, ResourceBinding,
};
use serde::{Deserialize, Deserializer, Serialize};

/// Display name used when the provider does not report one.
pub const DEFAULT_USER_NAME: &str = "Notion User";

/// Error code the backend uses for an already-redeemed authorization code.
pub const CODE_ALREADY_USED: &str = "CODE_ALREADY_USED";

/// Keeps "field missing" and "field is null" apart: a missing field stays
/// `None` through `#[serde(default)]`, a present one becomes `Some(..)`.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn default_user_name() -> String {
    DEFAULT_USER_NAME.to_string()
}

fn profile_from(user_name: Option<String>, user_avatar: Option<String>) -> AccountProfile {
    AccountProfile {
        display_name: user_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(default_user_name),
        avatar_ref: user_avatar.filter(|avatar| !avatar.is_empty()),
    }
}

// ============================================================================
// Account status
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub linked: bool,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_avatar: Option<String>,
    #[serde(default)]
    pub notion_user_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub vocabulary_db_id: Option<Option<String>>,
}

impl From<StatusResponse> for AccountStatus {
    fn from(dto: StatusResponse) -> Self {
        let profile = dto
            .linked
            .then(|| profile_from(dto.user_name, dto.user_avatar));
        Self {
            linked: dto.linked,
            profile,
            external_account_id: dto.notion_user_id,
            resource: ResourceBinding::from_wire(dto.vocabulary_db_id),
        }
    }
}

// ============================================================================
// Token exchange
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ExchangeRequest<'a> {
    pub code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_user_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseDto {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

impl From<DatabaseDto> for DatabaseChoice {
    fn from(dto: DatabaseDto) -> Self {
        let title = if dto.title.trim().is_empty() {
            "Untitled".to_string()
        } else {
            dto.title
        };
        Self { id: dto.id, title }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExchangeResponse {
    pub app_user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_avatar: Option<String>,
    #[serde(default)]
    pub notion_user_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub vocabulary_db_id: Option<Option<String>>,
    #[serde(default)]
    pub accessible_databases: Vec<DatabaseDto>,
}

impl From<ExchangeResponse> for ExchangeResult {
    fn from(dto: ExchangeResponse) -> Self {
        Self {
            identity: LocalIdentity::new(dto.app_user_id),
            profile: profile_from(dto.user_name, dto.user_avatar),
            external_account_id: dto.notion_user_id,
            resource: ResourceBinding::from_wire(dto.vocabulary_db_id),
            selectable_resources: dto
                .accessible_databases
                .into_iter()
                .map(DatabaseChoice::from)
                .collect(),
        }
    }
}

// ============================================================================
// Resource binding
// ============================================================================

#[derive(Debug, Serialize)]
pub struct BindRequest<'a> {
    pub database_id: Option<&'a str>,
    pub app_user_id: &'a str,
}

// ============================================================================
// Lookup and correction
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DefineRequest<'a> {
    pub word: &'a str,
}

/// `examples` arrives either as a list or as a single string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Examples {
    List(Vec<String>),
    Single(String),
}

impl Examples {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::List(list) => list,
            Self::Single(text) if text.trim().is_empty() => Vec::new(),
            Self::Single(text) => vec![text],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PhoneticDto {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub audio: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DefineResponse {
    #[serde(default, alias = "definitions")]
    pub definition: Option<Vec<String>>,
    #[serde(default)]
    pub synonyms: Option<Vec<String>>,
    #[serde(default)]
    pub examples: Option<Examples>,
    #[serde(default)]
    pub phonetics: Option<Vec<PhoneticDto>>,
}

impl From<DefineResponse> for WordResult {
    fn from(dto: DefineResponse) -> Self {
        Self {
            definitions: dto.definition.unwrap_or_default(),
            synonyms: dto.synonyms.unwrap_or_default(),
            examples: dto.examples.map(Examples::into_vec).unwrap_or_default(),
            phonetics: dto
                .phonetics
                .unwrap_or_default()
                .into_iter()
                .map(|p| Phonetic {
                    text: p.text,
                    audio: p.audio,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CorrectRequest<'a> {
    pub sentence: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectResponse {
    #[serde(default)]
    pub corrected_text: Option<String>,
}

// ============================================================================
// Save
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SaveRequest<'a> {
    pub word: &'a str,
    pub definition: &'a str,
    pub synonyms: &'a str,
    pub app_user_id: &'a str,
    pub database_id: &'a str,
}

impl<'a> SaveRequest<'a> {
    pub fn new(identity: &'a LocalIdentity, resource_id: &'a str, entry: &'a WordEntry) -> Self {
        Self {
            word: &entry.word,
            definition: &entry.definition,
            synonyms: &entry.synonyms,
            app_user_id: identity.as_str(),
            database_id: resource_id,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error body shapes the backend produces. Every field is optional because
/// different endpoints (and proxies in front of them) disagree.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Whether the body carries the machine-readable used-code marker.
    pub fn has_code_already_used(&self) -> bool {
        self.code.as_deref() == Some(CODE_ALREADY_USED)
    }

    /// Whether the body's text says the authorization code was already
    /// redeemed, as the provider's own error description does.
    pub fn describes_code_already_used(&self) -> bool {
        [self.error_description.as_deref(), self.detail_text().as_deref()]
            .into_iter()
            .flatten()
            .any(|text| text.to_ascii_lowercase().contains("already been used"))
    }

    /// The most specific human-readable message in the body.
    pub fn message(&self) -> Option<String> {
        self.error_description
            .clone()
            .or_else(|| self.detail_text())
            .or_else(|| self.error.clone())
            .or_else(|| self.message.clone())
            .filter(|text| !text.trim().is_empty())
    }

    fn detail_text(&self) -> Option<String> {
        match &self.detail {
            Some(serde_json::Value::String(text)) => Some(text.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }
}
