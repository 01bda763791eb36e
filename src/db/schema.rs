//! Persisted records and the payloads used to create or patch them.
//!
//! Field names are camelCase both in SurrealDB and on the wire, so records
//! for the free-text resources are returned to clients as stored. The one
//! exception is [`UserRecord`], which carries the password hash and is only
//! ever exposed through a profile view.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) and calendar dates as `YYYY-MM-DD`, so that
//! `ORDER BY` on the raw string is chronological.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{Owned, Role};
use crate::types::{RecordKey, UserId};

pub const USER_TABLE: &str = "user";
pub const PERIOD_LOG_TABLE: &str = "period_log";
pub const REMINDER_TABLE: &str = "reminder";
pub const ARTICLE_TABLE: &str = "article";
pub const TIP_TABLE: &str = "tip";
pub const RESOURCE_TABLE: &str = "wellness_resource";
pub const POST_TABLE: &str = "community_post";
pub const COMMENT_TABLE: &str = "post_comment";

/// Fixed-width timestamp encoding.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Persisted user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub name: Option<String>,
    pub role: Role,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Owned for UserRecord {
    fn owner_id(&self) -> &UserId {
        &self.id
    }
}

/// What clients see of a user account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserProfile {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreate {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub role: Role,
}

/// A single logged period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodLogRecord {
    pub id: RecordKey,
    pub user_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow_intensity: Option<String>,
    pub symptoms: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Owned for PeriodLogRecord {
    fn owner_id(&self) -> &UserId {
        &self.user_id
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodLogCreate {
    pub user_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow_intensity: Option<String>,
    pub symptoms: Option<String>,
    pub notes: Option<String>,
}

/// Partial update. Absent fields are left untouched. There is no owner field.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodLogPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_intensity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Kind of reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReminderType {
    Period,
    Medication,
    Appointment,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRecord {
    pub id: RecordKey,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "timestamp")]
    pub remind_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Owned for ReminderRecord {
    fn owner_id(&self) -> &UserId {
        &self.user_id
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderCreate {
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "timestamp")]
    pub remind_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub reminder_type: Option<ReminderType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_timestamp"
    )]
    pub remind_at: Option<DateTime<Utc>>,
}

fn serialize_opt_timestamp<S: serde::Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(dt) => timestamp::serialize(dt, serializer),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub id: RecordKey,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub is_published: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleCreate {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub is_published: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipRecord {
    pub id: RecordKey,
    pub content: String,
    pub category: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TipCreate {
    pub content: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub id: RecordKey,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCreate {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPostRecord {
    pub id: RecordKey,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Owned for CommunityPostRecord {
    fn owner_id(&self) -> &UserId {
        &self.user_id
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPostCreate {
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: RecordKey,
    pub post_id: RecordKey,
    pub user_id: UserId,
    pub content: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreate {
    pub post_id: RecordKey,
    pub user_id: UserId,
    pub content: String,
}

/// A post together with its comments, oldest comment first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithComments {
    #[serde(flatten)]
    pub post: CommunityPostRecord,
    pub comments: Vec<CommentRecord>,
}
