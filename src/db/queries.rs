// Database query helpers for SurrealDB.
//
// Records are keyed by generated plain-string keys and every SELECT projects
// `record::id(id) AS id`, so rows deserialize with the bare key as their id.

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::auth::Role;
use crate::db::connection::Db;
use crate::db::schema::*;
use crate::types::{RecordKey, UserId};

/// Serialize `payload` and stamp it with creation/update times.
fn stamped<T: Serialize>(payload: &T) -> Result<Value> {
    let mut value = serde_json::to_value(payload)?;
    let now = Value::String(timestamp::format(&Utc::now()));
    let object = value
        .as_object_mut()
        .ok_or_else(|| anyhow!("record payload must serialize to an object"))?;
    object.insert("createdAt".to_string(), now.clone());
    object.insert("updatedAt".to_string(), now);
    Ok(value)
}

/// Serialize a partial update and stamp its update time.
fn stamped_patch<T: Serialize>(patch: &T) -> Result<Value> {
    let mut value = serde_json::to_value(patch)?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| anyhow!("record patch must serialize to an object"))?;
    object.insert(
        "updatedAt".to_string(),
        Value::String(timestamp::format(&Utc::now())),
    );
    Ok(value)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartDateRow {
    start_date: NaiveDate,
}

pub struct QueryBuilder;

impl QueryBuilder {
    async fn create<T: DeserializeOwned>(
        db: &Db,
        table: &'static str,
        key: String,
        content: Value,
    ) -> Result<T> {
        let mut res = db
            .query(
                r#"
                CREATE type::thing($tb, $id) CONTENT $content RETURN NONE;
                SELECT *, record::id(id) AS id FROM type::thing($tb, $id);
                "#,
            )
            .bind(("tb", table))
            .bind(("id", key))
            .bind(("content", content))
            .await?
            .check()?;

        let created: Option<T> = res.take(1)?;
        created.ok_or_else(|| anyhow!("failed to create {} record", table))
    }

    async fn find<T: DeserializeOwned>(db: &Db, table: &'static str, key: &str) -> Result<Option<T>> {
        let mut res = db
            .query("SELECT *, record::id(id) AS id FROM type::thing($tb, $id)")
            .bind(("tb", table))
            .bind(("id", key.to_string()))
            .await?;

        let found: Option<T> = res.take(0)?;
        Ok(found)
    }

    async fn patch<T: DeserializeOwned>(
        db: &Db,
        table: &'static str,
        key: &str,
        patch: Value,
    ) -> Result<Option<T>> {
        let mut res = db
            .query(
                r#"
                UPDATE type::thing($tb, $id) MERGE $patch RETURN NONE;
                SELECT *, record::id(id) AS id FROM type::thing($tb, $id);
                "#,
            )
            .bind(("tb", table))
            .bind(("id", key.to_string()))
            .bind(("patch", patch))
            .await?
            .check()?;

        let updated: Option<T> = res.take(1)?;
        Ok(updated)
    }

    async fn delete(db: &Db, table: &'static str, key: &str) -> Result<()> {
        db.query("DELETE type::thing($tb, $id)")
            .bind(("tb", table))
            .bind(("id", key.to_string()))
            .await?
            .check()?;
        Ok(())
    }

    // ----- users -----

    pub async fn create_user(db: &Db, data: &UserCreate) -> Result<UserRecord> {
        Self::create(db, USER_TABLE, UserId::generate().into_inner(), stamped(data)?).await
    }

    pub async fn find_user_by_id(db: &Db, user_id: &UserId) -> Result<Option<UserRecord>> {
        Self::find(db, USER_TABLE, user_id.as_str()).await
    }

    pub async fn find_user_by_email(db: &Db, email: &str) -> Result<Option<UserRecord>> {
        let mut res = db
            .query(
                r#"
                SELECT *, record::id(id) AS id FROM user
                WHERE email = $email
                LIMIT 1
                "#,
            )
            .bind(("email", email.to_string()))
            .await?;

        let user: Option<UserRecord> = res.take(0)?;
        Ok(user)
    }

    /// Update the display name. `None` leaves it unchanged.
    pub async fn update_user_name(
        db: &Db,
        user_id: &UserId,
        name: Option<String>,
    ) -> Result<Option<UserRecord>> {
        let mut patch = serde_json::Map::new();
        if let Some(name) = name {
            patch.insert("name".to_string(), Value::String(name));
        }
        Self::patch(db, USER_TABLE, user_id.as_str(), stamped_patch(&patch)?).await
    }

    pub async fn set_user_role(db: &Db, user_id: &UserId, role: Role) -> Result<Option<UserRecord>> {
        let patch = serde_json::json!({ "role": role });
        Self::patch(db, USER_TABLE, user_id.as_str(), stamped_patch(&patch)?).await
    }

    // ----- period logs -----

    pub async fn create_period_log(db: &Db, data: &PeriodLogCreate) -> Result<PeriodLogRecord> {
        Self::create(db, PERIOD_LOG_TABLE, RecordKey::generate().into_inner(), stamped(data)?).await
    }

    pub async fn find_period_log(db: &Db, log_id: &str) -> Result<Option<PeriodLogRecord>> {
        Self::find(db, PERIOD_LOG_TABLE, log_id).await
    }

    /// All logs of a user, most recent start first.
    pub async fn list_period_logs(db: &Db, user_id: &UserId) -> Result<Vec<PeriodLogRecord>> {
        let mut res = db
            .query(
                r#"
                SELECT *, record::id(id) AS id FROM period_log
                WHERE userId = $user_id
                ORDER BY startDate DESC
                "#,
            )
            .bind(("user_id", user_id.to_string()))
            .await?;

        let logs: Vec<PeriodLogRecord> = res.take(0)?;
        Ok(logs)
    }

    /// Start dates of a user's logs in ascending order, as fed to the
    /// cycle predictor.
    pub async fn list_period_start_dates(db: &Db, user_id: &UserId) -> Result<Vec<NaiveDate>> {
        let mut res = db
            .query(
                r#"
                SELECT startDate FROM period_log
                WHERE userId = $user_id
                ORDER BY startDate ASC
                "#,
            )
            .bind(("user_id", user_id.to_string()))
            .await?;

        let rows: Vec<StartDateRow> = res.take(0)?;
        Ok(rows.into_iter().map(|row| row.start_date).collect())
    }

    pub async fn update_period_log(
        db: &Db,
        log_id: &str,
        patch: &PeriodLogPatch,
    ) -> Result<Option<PeriodLogRecord>> {
        Self::patch(db, PERIOD_LOG_TABLE, log_id, stamped_patch(patch)?).await
    }

    pub async fn delete_period_log(db: &Db, log_id: &str) -> Result<()> {
        Self::delete(db, PERIOD_LOG_TABLE, log_id).await
    }

    // ----- reminders -----

    pub async fn create_reminder(db: &Db, data: &ReminderCreate) -> Result<ReminderRecord> {
        Self::create(db, REMINDER_TABLE, RecordKey::generate().into_inner(), stamped(data)?).await
    }

    pub async fn find_reminder(db: &Db, reminder_id: &str) -> Result<Option<ReminderRecord>> {
        Self::find(db, REMINDER_TABLE, reminder_id).await
    }

    /// All reminders of a user, soonest first.
    pub async fn list_reminders(db: &Db, user_id: &UserId) -> Result<Vec<ReminderRecord>> {
        let mut res = db
            .query(
                r#"
                SELECT *, record::id(id) AS id FROM reminder
                WHERE userId = $user_id
                ORDER BY remindAt ASC
                "#,
            )
            .bind(("user_id", user_id.to_string()))
            .await?;

        let reminders: Vec<ReminderRecord> = res.take(0)?;
        Ok(reminders)
    }

    pub async fn update_reminder(
        db: &Db,
        reminder_id: &str,
        patch: &ReminderPatch,
    ) -> Result<Option<ReminderRecord>> {
        Self::patch(db, REMINDER_TABLE, reminder_id, stamped_patch(patch)?).await
    }

    pub async fn delete_reminder(db: &Db, reminder_id: &str) -> Result<()> {
        Self::delete(db, REMINDER_TABLE, reminder_id).await
    }

    // ----- health & wellness -----

    pub async fn create_article(db: &Db, data: &ArticleCreate) -> Result<ArticleRecord> {
        Self::create(db, ARTICLE_TABLE, RecordKey::generate().into_inner(), stamped(data)?).await
    }

    pub async fn find_article(db: &Db, article_id: &str) -> Result<Option<ArticleRecord>> {
        Self::find(db, ARTICLE_TABLE, article_id).await
    }

    /// Published articles, newest first.
    pub async fn list_published_articles(db: &Db) -> Result<Vec<ArticleRecord>> {
        let mut res = db
            .query(
                r#"
                SELECT *, record::id(id) AS id FROM article
                WHERE isPublished = true
                ORDER BY createdAt DESC
                "#,
            )
            .await?;

        let articles: Vec<ArticleRecord> = res.take(0)?;
        Ok(articles)
    }

    pub async fn create_tip(db: &Db, data: &TipCreate) -> Result<TipRecord> {
        Self::create(db, TIP_TABLE, RecordKey::generate().into_inner(), stamped(data)?).await
    }

    pub async fn list_tips(db: &Db) -> Result<Vec<TipRecord>> {
        let mut res = db
            .query("SELECT *, record::id(id) AS id FROM tip ORDER BY createdAt DESC")
            .await?;

        let tips: Vec<TipRecord> = res.take(0)?;
        Ok(tips)
    }

    pub async fn create_resource(db: &Db, data: &ResourceCreate) -> Result<ResourceRecord> {
        Self::create(db, RESOURCE_TABLE, RecordKey::generate().into_inner(), stamped(data)?).await
    }

    pub async fn list_resources(db: &Db) -> Result<Vec<ResourceRecord>> {
        let mut res = db
            .query("SELECT *, record::id(id) AS id FROM wellness_resource ORDER BY createdAt DESC")
            .await?;

        let resources: Vec<ResourceRecord> = res.take(0)?;
        Ok(resources)
    }

    // ----- community -----

    pub async fn create_post(db: &Db, data: &CommunityPostCreate) -> Result<CommunityPostRecord> {
        Self::create(db, POST_TABLE, RecordKey::generate().into_inner(), stamped(data)?).await
    }

    pub async fn find_post(db: &Db, post_id: &str) -> Result<Option<CommunityPostRecord>> {
        Self::find(db, POST_TABLE, post_id).await
    }

    /// Posts newest first, each with its comments oldest first.
    pub async fn list_posts_with_comments(db: &Db) -> Result<Vec<PostWithComments>> {
        let mut res = db
            .query("SELECT *, record::id(id) AS id FROM community_post ORDER BY createdAt DESC")
            .await?;
        let posts: Vec<CommunityPostRecord> = res.take(0)?;

        let post_ids: Vec<String> = posts.iter().map(|p| p.id.to_string()).collect();
        let mut by_post: HashMap<RecordKey, Vec<CommentRecord>> = HashMap::new();
        for comment in Self::list_comments_for(db, post_ids).await? {
            by_post.entry(comment.post_id.clone()).or_default().push(comment);
        }

        Ok(posts
            .into_iter()
            .map(|post| {
                let comments = by_post.remove(&post.id).unwrap_or_default();
                PostWithComments { post, comments }
            })
            .collect())
    }

    pub async fn find_post_with_comments(db: &Db, post_id: &str) -> Result<Option<PostWithComments>> {
        let Some(post) = Self::find_post(db, post_id).await? else {
            return Ok(None);
        };
        let comments = Self::list_comments_for(db, vec![post.id.to_string()]).await?;
        Ok(Some(PostWithComments { post, comments }))
    }

    async fn list_comments_for(db: &Db, post_ids: Vec<String>) -> Result<Vec<CommentRecord>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut res = db
            .query(
                r#"
                SELECT *, record::id(id) AS id FROM post_comment
                WHERE postId IN $post_ids
                ORDER BY createdAt ASC
                "#,
            )
            .bind(("post_ids", post_ids))
            .await?;

        let comments: Vec<CommentRecord> = res.take(0)?;
        Ok(comments)
    }

    pub async fn create_comment(db: &Db, data: &CommentCreate) -> Result<CommentRecord> {
        Self::create(db, COMMENT_TABLE, RecordKey::generate().into_inner(), stamped(data)?).await
    }

    /// Delete a post and every comment on it.
    pub async fn delete_post(db: &Db, post_id: &str) -> Result<()> {
        db.query(
            r#"
            BEGIN TRANSACTION;
            DELETE post_comment WHERE postId = $id;
            DELETE type::thing('community_post', $id);
            COMMIT TRANSACTION;
            "#,
        )
        .bind(("id", post_id.to_string()))
        .await?
        .check()?;
        Ok(())
    }
}
