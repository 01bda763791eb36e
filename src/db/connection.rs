use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;

pub type Db = Surreal<Any>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: env::var("SAKHI_DB_URL").unwrap_or_else(|_| "memory".to_string()),
            namespace: env::var("SAKHI_DB_NAMESPACE").unwrap_or_else(|_| "sakhi".to_string()),
            database: env::var("SAKHI_DB_DATABASE").unwrap_or_else(|_| "api".to_string()),
            username: env::var("SAKHI_DB_USERNAME").ok(),
            password: env::var("SAKHI_DB_PASSWORD").ok(),
        }
    }
}

impl DatabaseConfig {
    /// Config for a throwaway in-memory database.
    pub fn memory() -> Self {
        Self {
            url: "memory".to_string(),
            namespace: "sakhi".to_string(),
            database: "api".to_string(),
            username: None,
            password: None,
        }
    }
}

pub async fn create_connection(config: DatabaseConfig) -> Result<Db> {
    let db = surrealdb::engine::any::connect(config.url).await?;

    // Sign in if credentials are provided
    if let (Some(username), Some(password)) = (config.username, config.password) {
        db.signin(Root {
            username: &username,
            password: &password,
        })
        .await?;
    }

    db.use_ns(config.namespace).use_db(config.database).await?;

    Ok(db)
}

/// Define tables and indexes. Safe to run against an existing database.
pub async fn ensure_schema(db: &Db) -> Result<()> {
    let schema_queries = [
        "DEFINE TABLE IF NOT EXISTS user SCHEMALESS;
         DEFINE INDEX IF NOT EXISTS user_email ON TABLE user COLUMNS email UNIQUE;",
        "DEFINE TABLE IF NOT EXISTS period_log SCHEMALESS;
         DEFINE INDEX IF NOT EXISTS period_log_user ON TABLE period_log COLUMNS userId;",
        "DEFINE TABLE IF NOT EXISTS reminder SCHEMALESS;
         DEFINE INDEX IF NOT EXISTS reminder_user ON TABLE reminder COLUMNS userId;",
        "DEFINE TABLE IF NOT EXISTS article SCHEMALESS;
         DEFINE INDEX IF NOT EXISTS article_published ON TABLE article COLUMNS isPublished;",
        "DEFINE TABLE IF NOT EXISTS tip SCHEMALESS;",
        "DEFINE TABLE IF NOT EXISTS wellness_resource SCHEMALESS;",
        "DEFINE TABLE IF NOT EXISTS community_post SCHEMALESS;",
        "DEFINE TABLE IF NOT EXISTS post_comment SCHEMALESS;
         DEFINE INDEX IF NOT EXISTS post_comment_post ON TABLE post_comment COLUMNS postId;",
    ];

    for query in schema_queries {
        db.query(query).await?.check()?;
    }

    Ok(())
}
