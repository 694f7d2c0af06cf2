use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::{pg::PgConnection, prelude::*, select};
use thiserror::Error;
use tokio::task;

use crate::db::PgPool;
use crate::models::{EmailTemplate, NewEmailTemplate, TemplateFields};
use crate::schema::email_templates;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("database pool error: {0}")]
    Pool(String),
    #[error("store task failed: {0}")]
    Task(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// `update` never touches `created_at`.
#[async_trait]
pub trait TemplateStore: Send + Sync + 'static {
    async fn list_newest_first(&self) -> StoreResult<Vec<EmailTemplate>>;

    async fn search_by_title(&self, query: &str) -> StoreResult<Vec<EmailTemplate>>;

    async fn find(&self, id: i64) -> StoreResult<Option<EmailTemplate>>;

    async fn exists(&self, id: i64) -> StoreResult<bool>;

    async fn insert(&self, template: NewEmailTemplate) -> StoreResult<EmailTemplate>;

    async fn update(&self, id: i64, fields: TemplateFields) -> StoreResult<Option<EmailTemplate>>;

    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

pub struct PgTemplateStore {
    pool: PgPool,
}

impl PgTemplateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run<F, T>(&self, query: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| StoreError::Pool(err.to_string()))?;
            query(&mut conn).map_err(StoreError::from)
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?
    }
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    async fn list_newest_first(&self) -> StoreResult<Vec<EmailTemplate>> {
        self.run(|conn| {
            email_templates::table
                .order((
                    email_templates::created_at.desc(),
                    email_templates::id.desc(),
                ))
                .load(conn)
        })
        .await
    }

    async fn search_by_title(&self, query: &str) -> StoreResult<Vec<EmailTemplate>> {
        let pattern = contains_pattern(query);
        self.run(move |conn| {
            email_templates::table
                .filter(email_templates::title.ilike(pattern))
                .order((
                    email_templates::created_at.desc(),
                    email_templates::id.desc(),
                ))
                .load(conn)
        })
        .await
    }

    async fn find(&self, id: i64) -> StoreResult<Option<EmailTemplate>> {
        self.run(move |conn| email_templates::table.find(id).first(conn).optional())
            .await
    }

    async fn exists(&self, id: i64) -> StoreResult<bool> {
        self.run(move |conn| select(exists(email_templates::table.find(id))).get_result(conn))
            .await
    }

    async fn insert(&self, template: NewEmailTemplate) -> StoreResult<EmailTemplate> {
        self.run(move |conn| {
            diesel::insert_into(email_templates::table)
                .values(&template)
                .get_result(conn)
        })
        .await
    }

    async fn update(&self, id: i64, fields: TemplateFields) -> StoreResult<Option<EmailTemplate>> {
        self.run(move |conn| {
            diesel::update(email_templates::table.find(id))
                .set(&fields)
                .get_result(conn)
                .optional()
        })
        .await
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let deleted = self
            .run(move |conn| diesel::delete(email_templates::table.find(id)).execute(conn))
            .await?;
        Ok(deleted > 0)
    }
}

fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
