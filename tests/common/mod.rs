use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use email_builder::config::AppConfig;
use email_builder::db;
use email_builder::models::{EmailTemplate, NewEmailTemplate, TemplateFields};
use email_builder::routes;
use email_builder::state::AppState;
use email_builder::store::{StoreError, StoreResult, TemplateStore};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

#[derive(Default)]
struct FakeRows {
    next_id: i64,
    rows: Vec<EmailTemplate>,
}

#[derive(Default)]
pub struct FakeTemplateStore {
    inner: Mutex<FakeRows>,
    fail_writes: AtomicBool,
}

impl FakeTemplateStore {
    #[allow(dead_code)]
    pub async fn count(&self) -> usize {
        self.inner.lock().await.rows.len()
    }

    #[allow(dead_code)]
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Pool("simulated database outage".to_string()));
        }
        Ok(())
    }
}

fn newest_first(mut rows: Vec<EmailTemplate>) -> Vec<EmailTemplate> {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    rows
}

#[async_trait]
impl TemplateStore for FakeTemplateStore {
    async fn list_newest_first(&self) -> StoreResult<Vec<EmailTemplate>> {
        let guard = self.inner.lock().await;
        Ok(newest_first(guard.rows.clone()))
    }

    async fn search_by_title(&self, query: &str) -> StoreResult<Vec<EmailTemplate>> {
        let needle = query.to_lowercase();
        let guard = self.inner.lock().await;
        let matches = guard
            .rows
            .iter()
            .filter(|row| row.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(newest_first(matches))
    }

    async fn find(&self, id: i64) -> StoreResult<Option<EmailTemplate>> {
        let guard = self.inner.lock().await;
        Ok(guard.rows.iter().find(|row| row.id == id).cloned())
    }

    async fn exists(&self, id: i64) -> StoreResult<bool> {
        let guard = self.inner.lock().await;
        Ok(guard.rows.iter().any(|row| row.id == id))
    }

    async fn insert(&self, template: NewEmailTemplate) -> StoreResult<EmailTemplate> {
        self.check_writable()?;
        let mut guard = self.inner.lock().await;
        guard.next_id += 1;
        let fields = template.fields;
        let stored = EmailTemplate {
            id: guard.next_id,
            title: fields.title,
            content: fields.content,
            footer: fields.footer,
            image_url: fields.image_url,
            image_data: fields.image_data,
            is_image_only: fields.is_image_only,
            created_at: template.created_at,
        };
        guard.rows.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: i64, fields: TemplateFields) -> StoreResult<Option<EmailTemplate>> {
        self.check_writable()?;
        let mut guard = self.inner.lock().await;
        let Some(row) = guard.rows.iter_mut().find(|row| row.id == id) else {
            return Ok(None);
        };
        row.title = fields.title;
        row.content = fields.content;
        row.footer = fields.footer;
        row.image_url = fields.image_url;
        row.image_data = fields.image_data;
        row.is_image_only = fields.is_image_only;
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        self.check_writable()?;
        let mut guard = self.inner.lock().await;
        let before = guard.rows.len();
        guard.rows.retain(|row| row.id != id);
        Ok(guard.rows.len() < before)
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://localhost/email_builder_test".to_string(),
        database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        cors_allowed_origin: None,
    }
}

pub struct TestApp {
    router: Router,
    store: Arc<FakeTemplateStore>,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        Self::with_config(test_config())
    }

    #[allow(dead_code)]
    pub fn with_config(config: AppConfig) -> Result<Self> {
        let store = Arc::new(FakeTemplateStore::default());
        let store_for_state: Arc<dyn TemplateStore> = store.clone();
        let state = AppState::new(config, store_for_state);
        let router = routes::create_router(state)?;
        Ok(Self { router, store })
    }

    #[allow(dead_code)]
    pub fn store(&self) -> Arc<FakeTemplateStore> {
        self.store.clone()
    }

    pub async fn send(&self, request: Request<Body>) -> Result<hyper::Response<Body>> {
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn get(&self, path: &str) -> Result<hyper::Response<Body>> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())?;
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str) -> Result<hyper::Response<Body>> {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(path)
            .body(Body::empty())?;
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::POST, path, payload).await
    }

    #[allow(dead_code)]
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::PUT, path, payload).await
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body))?;
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn upload_image(
        &self,
        field_name: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<hyper::Response<Body>> {
        let boundary = format!("boundary-{}", Uuid::new_v4());
        let mut body = Vec::new();
        body.extend(format!("--{boundary}\r\n").as_bytes());
        body.extend(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field_name, filename
            )
            .as_bytes(),
        );
        body.extend(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend(data);
        body.extend(b"\r\n");
        body.extend(format!("--{boundary}--\r\n").as_bytes());

        self.post_multipart(&boundary, Body::from(body)).await
    }

    #[allow(dead_code)]
    pub async fn post_multipart(
        &self,
        boundary: &str,
        body: Body,
    ) -> Result<hyper::Response<Body>> {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/upload-image")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(body)?;
        self.send(request).await
    }
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

#[allow(dead_code)]
pub async fn body_json<T: DeserializeOwned>(response: hyper::Response<Body>) -> Result<T> {
    let bytes = body_to_vec(response.into_body()).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
