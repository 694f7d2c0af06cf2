use std::sync::Arc;

use crate::{config::AppConfig, store::TemplateStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub templates: Arc<dyn TemplateStore>,
}

impl AppState {
    pub fn new(config: AppConfig, templates: Arc<dyn TemplateStore>) -> Self {
        Self {
            config: Arc::new(config),
            templates,
        }
    }
}
