use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Utc};

use crate::models::{NewEmailTemplate, TemplateFields, TemplatePayload};

pub const TITLE_MAX_CHARS: usize = 255;

pub const TITLE_REQUIRED: &str = "Title is required";
pub const TITLE_TOO_LONG: &str = "Title cannot be longer than 255 characters";
pub const CONTENT_REQUIRED: &str = "Content is required";

pub type FieldErrors = BTreeMap<&'static str, &'static str>;

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |text| text.trim().is_empty())
}

pub fn validate(payload: &TemplatePayload) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let title = payload.title.as_deref();
    if is_blank(title) {
        errors.insert("title", TITLE_REQUIRED);
    } else if title.map_or(0, |text| text.chars().count()) > TITLE_MAX_CHARS {
        errors.insert("title", TITLE_TOO_LONG);
    }

    if is_blank(payload.content.as_deref()) {
        errors.insert("content", CONTENT_REQUIRED);
    }

    errors
}

pub fn normalize(payload: TemplatePayload) -> TemplateFields {
    TemplateFields {
        title: payload.title.unwrap_or_default(),
        content: payload.content.unwrap_or_default(),
        footer: payload.footer.unwrap_or_default(),
        image_url: payload.image_url.unwrap_or_default(),
        image_data: payload.image_data,
        is_image_only: payload.is_image_only.unwrap_or(false),
    }
}

pub fn normalize_new(payload: TemplatePayload) -> NewEmailTemplate {
    normalize_new_at(payload, Utc::now().naive_utc())
}

pub fn normalize_new_at(payload: TemplatePayload, created_at: NaiveDateTime) -> NewEmailTemplate {
    NewEmailTemplate {
        fields: normalize(payload),
        created_at,
    }
}
