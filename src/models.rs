use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::*;
use crate::utils::json::base64_bytes;

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = email_templates)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub footer: String,
    pub image_url: String,
    #[serde(
        serialize_with = "base64_bytes::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_data: Option<Vec<u8>>,
    pub is_image_only: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = email_templates)]
#[diesel(treat_none_as_null = true)]
pub struct TemplateFields {
    pub title: String,
    pub content: String,
    pub footer: String,
    pub image_url: String,
    pub image_data: Option<Vec<u8>>,
    pub is_image_only: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = email_templates)]
pub struct NewEmailTemplate {
    #[diesel(embed)]
    pub fields: TemplateFields,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplatePayload {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub footer: Option<String>,
    pub image_url: Option<String>,
    #[serde(deserialize_with = "base64_bytes::deserialize")]
    pub image_data: Option<Vec<u8>>,
    pub is_image_only: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    pub message: String,
    pub image_url: String,
    pub image_id: i64,
}
