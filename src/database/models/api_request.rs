use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Audit row written for every authenticated API call
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    pub id: Uuid,
    pub user_subject: String,
    pub user_email: Option<String>,
    pub method: String,
    pub url: String,
    pub created_utc: DateTime<Utc>,
}

impl ApiRequest {
    pub fn new(user_subject: String, user_email: Option<String>, method: String, url: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_subject,
            user_email,
            method,
            url,
            created_utc: Utc::now(),
        }
    }
}
