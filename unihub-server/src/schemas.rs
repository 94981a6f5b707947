//! Request bodies accepted by the endpoints, validated at the boundary.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::ServerError;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginSchema {
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 64))]
    pub password: String,
    /// Extends the session lifetime
    pub remember: Option<bool>,
}

/// The role a new account applies for. Club admin accounts start out as
/// pending applications.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub enum RegisterRoleSchema {
    #[serde(rename = "student")]
    Student,
    #[serde(rename = "ClubAdmin")]
    ClubAdmin,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterSchema {
    #[validate(length(min = 2, max = 128))]
    pub name: String,
    #[validate(length(min = 2, max = 128))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
    pub role: RegisterRoleSchema,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewEventSchema {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: String,
    pub event_date: NaiveDate,
    pub event_time: NaiveTime,
    #[validate(range(min = 1))]
    pub duration_minutes: i32,
    #[validate(length(min = 1, max = 64))]
    pub category: String,
    #[validate(length(min = 1, max = 256))]
    pub address: String,
    #[validate(length(min = 1, max = 64))]
    pub room: String,
    pub registration_deadline: DateTime<Utc>,
    #[validate(range(min = 1))]
    pub capacity: i32,
    #[validate(length(max = 512))]
    pub image_url: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateEventSchema {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<NaiveTime>,
    #[validate(range(min = 1))]
    pub duration_minutes: Option<i32>,
    #[validate(length(min = 1, max = 64))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub room: Option<String>,
    pub registration_deadline: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
    #[validate(length(max = 512))]
    pub image_url: Option<String>,
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|_| ServerError::BadRequest("JSON parse failed"))?;

        extracted_json
            .0
            .validate()
            .map_err(|_| ServerError::BadRequest("Request body is invalid"))?;

        Ok(Self(extracted_json.0))
    }
}
