use std::{convert::Infallible, sync::Arc};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use unihub_campus::PgDatabase;

use crate::config::ServerConfig;

pub type Campus = unihub_campus::Campus<PgDatabase>;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub campus: Arc<Campus>,
    pub config: Arc<ServerConfig>,
}

#[async_trait]
impl<S> FromRequestParts<S> for ServerContext
where
    ServerContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(ServerContext::from_ref(state))
    }
}
