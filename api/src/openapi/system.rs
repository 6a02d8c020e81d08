use super::common::{ApiTags, HealthResponse};
use crate::config::AppConfig;
use crate::database::Database;
use poem::web::Data;
use poem_openapi::payload::Json;
use poem_openapi::OpenApi;
use std::sync::Arc;

pub struct SystemApi;

#[OpenApi]
impl SystemApi {
    /// Health check endpoint
    ///
    /// Reports whether the API server can reach its database
    #[oai(path = "/health", method = "get", tag = "ApiTags::System")]
    async fn health(
        &self,
        db: Data<&Arc<Database>>,
        config: Data<&Arc<AppConfig>>,
    ) -> Json<HealthResponse> {
        Json(health_status(db.0, config.0).await)
    }
}

pub async fn health_status(db: &Database, config: &AppConfig) -> HealthResponse {
    match db.ping().await {
        Ok(()) => HealthResponse {
            success: true,
            message: "Partner API is running".to_string(),
            environment: config.environment.clone(),
        },
        Err(e) => {
            tracing::error!("Health check failed: {:#}", e);
            HealthResponse {
                success: false,
                message: format!("Database unavailable: {}", e),
                environment: config.environment.clone(),
            }
        }
    }
}
