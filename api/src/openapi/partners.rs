use super::common::{ApiResponse, ApiTags};
use crate::config::AppConfig;
use crate::database::{Database, Partner, PartnerDetails, Partners};
use crate::search::{
    decode_search_param, decode_search_value, PredicateCompiler, Search, SearchError,
};
use poem::web::Data;
use poem_openapi::{
    param::{Path, Query},
    payload::Json,
    Object, OpenApi,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One page of search results plus the unpaged match count
#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct PartnerPage {
    pub items: Vec<Partner>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(poem_openapi::ApiResponse)]
pub enum PartnerPageResponse {
    #[oai(status = 200)]
    Ok(Json<ApiResponse<PartnerPage>>),
    #[oai(status = 400)]
    BadRequest(Json<ApiResponse<String>>),
    #[oai(status = 500)]
    InternalError(Json<ApiResponse<String>>),
}

#[derive(poem_openapi::ApiResponse)]
pub enum PartnerDetailsResponse {
    #[oai(status = 200)]
    Ok(Json<ApiResponse<PartnerDetails>>),
    #[oai(status = 404)]
    NotFound(Json<ApiResponse<String>>),
    #[oai(status = 500)]
    InternalError(Json<ApiResponse<String>>),
}

pub struct PartnersApi;

#[OpenApi]
impl PartnersApi {
    /// List partners
    ///
    /// `search` holds a search document as JSON or base64-encoded JSON;
    /// without it every partner matches
    #[oai(path = "/partners", method = "get", tag = "ApiTags::Partners")]
    async fn list_partners(
        &self,
        db: Data<&Arc<Database>>,
        compiler: Data<&Arc<PredicateCompiler>>,
        config: Data<&Arc<AppConfig>>,
        search: Query<Option<String>>,
        limit: Query<Option<i64>>,
        offset: Query<Option<i64>>,
    ) -> PartnerPageResponse {
        match decode_query_search(search.0.as_deref()) {
            Ok(search) => {
                search_partners(db.0, compiler.0, config.0, search, limit.0, offset.0).await
            }
            Err(e) => search_error(e),
        }
    }

    /// Search partners
    ///
    /// Same as listing, with the search document as the request body
    #[oai(path = "/partners/search", method = "post", tag = "ApiTags::Partners")]
    async fn search_partners_by_body(
        &self,
        db: Data<&Arc<Database>>,
        compiler: Data<&Arc<PredicateCompiler>>,
        config: Data<&Arc<AppConfig>>,
        body: Json<serde_json::Value>,
        limit: Query<Option<i64>>,
        offset: Query<Option<i64>>,
    ) -> PartnerPageResponse {
        match decode_search_value::<Partners>(body.0) {
            Ok(search) => {
                search_partners(db.0, compiler.0, config.0, search, limit.0, offset.0).await
            }
            Err(e) => search_error(e),
        }
    }

    /// Get partner by ID
    ///
    /// Returns the partner with its contact and attributes
    #[oai(path = "/partners/:id", method = "get", tag = "ApiTags::Partners")]
    async fn get_partner(&self, db: Data<&Arc<Database>>, id: Path<String>) -> PartnerDetailsResponse {
        partner_details(db.0, &id.0).await
    }
}

/// Decode the optional `search` query parameter; blank means no filter
pub fn decode_query_search(raw: Option<&str>) -> Result<Search<Partners>, SearchError> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => decode_search_param(raw),
        None => Ok(Search::default()),
    }
}

pub async fn search_partners(
    db: &Database,
    compiler: &PredicateCompiler,
    config: &AppConfig,
    search: Search<Partners>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> PartnerPageResponse {
    let (limit, offset) = match config.page(limit, offset) {
        Ok(page) => page,
        Err(message) => {
            return PartnerPageResponse::BadRequest(Json(ApiResponse::err(message)));
        }
    };

    let predicate = match compiler.compile(&search) {
        Ok(predicate) => predicate,
        Err(e) => return search_error(e),
    };

    let items = match db.list_partners(&predicate, Some(limit), Some(offset)).await {
        Ok(items) => items,
        Err(e) => {
            tracing::error!("Failed to list partners: {:#}", e);
            return PartnerPageResponse::InternalError(Json(ApiResponse::err(e.to_string())));
        }
    };
    let total = match db.count_partners(&predicate).await {
        Ok(total) => total,
        Err(e) => {
            tracing::error!("Failed to count partners: {:#}", e);
            return PartnerPageResponse::InternalError(Json(ApiResponse::err(e.to_string())));
        }
    };

    PartnerPageResponse::Ok(Json(ApiResponse::ok(PartnerPage {
        items,
        total,
        limit,
        offset,
    })))
}

pub async fn partner_details(db: &Database, id: &str) -> PartnerDetailsResponse {
    match db.get_partner_details(id).await {
        Ok(Some(details)) => PartnerDetailsResponse::Ok(Json(ApiResponse::ok(details))),
        Ok(None) => PartnerDetailsResponse::NotFound(Json(ApiResponse::err(format!(
            "Partner {} not found",
            id
        )))),
        Err(e) => {
            tracing::error!("Failed to load partner {}: {:#}", id, e);
            PartnerDetailsResponse::InternalError(Json(ApiResponse::err(e.to_string())))
        }
    }
}

fn search_error(e: SearchError) -> PartnerPageResponse {
    if e.is_client_error() {
        tracing::warn!(member = ?e.member(), "Rejected partner search: {}", e);
        PartnerPageResponse::BadRequest(Json(ApiResponse::err(e.to_string())))
    } else {
        tracing::error!(member = ?e.member(), "Partner search misconfigured: {}", e);
        PartnerPageResponse::InternalError(Json(ApiResponse::err(e.to_string())))
    }
}
