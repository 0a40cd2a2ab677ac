use axum::{
    extract::{Path, Query, State},
    Json,
};
use service_core::error::AppError;

use crate::dtos::catalog::{CatalogParams, CreateServiceRequest, UpdateServiceRequest};
use crate::dtos::{message, ok, ApiResponse, MessageResponse};
use crate::middleware::AuthUser;
use crate::models::{Role, Service, ServiceChanges};
use crate::services::Claims;
use crate::store::CatalogQuery;
use crate::utils::ValidatedJson;
use crate::AppState;

use super::parse_id;

pub async fn list_services(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Result<Json<ApiResponse<Vec<Service>>>, AppError> {
    let services = state
        .stores
        .catalog
        .list(CatalogQuery {
            category: params.category,
            search: params.search,
            provider_id: params.provider_id,
        })
        .await?;
    Ok(ok(services))
}

pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Service>>, AppError> {
    let id = parse_id(&id, "service")?;
    let service = state
        .stores
        .catalog
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Service not found"))?;
    Ok(ok(service))
}

pub async fn create_service(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateServiceRequest>,
) -> Result<Json<ApiResponse<Service>>, AppError> {
    if claims.role != Role::Provider && claims.role != Role::Admin {
        return Err(AppError::forbidden("Only providers can list services"));
    }

    let service = Service::new(
        payload.title,
        payload.description,
        payload.category,
        payload.price,
        payload.image,
        claims.account_id()?,
        payload.location.unwrap_or_default(),
    );
    state.stores.catalog.insert(service.clone()).await?;

    tracing::info!(service_id = %service.id, provider_id = %service.provider_id, "service listed");
    Ok(ok(service))
}

pub async fn update_service(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateServiceRequest>,
) -> Result<Json<ApiResponse<Service>>, AppError> {
    let id = parse_id(&id, "service")?;
    require_ownership(&state, &claims, id).await?;

    let service = state
        .stores
        .catalog
        .update(
            id,
            ServiceChanges {
                title: payload.title,
                description: payload.description,
                category: payload.category,
                price: payload.price,
                image: payload.image,
                location: payload.location,
                availability: payload.availability,
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("Service not found"))?;
    Ok(ok(service))
}

pub async fn delete_service(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let id = parse_id(&id, "service")?;
    require_ownership(&state, &claims, id).await?;

    if !state.stores.catalog.delete(id).await? {
        return Err(AppError::not_found("Service not found"));
    }
    tracing::info!(service_id = %id, "service removed");
    Ok(message("Service removed"))
}

/// Catalog writes are allowed to the owning provider and to admins.
async fn require_ownership(
    state: &AppState,
    claims: &Claims,
    service_id: uuid::Uuid,
) -> Result<(), AppError> {
    if claims.role == Role::Admin {
        return Ok(());
    }
    let service = state
        .stores
        .catalog
        .find_by_id(service_id)
        .await?
        .ok_or_else(|| AppError::not_found("Service not found"))?;
    if service.provider_id != claims.account_id()? {
        return Err(AppError::forbidden("You do not own this service"));
    }
    Ok(())
}
