//! OpenAPI document for the REST surface.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::auth::USER_HEADER;
use super::dto::{
    AlertRequest, AlertResponse, BatchRequest, BatchResponse, DeleteDisasterResponse,
    DisasterListResponse, DistanceDto, DistanceResponse, GeocodeRequest, MonitoringListResponse,
    PaginationMeta, ReverseRequest, ReverseResponse, TextRequest,
};
use super::handlers::{disaster, geocoding, hub, system};
use crate::domain::{
    AuditAction, AuditEntry, Disaster, DisasterListing, DisasterPatch, NewDisaster, Role,
};
use crate::error::{ErrorBody, ErrorResponse};
use crate::location::{
    BatchItem, Coordinates, ExtractedPlace, ExtractionMethod, GeocodeOutcome, ProcessOutcome,
};
use crate::monitoring::MonitoringSession;
use crate::service::CreatedDisaster;

/// Registers the `x-user-id` header as the API's security scheme.
#[derive(Debug)]
struct UserHeader;

impl Modify for UserHeader {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "user_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(USER_HEADER))),
            );
        }
    }
}

/// Complete OpenAPI description of the REST API.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "disaster-hub",
        description = "Disaster coordination hub: disasters with audit trail, location resolution, urgent alerts and monitoring."
    ),
    paths(
        disaster::create_disaster,
        disaster::list_disasters,
        disaster::get_disaster,
        disaster::update_disaster,
        disaster::delete_disaster,
        disaster::get_audit_trail,
        hub::post_alert,
        hub::list_monitoring,
        geocoding::extract,
        geocoding::geocode,
        geocoding::reverse,
        geocoding::process,
        geocoding::batch,
        geocoding::distance,
        system::health_handler,
    ),
    components(schemas(
        Disaster,
        DisasterListing,
        NewDisaster,
        DisasterPatch,
        CreatedDisaster,
        AuditEntry,
        AuditAction,
        Role,
        DisasterListResponse,
        DeleteDisasterResponse,
        PaginationMeta,
        AlertRequest,
        AlertResponse,
        MonitoringSession,
        MonitoringListResponse,
        Coordinates,
        ExtractedPlace,
        ExtractionMethod,
        GeocodeOutcome,
        ProcessOutcome,
        BatchItem,
        TextRequest,
        GeocodeRequest,
        ReverseRequest,
        ReverseResponse,
        BatchRequest,
        BatchResponse,
        DistanceDto,
        DistanceResponse,
        ErrorResponse,
        ErrorBody,
    )),
    modifiers(&UserHeader),
    security(("user_id" = [])),
    tags(
        (name = "Disasters", description = "Disaster records with ownership and audit trail"),
        (name = "Hub", description = "Urgent alerts and monitoring sessions"),
        (name = "Geocoding", description = "Place extraction, geocoding and distances"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;
