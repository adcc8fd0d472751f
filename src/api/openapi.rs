//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{borrows, fine_policies, health, rebalance, reservations, shipments};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tessera API",
        version = "0.3.0",
        description = "Multi-Branch Library Circulation REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "Tessera Consortium", email = "contact@tessera.org")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Borrows
        borrows::get_user_borrows,
        borrows::create_borrow,
        borrows::return_borrow,
        // Reservations
        reservations::create_reservation,
        reservations::cancel_reservation,
        reservations::recalculate_priorities,
        // Fine policies
        fine_policies::get_fine_policies,
        fine_policies::create_fine_policy,
        // Rebalancing
        rebalance::trigger_rebalance,
        // Shipments
        shipments::list_open_shipments,
        shipments::update_shipment_status,
    ),
    components(
        schemas(
            // Borrows
            borrows::BorrowResponse,
            borrows::ReturnResponse,
            crate::models::borrow::Borrow,
            crate::models::borrow::BorrowDetails,
            crate::models::borrow::CreateBorrow,
            crate::models::borrow::ReturnBorrow,
            crate::models::damage_report::DamageReport,
            // Fine policies
            fine_policies::CreateFinePolicyRequest,
            crate::models::fine_policy::FinePolicy,
            crate::models::fine_policy::FineSegment,
            crate::models::fine_policy::FineAssessment,
            // Reservations
            crate::models::reservation::Reservation,
            crate::models::reservation::CreateReservation,
            crate::models::reservation::RecalculateOutcome,
            // Rebalancing
            crate::services::rebalancer::RebalanceReport,
            crate::services::rebalancer::ShipmentPair,
            // Shipments
            crate::models::shipment::Shipment,
            crate::models::shipment::UpdateShipmentStatus,
            // Enums
            crate::models::enums::CopyStatus,
            crate::models::enums::CopyCondition,
            crate::models::enums::BorrowStatus,
            crate::models::enums::ReservationStatus,
            crate::models::enums::ShipmentStatus,
            crate::models::enums::ShipmentReason,
            crate::models::enums::MembershipTier,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "borrows", description = "Borrow and return circulation"),
        (name = "reservations", description = "Waiting list management"),
        (name = "fine-policies", description = "Versioned fine rate policies"),
        (name = "rebalance", description = "Cross-branch inventory rebalancing"),
        (name = "shipments", description = "Inter-library shipment tracking")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
