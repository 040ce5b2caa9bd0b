//! OpenAPI document served under `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use batik_core::{
    Acceptance, CatalogEntry, HistoryStats, Pagination, PredictionSummary, ProvinceCount,
    ProvinceGroup, ProvinceSummary, ScanRecord,
};

use crate::handlers::{history, motifs, predict, system};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Batik Prediction API",
        description = "Batik motif recognition with per-user scan history and a searchable motif catalog"
    ),
    paths(
        system::root,
        system::health_check,
        predict::predict,
        history::list_history,
        history::search_history,
        history::history_stats,
        history::get_history,
        history::delete_history,
        history::delete_all_history,
        motifs::list_motifs,
        motifs::search_motifs,
        motifs::popular_motifs,
        motifs::random_motifs,
        motifs::motifs_by_province,
        motifs::get_motif,
        motifs::list_provinces,
    ),
    components(schemas(
        predict::PredictRequest,
        Acceptance,
        PredictionSummary,
        CatalogEntry,
        ProvinceGroup,
        ProvinceSummary,
        ScanRecord,
        HistoryStats,
        ProvinceCount,
        Pagination,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Prediction", description = "Motif classification"),
        (name = "History", description = "Per-user scan history"),
        (name = "Motifs", description = "Motif catalog and search"),
        (name = "System", description = "Health checks and service info")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}
