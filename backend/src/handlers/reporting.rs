//! HTTP handlers for reporting and dashboards

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::reporting::{
    DashboardMetrics, DiscardSummaryRow, MovementCountRow, ProductStockRow, ReportingService,
    SalesByDayRow,
};
use crate::AppState;
use shared::types::DateRange;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

impl From<RangeQuery> for DateRange {
    fn from(q: RangeQuery) -> Self {
        DateRange {
            start: q.start,
            end: q.end,
        }
    }
}

/// Headline dashboard metrics
pub async fn dashboard(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<DashboardMetrics>> {
    let service = ReportingService::new(state.db);
    let metrics = service.dashboard().await?;
    Ok(Json(metrics))
}

/// Stock position per product
pub async fn stock_by_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<ProductStockRow>>> {
    let service = ReportingService::new(state.db);
    let rows = service.stock_by_product().await?;
    Ok(Json(rows))
}

/// Sales per day over a date range
pub async fn sales_by_day(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<Vec<SalesByDayRow>>> {
    let service = ReportingService::new(state.db);
    let rows = service.sales_by_day(query.into()).await?;
    Ok(Json(rows))
}

/// Discarded units grouped by reason
pub async fn discard_summary(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<DiscardSummaryRow>>> {
    let service = ReportingService::new(state.db);
    let rows = service.discard_summary().await?;
    Ok(Json(rows))
}

/// Movement counts by type over a date range
pub async fn movement_counts(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<Vec<MovementCountRow>>> {
    let service = ReportingService::new(state.db);
    let rows = service.movement_counts(query.into()).await?;
    Ok(Json(rows))
}
