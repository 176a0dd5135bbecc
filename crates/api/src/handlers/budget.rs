//! Handlers for a project's budget ledger.

use axum::extract::{Path, State};
use axum::Json;
use tally_core::summary::{compose_budget_summary, BudgetSummary};
use tally_core::types::DbId;
use tally_db::models::budget::{BudgetView, UpdateRevenue};
use tally_db::repositories::BudgetRepo;

use super::project::find_and_authorize;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{id}/budget
///
/// Creates a zero budget on first access; cost is refreshed from the ledger.
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<BudgetView>>> {
    find_and_authorize(&state.pool, project_id, &auth).await?;
    let budget =
        BudgetRepo::get_or_create(&state.pool, project_id, &state.config.default_currency).await?;
    Ok(Json(DataResponse::new(BudgetView::from(budget))))
}

/// PUT /api/v1/projects/{id}/budget/revenue
pub async fn set_revenue(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<UpdateRevenue>,
) -> AppResult<Json<DataResponse<BudgetView>>> {
    find_and_authorize(&state.pool, project_id, &auth).await?;
    let input = input.validate()?;

    let budget = BudgetRepo::set_revenue(
        &state.pool,
        project_id,
        input.revenue,
        input.currency.as_deref(),
        &state.config.default_currency,
    )
    .await?;

    tracing::info!(
        project_id,
        revenue = budget.revenue,
        profit = budget.profit,
        "Budget revenue updated"
    );

    Ok(Json(DataResponse::new(BudgetView::from(budget))))
}

/// GET /api/v1/projects/{id}/budget/summary
pub async fn summary(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<BudgetSummary<BudgetView>>>> {
    let project = find_and_authorize(&state.pool, project_id, &auth).await?;

    let (budget, facts) =
        BudgetRepo::report(&state.pool, project_id, &state.config.default_currency).await?;

    let view = BudgetView::from(budget);
    let is_deficit = view.is_deficit;
    if is_deficit {
        tracing::warn!(project_id, profit = view.profit, "Project is running at a deficit");
    }

    Ok(Json(DataResponse::new(compose_budget_summary(
        project.id,
        project.name,
        view,
        is_deficit,
        &facts,
    ))))
}
