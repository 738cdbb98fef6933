// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! REST API over a [`LedgerStore`].
//!
//! ## Endpoints
//!
//! - `PUT /{user}/add` - Accrue points (`201 Created`)
//! - `PUT /{user}/deduct/{amount}` - Deduct points, returns the per-company breakdown
//! - `GET /{user}/balance` - Per-company totals
//!
//! ## Example Usage
//!
//! ```bash
//! curl -X PUT http://localhost:5001/alice/add \
//!   -H "Content-Type: application/json" \
//!   -d '{"company": "DANNON", "points": 300, "transactionDate": "10/31/20 10:00AM"}'
//!
//! curl -X PUT http://localhost:5001/alice/deduct/100
//!
//! curl http://localhost:5001/alice/balance
//! ```

use crate::base::{CompanyId, UserId};
use crate::store::LedgerStore;
use crate::transaction::Deduction;
use crate::LedgerError;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

// === Request/Response DTOs ===

/// Request body for accruing points.
///
/// ```json
/// {"company": "DANNON", "points": 300, "transactionDate": "10/31/20 10:00AM"}
/// ```
///
/// The date stays textual here so a malformed one maps to
/// [`LedgerError::InvalidDate`] rather than a JSON rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccrualRequest {
    pub company: CompanyId,
    pub points: i64,
    pub transaction_date: String,
}

/// Response body for errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the ledger store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LedgerStore>,
}

// === Error Handling ===

/// Wrapper for converting `LedgerError` into HTTP responses.
pub struct AppError(LedgerError);

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            LedgerError::UserNotFound(_) => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            LedgerError::InvalidAdjustment => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_ADJUSTMENT")
            }
            LedgerError::PointsOverflow => (StatusCode::UNPROCESSABLE_ENTITY, "POINTS_OVERFLOW"),
            LedgerError::UnreconciledAdjustment { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNRECONCILED_ADJUSTMENT")
            }
            LedgerError::InvalidDate(_) => (StatusCode::BAD_REQUEST, "INVALID_DATE"),
        };
        debug!(%status, error = %self.0, "request failed");

        (
            status,
            Json(ErrorResponse {
                message: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// PUT /{user}/add - Accrue points for a user.
async fn add_points(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(request): Json<AccrualRequest>,
) -> Result<StatusCode, AppError> {
    let transaction_date = request.transaction_date.parse()?;
    state.store.accrue(
        &UserId(user),
        request.company,
        request.points,
        transaction_date,
    )?;
    Ok(StatusCode::CREATED)
}

/// PUT /{user}/deduct/{amount} - Deduct points oldest-first.
async fn deduct_points(
    State(state): State<AppState>,
    Path((user, amount)): Path<(String, u64)>,
) -> Result<Json<Vec<Deduction>>, AppError> {
    let deductions = state.store.deduct(&UserId(user), amount)?;
    Ok(Json(deductions))
}

/// GET /{user}/balance - Per-company totals.
async fn balance(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<IndexMap<CompanyId, i64>>, AppError> {
    let balances = state.store.balance(&UserId(user))?;
    Ok(Json(balances))
}

// === Router ===

/// Builds the API router over `store`.
pub fn router(store: Arc<LedgerStore>) -> Router {
    Router::new()
        .route("/{user}/add", put(add_points))
        .route("/{user}/deduct/{amount}", put(deduct_points))
        .route("/{user}/balance", get(balance))
        .with_state(AppState { store })
}

/// Serves the API on `addr` until the process stops.
pub async fn serve(store: Arc<LedgerStore>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "points ledger listening");
    axum::serve(listener, router(store)).await
}
