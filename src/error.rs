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

//! Error types for ledger operations.

use crate::base::{CompanyId, UserId};
use thiserror::Error;

/// Ledger operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No ledger exists for the user
    #[error("user {0} does not exist")]
    UserNotFound(UserId),

    /// Operation would drive a balance negative or open a company with negative points
    #[error("adjustment would leave a negative balance")]
    InvalidAdjustment,

    /// Accrual would push the user's point total past `i64::MAX`
    #[error("adjustment would overflow the point balance")]
    PointsOverflow,

    /// Negative accrual that earlier transactions of the company cannot absorb
    #[error("{unabsorbed} points of the {company} adjustment match no earlier transaction")]
    UnreconciledAdjustment { company: CompanyId, unabsorbed: i64 },

    /// Transaction date does not follow the ledger format
    #[error("invalid transaction date: {0:?}")]
    InvalidDate(String),
}
