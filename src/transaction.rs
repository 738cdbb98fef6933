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

//! Ledger records and events.
//!
//! An [`AccrualTransaction`] is a grant of points still held by a user. It is
//! consumed oldest-first by deductions and shrunk newest-first by negative
//! accruals of the same company; once its points reach zero it is dropped.

use crate::base::{CompanyId, TransactionDate, UserId};
use serde::{Deserialize, Serialize};

/// Points granted by a company and not yet consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccrualTransaction {
    pub company: CompanyId,
    pub points: i64,
    pub transaction_date: TransactionDate,
}

/// Points removed from one company by a deduction.
///
/// `points_deducted` is negative: it is the change applied to the balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    pub company: CompanyId,
    #[serde(rename = "points")]
    pub points_deducted: i64,
    #[serde(rename = "deductionDate")]
    pub deduction_date: TransactionDate,
}

/// A ledger mutation addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    Accrue {
        user: UserId,
        company: CompanyId,
        points: i64,
        transaction_date: TransactionDate,
    },
    Deduct {
        user: UserId,
        amount: u64,
    },
}

impl LedgerEvent {
    pub fn user(&self) -> &UserId {
        match self {
            Self::Accrue { user, .. } => user,
            Self::Deduct { user, .. } => user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduction_serializes_with_wire_names() {
        let deduction = Deduction {
            company: CompanyId::new("DANNON"),
            points_deducted: -100,
            deduction_date: "11/02/20 02:00PM".parse().unwrap(),
        };

        let json = serde_json::to_value(&deduction).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "company": "DANNON",
                "points": -100,
                "deductionDate": "11/02/20 02:00PM",
            })
        );
    }

    #[test]
    fn accrual_deserializes_from_request_shape() {
        let json = r#"{"company": "UNILEVER", "points": 200, "transactionDate": "10/31/20 11:00AM"}"#;
        let transaction: AccrualTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(transaction.company, CompanyId::new("UNILEVER"));
        assert_eq!(transaction.points, 200);
        assert_eq!(transaction.transaction_date.to_string(), "10/31/20 11:00AM");
    }

    #[test]
    fn event_exposes_its_user() {
        let event = LedgerEvent::Deduct {
            user: UserId::new("alice"),
            amount: 5,
        };
        assert_eq!(event.user(), &UserId::new("alice"));
    }
}
