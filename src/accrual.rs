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

//! Accrual processing.
//!
//! Non-negative accruals are recorded as new transactions; a zero-point record
//! lives until the next deduction purges it. Negative accruals are
//! corrections issued by a company: they are never recorded, they shrink the
//! company's own earlier grants instead, most recent first.
//!
//! ```text
//!  X 100 (Jan 1)   Y 40 (Jan 5)   X 50 (Feb 1) │ X 70 (Mar 1)
//!       ◄─────────── scan ─────────────────────┤
//!                                    cutoff (Feb 15)
//! ```

use crate::LedgerError;
use crate::base::{CompanyId, TransactionDate};
use crate::ledger::LedgerData;
use crate::transaction::AccrualTransaction;
use tracing::debug;

impl LedgerData {
    /// Applies `points` for `company` dated `transaction_date`.
    ///
    /// Validation happens before any mutation: a failed accrual leaves the
    /// ledger untouched.
    pub(crate) fn accrue(
        &mut self,
        company: CompanyId,
        points: i64,
        transaction_date: TransactionDate,
    ) -> Result<(), LedgerError> {
        // A company balance cannot be opened with a correction.
        if points < 0 && !self.totals.contains_key(&company) {
            return Err(LedgerError::InvalidAdjustment);
        }
        // Totals are non-negative, so a negative `points` never overflows here.
        match self.total_points().checked_add(points) {
            None => return Err(LedgerError::PointsOverflow),
            Some(total) if total < 0 => return Err(LedgerError::InvalidAdjustment),
            Some(_) => {}
        }

        if points < 0 {
            let amount = -points;
            let absorbable = self.absorbable(&company, transaction_date);
            if absorbable < amount {
                return Err(LedgerError::UnreconciledAdjustment {
                    company,
                    unabsorbed: amount - absorbable,
                });
            }
        }

        *self.totals.entry(company.clone()).or_insert(0) += points;

        if points >= 0 {
            self.insert_transaction(AccrualTransaction {
                company,
                points,
                transaction_date,
            });
        } else {
            let unabsorbed = self.reconcile(&company, -points, transaction_date);
            debug_assert_eq!(unabsorbed, 0, "reconciliation was validated up front");
            debug!(%company, points, "reconciled negative accrual");
        }

        self.assert_invariants();
        Ok(())
    }

    /// Points held by `company` in transactions dated strictly before `cutoff`.
    fn absorbable(&self, company: &CompanyId, cutoff: TransactionDate) -> i64 {
        self.transactions[..self.earlier_than(cutoff)]
            .iter()
            .filter(|held| &held.company == company)
            .map(|held| held.points)
            .sum()
    }

    /// Shrinks or removes the most recent transactions of `company` that
    /// predate `cutoff` until `amount` points are absorbed.
    ///
    /// Returns the points left unabsorbed.
    pub(crate) fn reconcile(
        &mut self,
        company: &CompanyId,
        amount: i64,
        cutoff: TransactionDate,
    ) -> i64 {
        let mut remaining = amount;
        let mut index = self.earlier_than(cutoff);

        while index > 0 && remaining > 0 {
            index -= 1;
            let held = &mut self.transactions[index];
            if &held.company != company {
                continue;
            }

            if held.points <= remaining {
                remaining -= held.points;
                self.transactions.remove(index);
            } else {
                held.points -= remaining;
                remaining = 0;
            }
        }

        remaining
    }

    /// Number of leading transactions dated strictly before `cutoff`.
    fn earlier_than(&self, cutoff: TransactionDate) -> usize {
        self.transactions
            .partition_point(|held| held.transaction_date < cutoff)
    }
}
