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

//! Per-user ledger.
//!
//! A ledger keeps one running total per company and the accrual transactions
//! backing those totals. Transactions are held sorted by date so that
//! deductions can consume them oldest-first and reconciliations can walk them
//! newest-first without re-sorting.
//!
//! # Example
//!
//! ```
//! use points_ledger_rs::{CompanyId, UserLedger};
//!
//! let ledger = UserLedger::new();
//! ledger
//!     .accrue(CompanyId::new("DANNON"), 300, "10/31/20 10:00AM".parse().unwrap())
//!     .unwrap();
//! assert_eq!(ledger.total(), 300);
//! ```

use crate::LedgerError;
use crate::base::{CompanyId, TransactionDate};
use crate::transaction::{AccrualTransaction, Deduction};
use indexmap::IndexMap;
use parking_lot::Mutex;

#[derive(Debug, Default)]
pub(crate) struct LedgerData {
    /// Running balance per company, in order of first accrual.
    pub(crate) totals: IndexMap<CompanyId, i64>,
    /// Unconsumed accruals, ascending by date; equal dates keep insertion order.
    pub(crate) transactions: Vec<AccrualTransaction>,
}

impl LedgerData {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sum of every company total.
    ///
    /// Accruals that would take the sum past `i64::MAX` are rejected, so it
    /// never saturates in practice.
    pub(crate) fn total_points(&self) -> i64 {
        self.totals
            .values()
            .fold(0i64, |sum, total| sum.saturating_add(*total))
    }

    /// Inserts after every transaction dated at or before `transaction`.
    pub(crate) fn insert_transaction(&mut self, transaction: AccrualTransaction) {
        let index = self
            .transactions
            .partition_point(|held| held.transaction_date <= transaction.transaction_date);
        self.transactions.insert(index, transaction);
    }

    pub(crate) fn assert_invariants(&self) {
        debug_assert!(
            self.totals.values().all(|total| *total >= 0),
            "Invariant violated: company total went negative: {:?}",
            self.totals
        );
        debug_assert!(
            self.totals
                .values()
                .try_fold(0i64, |sum, total| sum.checked_add(*total))
                .is_some(),
            "Invariant violated: totals overflow: {:?}",
            self.totals
        );
        debug_assert!(
            self.transactions.iter().all(|held| held.points >= 0),
            "Invariant violated: transaction went negative: {:?}",
            self.transactions
        );
        debug_assert!(
            self.transactions
                .windows(2)
                .all(|pair| pair[0].transaction_date <= pair[1].transaction_date),
            "Invariant violated: transactions out of date order"
        );
        debug_assert!(
            self.totals.iter().all(|(company, total)| {
                let held: i64 = self
                    .transactions
                    .iter()
                    .filter(|held| &held.company == company)
                    .map(|held| held.points)
                    .sum();
                held == *total
            }),
            "Invariant violated: totals {:?} disagree with transactions {:?}",
            self.totals,
            self.transactions
        );
    }
}

/// Points ledger of a single user.
#[derive(Debug, Default)]
pub struct UserLedger {
    inner: Mutex<LedgerData>,
}

impl UserLedger {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LedgerData::new()),
        }
    }

    /// Snapshot of the company totals, in order of first accrual.
    pub fn balances(&self) -> IndexMap<CompanyId, i64> {
        self.inner.lock().totals.clone()
    }

    /// Sum of all company totals.
    pub fn total(&self) -> i64 {
        self.inner.lock().total_points()
    }

    /// Snapshot of the unconsumed transactions, oldest first.
    pub fn transactions(&self) -> Vec<AccrualTransaction> {
        self.inner.lock().transactions.clone()
    }

    /// Applies an accrual. See [`crate::LedgerStore::accrue`].
    pub fn accrue(
        &self,
        company: CompanyId,
        points: i64,
        transaction_date: TransactionDate,
    ) -> Result<(), LedgerError> {
        self.inner.lock().accrue(company, points, transaction_date)
    }

    /// Deducts `amount` points oldest-first. See [`crate::LedgerStore::deduct`].
    pub fn deduct(
        &self,
        amount: u64,
        deduction_date: TransactionDate,
    ) -> Result<Vec<Deduction>, LedgerError> {
        self.inner.lock().deduct(amount, deduction_date)
    }

    /// Builds a ledger from already validated state.
    pub(crate) fn from_data(data: LedgerData) -> Self {
        Self {
            inner: Mutex::new(data),
        }
    }
}
