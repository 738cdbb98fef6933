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

//! Ledger store.
//!
//! The [`LedgerStore`] is the entry point of the crate: it owns every user
//! ledger and routes accruals, deductions and balance queries to them.
//!
//! # Operations
//!
//! - **Accrual**: Credits or corrects a company balance, creating the user's
//!   ledger on first success.
//! - **Deduction**: Removes points oldest-transaction-first across companies.
//! - **Balance**: Returns the per-company totals.
//!
//! # Thread Safety
//!
//! Ledgers live in a [`DashMap`] and each one serializes its own mutations
//! behind a mutex. Operations on the same user run one at a time; operations
//! on different users run in parallel.

use crate::base::{CompanyId, TransactionDate, UserId};
use crate::ledger::{LedgerData, UserLedger};
use crate::transaction::{Deduction, LedgerEvent};
use crate::LedgerError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use dashmap::mapref::multiple::RefMulti;
use dashmap::mapref::one::Ref;
use indexmap::IndexMap;
use tracing::debug;

/// In-memory store of user ledgers.
///
/// # Invariants
///
/// - A ledger exists only for users with at least one successful accrual.
/// - Every company total equals the points its held transactions carry.
/// - No company total is ever negative.
#[derive(Debug, Default)]
pub struct LedgerStore {
    /// User ledgers indexed by user key.
    ledgers: DashMap<UserId, UserLedger>,
}

impl LedgerStore {
    /// Creates a store with no users.
    pub fn new() -> Self {
        Self {
            ledgers: DashMap::new(),
        }
    }

    /// Adds `points` from `company` to the user's ledger.
    ///
    /// Zero or positive points are recorded as a new transaction dated
    /// `transaction_date`. Negative points are a correction: they shrink the
    /// company's most recent transactions dated strictly before
    /// `transaction_date` instead of being recorded.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAdjustment`] - Negative points for a company the
    ///   user has no balance with, or the user's overall total would go negative.
    /// - [`LedgerError::PointsOverflow`] - The user's overall total would exceed
    ///   `i64::MAX`.
    /// - [`LedgerError::UnreconciledAdjustment`] - The company's earlier
    ///   transactions cannot absorb the correction.
    ///
    /// Nothing is mutated on error, and a user's ledger is not created by a
    /// failed first accrual.
    pub fn accrue(
        &self,
        user: &UserId,
        company: CompanyId,
        points: i64,
        transaction_date: TransactionDate,
    ) -> Result<(), LedgerError> {
        let result = match self.ledgers.get(user) {
            Some(ledger) => ledger.accrue(company.clone(), points, transaction_date),
            None => self.accrue_new(user, company.clone(), points, transaction_date),
        };

        match &result {
            Ok(()) => debug!(%user, %company, points, %transaction_date, "accrued points"),
            Err(error) => debug!(%user, %company, points, %error, "accrual rejected"),
        }
        result
    }

    /// Accrual path for a user not seen by the lookup.
    ///
    /// The ledger is validated off-map and only inserted on success. Another
    /// request may have created it in the meantime, hence the entry match.
    fn accrue_new(
        &self,
        user: &UserId,
        company: CompanyId,
        points: i64,
        transaction_date: TransactionDate,
    ) -> Result<(), LedgerError> {
        match self.ledgers.entry(user.clone()) {
            Entry::Occupied(entry) => entry.get().accrue(company, points, transaction_date),
            Entry::Vacant(entry) => {
                let mut data = LedgerData::new();
                data.accrue(company, points, transaction_date)?;
                entry.insert(UserLedger::from_data(data));
                Ok(())
            }
        }
    }

    /// Deducts `amount` points, dating the deduction with the local clock.
    ///
    /// See [`LedgerStore::deduct_at`].
    pub fn deduct(&self, user: &UserId, amount: u64) -> Result<Vec<Deduction>, LedgerError> {
        self.deduct_at(user, amount, TransactionDate::now())
    }

    /// Deducts `amount` points from the user's oldest transactions first.
    ///
    /// Returns one [`Deduction`] per company drawn from, with negative points.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UserNotFound`] - The user has no ledger.
    /// - [`LedgerError::InvalidAdjustment`] - `amount` exceeds the user's total;
    ///   nothing is deducted.
    pub fn deduct_at(
        &self,
        user: &UserId,
        amount: u64,
        deduction_date: TransactionDate,
    ) -> Result<Vec<Deduction>, LedgerError> {
        let result = self.get(user)?.deduct(amount, deduction_date);

        match &result {
            Ok(deductions) => debug!(%user, amount, companies = deductions.len(), "deducted points"),
            Err(error) => debug!(%user, amount, %error, "deduction rejected"),
        }
        result
    }

    /// Returns the user's per-company totals.
    ///
    /// # Errors
    ///
    /// [`LedgerError::UserNotFound`] if the user has no ledger.
    pub fn balance(&self, user: &UserId) -> Result<IndexMap<CompanyId, i64>, LedgerError> {
        Ok(self.get(user)?.balances())
    }

    /// Applies an event, returning the deductions it produced.
    ///
    /// Accruals produce no deductions.
    pub fn apply(&self, event: LedgerEvent) -> Result<Vec<Deduction>, LedgerError> {
        match event {
            LedgerEvent::Accrue {
                user,
                company,
                points,
                transaction_date,
            } => self
                .accrue(&user, company, points, transaction_date)
                .map(|()| Vec::new()),
            LedgerEvent::Deduct { user, amount } => self.deduct(&user, amount),
        }
    }

    /// Retrieves a user's ledger.
    pub fn get(&self, user: &UserId) -> Result<Ref<'_, UserId, UserLedger>, LedgerError> {
        self.ledgers
            .get(user)
            .ok_or_else(|| LedgerError::UserNotFound(user.clone()))
    }

    /// Returns an iterator over all user ledgers.
    pub fn users(&self) -> impl Iterator<Item = RefMulti<'_, UserId, UserLedger>> {
        self.ledgers.iter()
    }

    pub fn len(&self) -> usize {
        self.ledgers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledgers.is_empty()
    }
}
