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

//! Deduction allocation.
//!
//! A deduction is spread over the user's transactions oldest-first, whatever
//! company issued them. The breakdown reports one entry per company drawn
//! from, in the order the companies were first reached. Zero draws are
//! reported too: a zero-point transaction passed on the way, or a zero
//! deduction settled by the first eligible transaction.

use crate::LedgerError;
use crate::base::{CompanyId, TransactionDate};
use crate::ledger::LedgerData;
use crate::transaction::Deduction;
use indexmap::IndexMap;

impl LedgerData {
    /// Removes `amount` points, consuming the oldest transactions first.
    pub(crate) fn deduct(
        &mut self,
        amount: u64,
        deduction_date: TransactionDate,
    ) -> Result<Vec<Deduction>, LedgerError> {
        let mut remaining = i64::try_from(amount)
            .ok()
            .filter(|amount| *amount <= self.total_points())
            .ok_or(LedgerError::InvalidAdjustment)?;

        let mut drawn: IndexMap<CompanyId, i64> = IndexMap::new();
        for held in self.transactions.iter_mut() {
            let Some(total) = self.totals.get_mut(&held.company) else {
                continue;
            };
            if *total <= 0 {
                continue;
            }

            // A transaction holding at least what is left settles the deduction.
            let settles = held.points >= remaining;
            let taken = held.points.min(remaining);
            *total -= taken;
            held.points -= taken;
            remaining -= taken;
            *drawn.entry(held.company.clone()).or_insert(0) += taken;

            if settles {
                break;
            }
        }
        debug_assert_eq!(remaining, 0, "balance check guarantees full allocation");

        self.transactions.retain(|held| held.points != 0);
        self.assert_invariants();

        Ok(drawn
            .into_iter()
            .map(|(company, points)| Deduction {
                company,
                points_deducted: -points,
                deduction_date,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> TransactionDate {
        s.parse().unwrap()
    }

    fn company(name: &str) -> CompanyId {
        CompanyId::new(name)
    }

    fn breakdown(deductions: &[Deduction]) -> Vec<(&str, i64)> {
        deductions
            .iter()
            .map(|d| (d.company.0.as_str(), d.points_deducted))
            .collect()
    }

    /// Three companies, one DANNON correction.
    fn sample() -> LedgerData {
        let mut data = LedgerData::new();
        data.accrue(company("DANNON"), 1000, date("11/02/20 02:00PM"))
            .unwrap();
        data.accrue(company("UNILEVER"), 200, date("10/31/20 11:00AM"))
            .unwrap();
        data.accrue(company("MILLER COORS"), 10000, date("11/01/20 02:00PM"))
            .unwrap();
        data.accrue(company("DANNON"), 300, date("10/31/20 10:00AM"))
            .unwrap();
        data.accrue(company("DANNON"), -200, date("10/31/20 03:00PM"))
            .unwrap();
        data
    }

    #[test]
    fn fifo_across_one_company() {
        let mut data = LedgerData::new();
        data.accrue(company("X"), 100, date("01/01/20 10:00AM"))
            .unwrap();
        data.accrue(company("X"), 50, date("02/01/20 10:00AM"))
            .unwrap();

        let deductions = data.deduct(120, date("03/01/20 10:00AM")).unwrap();

        assert_eq!(breakdown(&deductions), vec![("X", -120)]);
        assert_eq!(data.totals[&company("X")], 30);
        assert_eq!(data.transactions.len(), 1);
        assert_eq!(data.transactions[0].points, 30);
        assert_eq!(data.transactions[0].transaction_date, date("02/01/20 10:00AM"));
    }

    #[test]
    fn fifo_across_companies() {
        let mut data = sample();

        let deductions = data.deduct(5000, date("11/03/20 09:00AM")).unwrap();

        assert_eq!(
            breakdown(&deductions),
            vec![("DANNON", -100), ("UNILEVER", -200), ("MILLER COORS", -4700)]
        );
        assert_eq!(data.totals[&company("DANNON")], 1000);
        assert_eq!(data.totals[&company("UNILEVER")], 0);
        assert_eq!(data.totals[&company("MILLER COORS")], 5300);
        assert!(
            deductions
                .iter()
                .all(|d| d.deduction_date == date("11/03/20 09:00AM"))
        );
    }

    #[test]
    fn consumed_transactions_are_removed() {
        let mut data = sample();
        data.deduct(5000, date("11/03/20 09:00AM")).unwrap();

        let left: Vec<_> = data
            .transactions
            .iter()
            .map(|held| (held.company.0.as_str(), held.points))
            .collect();
        assert_eq!(left, vec![("MILLER COORS", 5300), ("DANNON", 1000)]);
    }

    #[test]
    fn exact_match_stops_allocation() {
        let mut data = LedgerData::new();
        data.accrue(company("X"), 40, date("01/01/20 10:00AM"))
            .unwrap();
        data.accrue(company("Y"), 60, date("01/02/20 10:00AM"))
            .unwrap();

        let deductions = data.deduct(40, date("03/01/20 10:00AM")).unwrap();

        assert_eq!(breakdown(&deductions), vec![("X", -40)]);
        assert_eq!(data.totals[&company("X")], 0);
        assert_eq!(data.totals[&company("Y")], 60);
        assert_eq!(data.transactions.len(), 1);
    }

    #[test]
    fn repeated_company_is_reported_once() {
        let mut data = LedgerData::new();
        data.accrue(company("X"), 10, date("01/01/20 10:00AM"))
            .unwrap();
        data.accrue(company("Y"), 10, date("01/02/20 10:00AM"))
            .unwrap();
        data.accrue(company("X"), 10, date("01/03/20 10:00AM"))
            .unwrap();

        let deductions = data.deduct(25, date("03/01/20 10:00AM")).unwrap();

        assert_eq!(breakdown(&deductions), vec![("X", -15), ("Y", -10)]);
    }

    #[test]
    fn deducting_everything_empties_ledger() {
        let mut data = sample();
        let total = data.total_points();

        let deductions = data
            .deduct(total as u64, date("11/03/20 09:00AM"))
            .unwrap();

        let sum: i64 = deductions.iter().map(|d| d.points_deducted).sum();
        assert_eq!(sum, -total);
        assert_eq!(data.total_points(), 0);
        assert!(data.transactions.is_empty());
        // Companies stay known with a zero balance.
        assert_eq!(data.totals.len(), 3);
    }

    #[test]
    fn exceeding_balance_is_rejected_without_mutation() {
        let mut data = LedgerData::new();
        data.accrue(company("X"), 40, date("01/01/20 10:00AM"))
            .unwrap();

        let result = data.deduct(50, date("03/01/20 10:00AM"));

        assert_eq!(result, Err(LedgerError::InvalidAdjustment));
        assert_eq!(data.totals[&company("X")], 40);
        assert_eq!(data.transactions[0].points, 40);
    }

    #[test]
    fn amount_beyond_i64_is_rejected() {
        let mut data = LedgerData::new();
        data.accrue(company("X"), 40, date("01/01/20 10:00AM"))
            .unwrap();

        let result = data.deduct(u64::MAX, date("03/01/20 10:00AM"));
        assert_eq!(result, Err(LedgerError::InvalidAdjustment));
    }

    #[test]
    fn zero_deduction_reports_first_eligible_company() {
        let mut data = sample();
        let before = data.transactions.clone();

        let deductions = data.deduct(0, date("11/03/20 09:00AM")).unwrap();

        assert_eq!(breakdown(&deductions), vec![("DANNON", 0)]);
        assert_eq!(data.transactions, before);
    }

    #[test]
    fn zero_deduction_without_eligible_company_is_empty() {
        let mut data = LedgerData::new();
        data.accrue(company("X"), 0, date("01/01/20 10:00AM"))
            .unwrap();

        let deductions = data.deduct(0, date("03/01/20 10:00AM")).unwrap();

        assert!(deductions.is_empty());
        // The zero-point record is purged.
        assert!(data.transactions.is_empty());
        assert_eq!(data.totals[&company("X")], 0);
    }

    #[test]
    fn zero_point_transaction_is_drawn_and_purged() {
        let mut data = LedgerData::new();
        data.accrue(company("X"), 0, date("11/15/19 10:00AM"))
            .unwrap();
        data.accrue(company("Y"), 50, date("12/01/19 10:00AM"))
            .unwrap();
        data.accrue(company("X"), 20, date("12/15/19 10:00AM"))
            .unwrap();

        let deductions = data.deduct(30, date("01/01/20 10:00AM")).unwrap();

        assert_eq!(breakdown(&deductions), vec![("X", 0), ("Y", -30)]);
        let held: Vec<_> = data
            .transactions
            .iter()
            .map(|t| (t.company.0.as_str(), t.points))
            .collect();
        assert_eq!(held, vec![("Y", 20), ("X", 20)]);
    }
}
