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

//! # Points Ledger
//!
//! This library keeps a per-user loyalty points ledger: users accrue points
//! from several issuing companies and later spend them, oldest transaction
//! first, across all companies.
//!
//! ## Core Components
//!
//! - [`LedgerStore`]: Entry point owning every user ledger
//! - [`UserLedger`]: Per-company totals and unconsumed accruals of one user
//! - [`AccrualTransaction`] / [`Deduction`]: Ledger records
//! - [`LedgerError`]: Error types for rejected operations
//! - [`api`]: REST adapter over the store
//!
//! ## Example
//!
//! ```
//! use points_ledger_rs::{CompanyId, LedgerStore, UserId};
//!
//! let store = LedgerStore::new();
//! let user = UserId::new("alice");
//!
//! store
//!     .accrue(&user, CompanyId::new("DANNON"), 300, "10/31/20 10:00AM".parse().unwrap())
//!     .unwrap();
//! store
//!     .accrue(&user, CompanyId::new("UNILEVER"), 200, "10/31/20 11:00AM".parse().unwrap())
//!     .unwrap();
//!
//! // Oldest points go first: all of DANNON, then some of UNILEVER.
//! let deductions = store.deduct(&user, 400).unwrap();
//! assert_eq!(deductions[0].points_deducted, -300);
//! assert_eq!(deductions[1].points_deducted, -100);
//!
//! let balance = store.balance(&user).unwrap();
//! assert_eq!(balance[&CompanyId::new("UNILEVER")], 100);
//! ```
//!
//! ## Thread Safety
//!
//! Each user ledger is guarded by its own lock, so operations on different
//! users are processed in parallel while operations on one user are serialized.

mod accrual;
pub mod api;
mod base;
mod deduction;
pub mod error;
mod ledger;
mod store;
mod transaction;

pub use base::{CompanyId, TransactionDate, UserId};
pub use error::LedgerError;
pub use ledger::UserLedger;
pub use store::LedgerStore;
pub use transaction::{AccrualTransaction, Deduction, LedgerEvent};
