//! Simple REST API server example for the points ledger.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `PUT /{user}/add` - Accrue points for a user
//! - `PUT /{user}/deduct/{amount}` - Deduct points, oldest first
//! - `GET /{user}/balance` - Per-company balance of a user
//!
//! ## Example Usage
//!
//! ```bash
//! # Accrue
//! curl -X PUT http://localhost:3000/alice/add \
//!   -H "Content-Type: application/json" \
//!   -d '{"company": "DANNON", "points": 300, "transactionDate": "10/31/20 10:00AM"}'
//!
//! # Correct a previous grant
//! curl -X PUT http://localhost:3000/alice/add \
//!   -H "Content-Type: application/json" \
//!   -d '{"company": "DANNON", "points": -200, "transactionDate": "10/31/20 03:00PM"}'
//!
//! # Deduct
//! curl -X PUT http://localhost:3000/alice/deduct/50
//!
//! # Balance
//! curl http://localhost:3000/alice/balance
//! ```

use points_ledger_rs::{LedgerStore, api};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("points_ledger_rs=debug"))
        .init();

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    println!("Points ledger API server running on http://{}", addr);
    println!();
    println!("Endpoints:");
    println!("  PUT /{{user}}/add               - Accrue points");
    println!("  PUT /{{user}}/deduct/{{amount}}   - Deduct points");
    println!("  GET /{{user}}/balance           - Per-company balance");

    api::serve(Arc::new(LedgerStore::new()), addr).await
}
