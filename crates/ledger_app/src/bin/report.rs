//! Ledger report binary
//!
//! Prints a report from the configured ledger store as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Balance of every customer
//! LEDGER_STORE=postgres LEDGER_DATABASE_URL=postgres://... cargo run --bin ledger-report
//!
//! # Owner bill for one business day
//! cargo run --bin ledger-report -- 2024-01-03
//! ```
//!
//! # Environment Variables
//!
//! * `LEDGER_STORE` - `memory` or `postgres` (default: memory)
//! * `LEDGER_DATABASE_URL` - PostgreSQL connection string
//! * `LEDGER_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `LEDGER_LOG_LEVEL` - Log filter when RUST_LOG is unset (default: info)
//! * `LEDGER_LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! * `LEDGER_BUSINESS_TIMEZONE` - IANA timezone of the business day (default: UTC)

use domain_ledger::{DayBillRequest, LedgerError};
use ledger_app::{ErrorResponse, LedgerApp};
use serde::Serialize;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = LedgerApp::bootstrap().await?;

    let health = app.health().await;
    tracing::info!(adapter = %health.adapter_id, status = ?health.status, "Store ready");

    let result = match std::env::args().nth(1) {
        Some(date) => {
            let request = DayBillRequest::on(date);
            render(app.service().bills().owner_bill(&request).await)
        }
        None => render(app.service().customers().balance_report().await),
    };

    match result {
        Ok(body) => {
            println!("{}", body);
            Ok(())
        }
        Err(response) => {
            eprintln!("{}", serde_json::to_string_pretty(&response)?);
            std::process::exit(1);
        }
    }
}

fn render<T: Serialize>(result: Result<T, LedgerError>) -> Result<String, ErrorResponse> {
    let value = result.map_err(ErrorResponse::from)?;
    serde_json::to_string_pretty(&value).map_err(|e| ErrorResponse {
        error: "internal_error".to_string(),
        message: e.to_string(),
        class: ledger_app::ErrorClass::Server,
    })
}
