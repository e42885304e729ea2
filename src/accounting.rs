use std::sync::Mutex;

use rust_decimal::Decimal;
use serde::Serialize;

/// Process-scoped running totals of what a run has paid so far.
///
/// Mutated once per terminal successful call; failed or retried attempts
/// cost nothing and are never recorded. Interior mutability so the paired
/// fan-out can share one instance through `&self`.
#[derive(Debug, Default)]
pub struct RunAccounting {
    totals: Mutex<Totals>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    total_cost: Decimal,
    call_count: u64,
}

impl RunAccounting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one settled call to the running totals.
    pub fn record(&self, price: Decimal) {
        let mut totals = self.totals.lock().unwrap_or_else(|e| e.into_inner());
        totals.total_cost += price;
        totals.call_count += 1;
    }

    /// Snapshot for end-of-run reporting. Read-only.
    pub fn summary(&self) -> CostSummary {
        let totals = self.totals.lock().unwrap_or_else(|e| e.into_inner());
        CostSummary {
            timestamp: chrono::Utc::now().to_rfc3339(),
            total_cost: totals.total_cost,
            call_count: totals.call_count,
        }
    }
}

/// End-of-run cost breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct CostSummary {
    pub timestamp: String,
    pub total_cost: Decimal,
    pub call_count: u64,
}
