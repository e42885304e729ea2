use crate::accounting::CostSummary;
use crate::types::CallResult;

/// Print one labelled result block: pretty JSON payload plus the price line.
pub fn report_result(label: &str, result: &CallResult) {
    println!("--- {label} ---");
    if let Ok(json) = serde_json::to_string_pretty(&result.data) {
        println!("{json}");
    }
    match &result.settlement {
        Some(receipt) => println!("paid {} (settlement {})", result.price, short(receipt)),
        None => println!("paid {}", result.price),
    }
    println!();
}

/// Marker for a branch or plan that produced nothing.
pub fn report_missing(label: &str) {
    println!("--- {label} ---");
    println!("(no result)");
    println!();
}

/// Emit the end-of-run cost breakdown.
pub fn report_cost_summary(summary: &CostSummary) {
    println!("=== Cost summary ===");
    println!("calls:      {}", summary.call_count);
    println!("total paid: {}", summary.total_cost);
}

/// Settlement receipts are base64 blobs; keep the console line readable.
fn short(receipt: &str) -> String {
    if receipt.len() <= 24 {
        receipt.to_string()
    } else {
        format!("{}…", &receipt[..24])
    }
}
