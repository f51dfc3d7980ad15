//! Handoff to the report submission collaborator.
//!
//! The daily-report record itself is created by the hosted table API, which
//! lives outside this crate. Before the UI submits, it copies the
//! calculator's derived fields into the record; after a successful
//! submission it deletes the draft for the same `(station, date)` key via
//! [`crate::DraftStore::delete_draft`].

use serde_json::{json, Value};

use crate::reconcile::ReconciliationResult;

/// Copy the derived reconciliation fields into a report record, overwriting
/// any stale values. Non-object records are left untouched.
pub fn apply_to_report(result: &ReconciliationResult, record: &mut Value) {
    let Some(fields) = record.as_object_mut() else {
        return;
    };
    fields.insert(
        "totalShortOver".to_string(),
        json!(result.total_short_over.to_dollars()),
    );
    fields.insert(
        "totalCashFromSales".to_string(),
        json!(result.total_cash_from_sales.to_dollars()),
    );
    fields.insert(
        "lotteryTotalCash".to_string(),
        json!(result.lottery_total_cash.to_dollars()),
    );
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Cents;
    use crate::reconcile::{reconcile, ShiftFigures};

    #[test]
    fn test_derived_fields_copied_into_record() {
        let result = reconcile(&ShiftFigures {
            gas_cash: Cents::from_dollars(100.0),
            grocery_cash: Cents::from_dollars(50.0),
            lottery_net_sales: Cents::from_dollars(20.0),
            scratch_off_sales: Cents::from_dollars(5.0),
            cash_collection_on_hand: Cents::from_dollars(180.0),
            cash_expenses: Cents::from_dollars(10.0),
        });

        let mut record = json!({
            "station": "station-12",
            "reportDate": "2025-06-01",
            "totalShortOver": 999.0,
        });
        apply_to_report(&result, &mut record);

        assert_eq!(record["totalShortOver"], json!(15.0));
        assert_eq!(record["totalCashFromSales"], json!(175.0));
        assert_eq!(record["lotteryTotalCash"], json!(25.0));
        // Untouched fields survive
        assert_eq!(record["station"], json!("station-12"));
    }

    #[test]
    fn test_non_object_record_is_ignored() {
        let result = reconcile(&ShiftFigures::default());
        let mut record = json!("not an object");
        apply_to_report(&result, &mut record);
        assert_eq!(record, json!("not an object"));
    }
}
