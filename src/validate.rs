//! Pre-submission validation of shift figures.
//!
//! Checked by the UI before it allows the report to be submitted. The
//! calculator never consults this — it stays total so live summaries work
//! on half-typed input.

use crate::money::Cents;
use crate::reconcile::ShiftFigures;

/// Check every amount for negativity and return one operator-facing message
/// per violated field. Empty means valid.
pub fn validate(figures: &ShiftFigures) -> Vec<String> {
    let checks: [(Cents, &str); 6] = [
        (figures.gas_cash, "Gas cash sales cannot be negative"),
        (figures.grocery_cash, "Grocery cash sales cannot be negative"),
        (
            figures.lottery_net_sales,
            "Lottery net sales cannot be negative",
        ),
        (
            figures.scratch_off_sales,
            "Scratch-off sales cannot be negative",
        ),
        (
            figures.cash_collection_on_hand,
            "Cash collection on hand cannot be negative",
        ),
        (figures.cash_expenses, "Cash expenses cannot be negative"),
    ];

    checks
        .into_iter()
        .filter(|(amount, _)| amount.is_negative())
        .map(|(_, message)| message.to_string())
        .collect()
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_figures_produce_no_errors() {
        let figures = ShiftFigures {
            gas_cash: Cents::from_dollars(100.0),
            grocery_cash: Cents::from_dollars(50.0),
            ..Default::default()
        };
        assert!(validate(&figures).is_empty());
    }

    #[test]
    fn test_zero_is_valid() {
        assert!(validate(&ShiftFigures::default()).is_empty());
    }

    #[test]
    fn test_each_negative_field_reports_once() {
        let figures = ShiftFigures {
            gas_cash: Cents::from_dollars(-1.0),
            cash_expenses: Cents::from_dollars(-0.01),
            ..Default::default()
        };
        let errors = validate(&figures);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("Gas cash"));
        assert!(errors[1].contains("Cash expenses"));
    }

    #[test]
    fn test_all_fields_negative() {
        let figures = ShiftFigures {
            gas_cash: Cents::from_cents(-1),
            grocery_cash: Cents::from_cents(-1),
            lottery_net_sales: Cents::from_cents(-1),
            scratch_off_sales: Cents::from_cents(-1),
            cash_collection_on_hand: Cents::from_cents(-1),
            cash_expenses: Cents::from_cents(-1),
        };
        assert_eq!(validate(&figures).len(), 6);
    }
}
