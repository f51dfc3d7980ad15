//! Daily sales reconciliation.
//!
//! Reconciles a cashier's physically counted drawer against the cash the
//! shift's reported sales say should be there. The expected cash is the
//! cash-denominated sales in three categories (fuel, grocery, lottery)
//! reduced by cash-paid expenses that left the drawer during the shift;
//! the signed difference against the count is the variance:
//!
//! ```text
//! shortOver = counted - (gas + grocery + lottery - cashExpenses)
//! ```
//!
//! Positive means the drawer holds more than expected ("Over"), negative
//! means less ("Short"). The calculator is pure and total: it computes for
//! any input, including negative amounts, so the form can render a live
//! summary while the operator is still typing. Validation is a separate
//! concern (`validate`).

use serde::{Deserialize, Serialize};

use crate::money::Cents;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One shift's reported cash-related figures. All amounts are expected to be
/// non-negative; enforcement lives in [`crate::validate`], not here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftFigures {
    /// Cash sales attributable to fuel.
    pub gas_cash: Cents,
    /// Cash sales attributable to convenience/grocery items.
    pub grocery_cash: Cents,
    /// Lottery net (online) cash sales.
    pub lottery_net_sales: Cents,
    /// Scratch-off ticket cash sales.
    pub scratch_off_sales: Cents,
    /// Physically counted cash at shift end.
    pub cash_collection_on_hand: Cents,
    /// Sum of expense-ledger entries paid in cash.
    pub cash_expenses: Cents,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Sign classification of the variance. Exactly one applies to any result
/// (exact under integer cents — no epsilon).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawerStatus {
    Over,
    Short,
    Exact,
}

impl DrawerStatus {
    fn of(variance: Cents) -> DrawerStatus {
        if variance.is_positive() {
            DrawerStatus::Over
        } else if variance.is_negative() {
            DrawerStatus::Short
        } else {
            DrawerStatus::Exact
        }
    }

    /// Status label shown on the summary card.
    pub fn label(self) -> &'static str {
        match self {
            DrawerStatus::Over => "Over",
            DrawerStatus::Short => "Short",
            DrawerStatus::Exact => "Exact",
        }
    }

    /// Color tag the UI maps to its theme.
    pub fn color(self) -> &'static str {
        match self {
            DrawerStatus::Over => "green",
            DrawerStatus::Short => "red",
            DrawerStatus::Exact => "blue",
        }
    }
}

/// Derived reconciliation breakdown. Recomputed on every input change and
/// never persisted on its own — only the input figures go into a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    /// `lotteryNetSales + scratchOffSales`.
    pub lottery_total_cash: Cents,
    /// `gasCash + groceryCash + lotteryTotalCash`.
    pub total_cash_from_sales: Cents,
    /// Signed variance: counted minus expected.
    pub total_short_over: Cents,
    pub status: DrawerStatus,
    /// `totalShortOver` with an explicit sign prefix, e.g. `"+$10.00"`.
    pub display_amount: String,
}

impl ReconciliationResult {
    pub fn is_over(&self) -> bool {
        self.status == DrawerStatus::Over
    }

    pub fn is_short(&self) -> bool {
        self.status == DrawerStatus::Short
    }

    pub fn is_exact(&self) -> bool {
        self.status == DrawerStatus::Exact
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Compute the short/over breakdown for one shift.
///
/// Pure function of its input: no state, no I/O, no clock. Cheap enough to
/// run on every change event without debouncing.
pub fn reconcile(figures: &ShiftFigures) -> ReconciliationResult {
    let lottery_total_cash = figures.lottery_net_sales + figures.scratch_off_sales;
    let total_cash_from_sales = figures.gas_cash + figures.grocery_cash + lottery_total_cash;
    let expected_cash = total_cash_from_sales - figures.cash_expenses;
    let total_short_over = figures.cash_collection_on_hand - expected_cash;

    let status = DrawerStatus::of(total_short_over);

    ReconciliationResult {
        lottery_total_cash,
        total_cash_from_sales,
        total_short_over,
        status,
        display_amount: total_short_over.format_signed(),
    }
}

// ---------------------------------------------------------------------------
// Expense ledger
// ---------------------------------------------------------------------------

/// Payment method of an expense-ledger entry. Only `Cash` entries leave the
/// drawer, so only they feed `cashExpenses`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
    Check,
    Other,
}

/// A single expense recorded during the shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseEntry {
    pub description: String,
    pub amount: Cents,
    pub payment_method: PaymentMethod,
}

/// Sum the cash-paid entries of an expense ledger. Entries paid by card,
/// check, or anything else never touched the drawer and are excluded.
pub fn cash_expense_total(entries: &[ExpenseEntry]) -> Cents {
    entries
        .iter()
        .filter(|e| e.payment_method == PaymentMethod::Cash)
        .map(|e| e.amount)
        .sum()
}

// ===========================================================================
// Tests
// ===========================================================================
