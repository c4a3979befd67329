//! Screen view-models
//!
//! Each view borrows the [`ContractGateway`](crate::ContractGateway), keeps
//! its own form inputs and fetched lists, and reports failures as a
//! [`Notice`] instead of returning errors. Lists are refreshed only when the
//! caller asks; writes never trigger a reload.
//!
//! Async actions are tracked per name by [`ActionTracker`]. Starting an
//! action that is already in flight is a no-op, so a second refresh issued
//! while the first is still loading does not fetch again.

mod budget;
mod fraud;
mod investment;
mod microloans;
mod savings;

use std::cell::RefCell;
use std::collections::BTreeSet;

use tracing::debug;

use crate::error::GatewayError;

pub use budget::{BudgetDashboard, BudgetSummary, ExpenseForm, NewBudgetForm};
pub use fraud::{
    FraudAlert, FraudAnalytics, FraudSummary, RiskLevel, RiskPoint, Severity, SyntheticTransaction,
};
pub use investment::InvestmentPortal;
pub use microloans::{MicroloansView, OfferForm};
pub use savings::{NewPoolForm, SavingsView};

/// Message shown after an action completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Error(m) => m,
        }
    }
}

impl From<&GatewayError> for Notice {
    fn from(err: &GatewayError) -> Self {
        Notice::Error(err.to_string())
    }
}

/// In-flight flags keyed by action name.
#[derive(Debug, Default)]
pub struct ActionTracker {
    in_flight: RefCell<BTreeSet<String>>,
}

impl ActionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `action` as running. Returns `None` if it already is; the
    /// caller should drop the request. The flag clears when the guard drops.
    pub fn begin(&self, action: impl Into<String>) -> Option<ActionGuard<'_>> {
        let action = action.into();
        if !self.in_flight.borrow_mut().insert(action.clone()) {
            debug!(action = %action, "already in flight, dropping request");
            return None;
        }
        Some(ActionGuard {
            tracker: self,
            action,
        })
    }

    pub fn is_loading(&self, action: &str) -> bool {
        self.in_flight.borrow().contains(action)
    }

    pub fn any_loading(&self) -> bool {
        !self.in_flight.borrow().is_empty()
    }
}

/// Clears its action's loading flag on drop.
#[derive(Debug)]
pub struct ActionGuard<'a> {
    tracker: &'a ActionTracker,
    action: String,
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        self.tracker.in_flight.borrow_mut().remove(&self.action);
    }
}

/// Latest notice for a view, replaced by each completed action.
#[derive(Debug, Default)]
pub(crate) struct NoticeSlot(RefCell<Option<Notice>>);

impl NoticeSlot {
    pub(crate) fn success(&self, message: impl Into<String>) {
        *self.0.borrow_mut() = Some(Notice::Success(message.into()));
    }

    /// Records `err` as "`context`: message".
    pub(crate) fn failure(&self, context: &str, err: &GatewayError) {
        *self.0.borrow_mut() = Some(Notice::Error(format!("{}: {}", context, err)));
    }

    pub(crate) fn get(&self) -> Option<Notice> {
        self.0.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.0.borrow_mut().take();
    }
}
