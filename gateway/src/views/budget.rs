use std::cell::{Ref, RefCell, RefMut};

use serde::Serialize;
use tracing::info;

use super::{ActionTracker, Notice, NoticeSlot};
use crate::gateway::ContractGateway;
use crate::model::Budget;
use crate::types::TokenAmount;

const REFRESH: &str = "budgets";
const CREATE: &str = "create-budget";
const EXPENSE: &str = "record-expense";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewBudgetForm {
    pub category: String,
    pub limit: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpenseForm {
    pub budget_id: Option<u32>,
    pub amount: String,
}

/// Totals across the loaded budgets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BudgetSummary {
    pub budgets: usize,
    pub total_limit: TokenAmount,
    pub total_spent: TokenAmount,
    pub over_limit: usize,
}

/// Budget list with create-budget and record-expense forms.
pub struct BudgetDashboard<'g> {
    gateway: &'g ContractGateway,
    budgets: RefCell<Vec<Budget>>,
    new_budget: RefCell<NewBudgetForm>,
    expense: RefCell<ExpenseForm>,
    actions: ActionTracker,
    notice: NoticeSlot,
}

impl<'g> BudgetDashboard<'g> {
    pub fn new(gateway: &'g ContractGateway) -> Self {
        BudgetDashboard {
            gateway,
            budgets: RefCell::new(Vec::new()),
            new_budget: RefCell::new(NewBudgetForm::default()),
            expense: RefCell::new(ExpenseForm::default()),
            actions: ActionTracker::new(),
            notice: NoticeSlot::default(),
        }
    }

    pub fn budgets(&self) -> Ref<'_, Vec<Budget>> {
        self.budgets.borrow()
    }

    pub fn new_budget_form(&self) -> RefMut<'_, NewBudgetForm> {
        self.new_budget.borrow_mut()
    }

    pub fn expense_form(&self) -> RefMut<'_, ExpenseForm> {
        self.expense.borrow_mut()
    }

    pub fn actions(&self) -> &ActionTracker {
        &self.actions
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice.get()
    }

    pub fn dismiss_notice(&self) {
        self.notice.clear();
    }

    /// Reloads the budget list. Returns `false` when a reload was already
    /// running and this one was dropped.
    pub async fn refresh(&self) -> bool {
        let Some(_guard) = self.actions.begin(REFRESH) else {
            return false;
        };
        match self.gateway.budgets().await {
            Ok(budgets) => {
                *self.budgets.borrow_mut() = budgets;
            }
            Err(e) => self.notice.failure("Failed to load budgets", &e),
        }
        true
    }

    /// Submits the create-budget form. The form is cleared on success; the
    /// list is not reloaded.
    pub async fn create_budget(&self) -> bool {
        let Some(_guard) = self.actions.begin(CREATE) else {
            return false;
        };
        let form = self.new_budget.borrow().clone();
        match self.gateway.create_budget(&form.category, &form.limit).await {
            Ok(receipt) => {
                info!(category = %form.category, tx = %receipt.tx_hash, "budget created");
                *self.new_budget.borrow_mut() = NewBudgetForm::default();
                self.notice.success(format!("Budget '{}' created", form.category.trim()));
                true
            }
            Err(e) => {
                self.notice.failure("Failed to create budget", &e);
                false
            }
        }
    }

    /// Submits the record-expense form against the selected budget.
    pub async fn record_expense(&self) -> bool {
        let Some(_guard) = self.actions.begin(EXPENSE) else {
            return false;
        };
        let form = self.expense.borrow().clone();
        let Some(budget_id) = form.budget_id else {
            self.notice.failure(
                "Failed to record expense",
                &crate::GatewayError::Validation("Please select a budget".to_string()),
            );
            return false;
        };
        match self.gateway.record_expense(budget_id, &form.amount).await {
            Ok(_) => {
                self.expense.borrow_mut().amount.clear();
                self.notice.success("Expense recorded");
                true
            }
            Err(e) => {
                self.notice.failure("Failed to record expense", &e);
                false
            }
        }
    }

    pub fn summary(&self) -> BudgetSummary {
        let budgets = self.budgets.borrow();
        BudgetSummary {
            budgets: budgets.len(),
            total_limit: budgets
                .iter()
                .fold(TokenAmount::ZERO, |acc, b| acc.saturating_add(b.limit)),
            total_spent: budgets
                .iter()
                .fold(TokenAmount::ZERO, |acc, b| acc.saturating_add(b.spent)),
            over_limit: budgets.iter().filter(|b| b.is_over_limit()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{self, MockTransport};
    use crate::types::Value;

    fn budget(limit: i64, spent: i64, category: &str) -> Value {
        Value::Tuple(vec![
            Value::I128(TokenAmount::tokens(limit).minor()),
            Value::I128(TokenAmount::tokens(spent).minor()),
            Value::U64(0),
            Value::Text(category.to_string()),
        ])
    }

    #[tokio::test]
    async fn test_concurrent_refresh_fetches_once() {
        let transport = MockTransport::new();
        transport.returns("user_budget_count", Value::U32(2));
        transport.returns("get_budget", budget(100, 30, "Food"));
        let (gateway, _) = mock::gateway(&transport);
        let view = BudgetDashboard::new(&gateway);

        let (first, second) = tokio::join!(view.refresh(), view.refresh());
        assert!(first);
        assert!(!second);
        assert_eq!(transport.count("call:user_budget_count"), 1);
        assert_eq!(transport.count("call:get_budget"), 2);
        assert_eq!(view.budgets().len(), 2);
        assert!(!view.actions().is_loading("budgets"));

        // Once settled, a new refresh runs again.
        assert!(view.refresh().await);
        assert_eq!(transport.count("call:user_budget_count"), 2);
    }

    #[tokio::test]
    async fn test_create_does_not_reload() {
        let transport = MockTransport::new();
        let (gateway, _) = mock::gateway(&transport);
        let view = BudgetDashboard::new(&gateway);

        {
            let mut form = view.new_budget_form();
            form.category = "Food".to_string();
            form.limit = "100".to_string();
        }
        assert!(view.create_budget().await);
        assert_eq!(transport.sent(), vec!["create_budget"]);
        assert_eq!(transport.count("call:user_budget_count"), 0);
        assert_eq!(*view.new_budget_form(), NewBudgetForm::default());
        assert_eq!(
            view.notice(),
            Some(Notice::Success("Budget 'Food' created".to_string()))
        );
    }

    #[tokio::test]
    async fn test_failures_become_notices() {
        let transport = MockTransport::new();
        let (gateway, _) = mock::gateway(&transport);
        let view = BudgetDashboard::new(&gateway);

        assert!(!view.record_expense().await);
        assert_eq!(
            view.notice().unwrap().message(),
            "Failed to record expense: Please select a budget"
        );

        view.expense_form().budget_id = Some(0);
        view.expense_form().amount = "-3".to_string();
        assert!(!view.record_expense().await);
        assert!(view.notice().unwrap().is_error());
        assert!(transport.log().is_empty());

        // No count accessor answers.
        assert!(view.refresh().await);
        assert!(view
            .notice()
            .unwrap()
            .message()
            .starts_with("Failed to load budgets"));
    }

    #[tokio::test]
    async fn test_summary_totals() {
        let transport = MockTransport::new();
        transport.returns("user_budget_count", Value::U32(1));
        transport.returns("get_budget", budget(100, 130, "Food"));
        let (gateway, _) = mock::gateway(&transport);
        let view = BudgetDashboard::new(&gateway);

        view.refresh().await;
        let summary = view.summary();
        assert_eq!(summary.budgets, 1);
        assert_eq!(summary.total_limit, TokenAmount::tokens(100));
        assert_eq!(summary.total_spent, TokenAmount::tokens(130));
        assert_eq!(summary.over_limit, 1);
    }
}
