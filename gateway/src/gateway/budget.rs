use tracing::info;

use super::{parse_amount, require_text, ContractGateway};
use crate::config::ContractKind;
use crate::error::Result;
use crate::model::Budget;
use crate::schema::methods;
use crate::transport::Receipt;
use crate::types::Value;

impl ContractGateway {
    /// Budgets of the session account. Entries with an empty category are
    /// dropped.
    pub async fn budgets(&self) -> Result<Vec<Budget>> {
        let session = self.ensure_session().await?;
        let budgets = self
            .enumerate(
                ContractKind::BudgetManager,
                &self.profile.budgets,
                session.account(),
                Budget::from_record,
            )
            .await?;
        Ok(budgets.into_iter().filter(Budget::is_valid).collect())
    }

    pub async fn create_budget(&self, category: &str, limit: &str) -> Result<Receipt> {
        let category = require_text(category, "category")?;
        let limit = parse_amount(limit, "budget limit")?;
        let session = self.ensure_session().await?;

        let receipt = self
            .submit(
                &session,
                &self.config.addresses.budget_manager,
                methods::CREATE_BUDGET,
                vec![
                    session.account().into(),
                    Value::Text(category.clone()),
                    limit.into(),
                ],
            )
            .await?;
        info!(%category, %limit, "budget created");
        Ok(receipt)
    }

    pub async fn record_expense(&self, budget_id: u32, amount: &str) -> Result<Receipt> {
        let amount = parse_amount(amount, "expense amount")?;
        let session = self.ensure_session().await?;

        self.submit(
            &session,
            &self.config.addresses.budget_manager,
            methods::RECORD_EXPENSE,
            vec![
                session.account().into(),
                Value::U32(budget_id),
                amount.into(),
            ],
        )
        .await
    }

    pub async fn update_budget_limit(&self, budget_id: u32, limit: &str) -> Result<Receipt> {
        let limit = parse_amount(limit, "budget limit")?;
        let session = self.ensure_session().await?;

        self.submit(
            &session,
            &self.config.addresses.budget_manager,
            methods::UPDATE_LIMIT,
            vec![
                session.account().into(),
                Value::U32(budget_id),
                limit.into(),
            ],
        )
        .await
    }
}
