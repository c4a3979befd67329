use tracing::info;

use super::{parse_amount, require_text, ContractGateway};
use crate::config::ContractKind;
use crate::error::Result;
use crate::model::SavingsPool;
use crate::schema::methods;
use crate::transport::Receipt;
use crate::types::{TokenAmount, Value};

impl ContractGateway {
    /// All community pools. Pools with an empty name are dropped.
    pub async fn savings_pools(&self) -> Result<Vec<SavingsPool>> {
        let session = self.ensure_session().await?;
        let pools = self
            .enumerate(
                ContractKind::CommunitySavings,
                &self.profile.pools,
                session.account(),
                SavingsPool::from_record,
            )
            .await?;
        Ok(pools.into_iter().filter(SavingsPool::is_valid).collect())
    }

    pub async fn create_pool(&self, name: &str, goal: &str) -> Result<Receipt> {
        let name = require_text(name, "pool name")?;
        let goal = parse_amount(goal, "savings goal")?;
        let session = self.ensure_session().await?;

        let receipt = self
            .submit(
                &session,
                &self.config.addresses.community_savings,
                methods::CREATE_POOL,
                vec![session.account().into(), Value::Text(name.clone()), goal.into()],
            )
            .await?;
        info!(%name, %goal, "savings pool created");
        Ok(receipt)
    }

    /// Approves the pool for `amount` and contributes it.
    pub async fn contribute(&self, pool_id: u32, amount: &str) -> Result<Receipt> {
        let amount = parse_amount(amount, "contribution")?;
        let session = self.ensure_session().await?;
        let savings = &self.config.addresses.community_savings;

        self.approve_with(&session, savings, amount).await?;
        self.submit(
            &session,
            savings,
            methods::CONTRIBUTE,
            vec![session.account().into(), Value::U32(pool_id), amount.into()],
        )
        .await
    }

    /// Closes a pool the session account created; the balance goes to it.
    pub async fn close_pool(&self, pool_id: u32) -> Result<Receipt> {
        let session = self.ensure_session().await?;
        self.submit(
            &session,
            &self.config.addresses.community_savings,
            methods::CLOSE_POOL,
            vec![session.account().into(), Value::U32(pool_id)],
        )
        .await
    }

    /// How much the session account has put into `pool_id`.
    pub async fn my_contribution(&self, pool_id: u32) -> Result<TokenAmount> {
        let session = self.ensure_session().await?;
        self.read_amount(
            &self.config.addresses.community_savings,
            methods::CONTRIBUTION_OF,
            vec![Value::U32(pool_id), session.account().into()],
        )
        .await
    }
}
