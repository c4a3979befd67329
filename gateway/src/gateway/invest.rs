use tracing::info;

use super::{parse_amount, ContractGateway};
use crate::error::Result;
use crate::schema::methods;
use crate::transport::Receipt;
use crate::types::TokenBalance;

impl ContractGateway {
    /// Amount the session account holds in the investment pool.
    pub async fn investment_balance(&self) -> Result<TokenBalance> {
        let session = self.ensure_session().await?;
        self.read_amount(
            &self.config.addresses.micro_investor,
            methods::USER_BALANCE,
            vec![session.account().into()],
        )
        .await
        .map(TokenBalance::from)
    }

    /// Approves the pool for `amount` and deposits it.
    pub async fn deposit_for_investment(&self, amount: &str) -> Result<Receipt> {
        let amount = parse_amount(amount, "deposit amount")?;
        let session = self.ensure_session().await?;
        let investor = &self.config.addresses.micro_investor;

        self.approve_with(&session, investor, amount).await?;
        let receipt = self
            .submit(
                &session,
                investor,
                methods::DEPOSIT,
                vec![session.account().into(), amount.into()],
            )
            .await?;
        info!(%amount, "investment deposited");
        Ok(receipt)
    }

    pub async fn withdraw_investment(&self, amount: &str) -> Result<Receipt> {
        let amount = parse_amount(amount, "withdrawal amount")?;
        let session = self.ensure_session().await?;

        self.submit(
            &session,
            &self.config.addresses.micro_investor,
            methods::WITHDRAW,
            vec![session.account().into(), amount.into()],
        )
        .await
    }
}
