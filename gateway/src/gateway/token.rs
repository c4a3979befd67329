use tracing::{debug, info, warn};

use super::ContractGateway;
use crate::error::{GatewayError, Result};
use crate::schema::methods;
use crate::transport::Receipt;
use crate::types::{Address, Shape, TokenAmount, TokenBalance};

/// Result of a faucet request.
#[derive(Clone, Debug)]
pub struct FaucetOutcome {
    pub receipt: Receipt,
    pub balance_before: TokenAmount,
    pub balance_after: TokenAmount,
}

impl FaucetOutcome {
    /// Whether the re-read balance shows the tokens.
    pub fn credited(&self) -> bool {
        self.balance_after > self.balance_before
    }
}

impl ContractGateway {
    pub async fn token_balance(&self) -> Result<TokenBalance> {
        let session = self.ensure_session().await?;
        self.balance_of(session.account()).await.map(TokenBalance::from)
    }

    /// Allowance the session account has granted `spender`.
    pub async fn allowance(&self, spender: &Address) -> Result<TokenAmount> {
        let session = self.ensure_session().await?;
        self.allowance_of(session.account(), spender).await
    }

    /// Sets the session account's allowance for `spender` to exactly
    /// `amount`, verifying the result.
    pub async fn approve_exact(&self, spender: &Address, amount: TokenAmount) -> Result<()> {
        let session = self.ensure_session().await?;
        self.approve_with(&session, spender, amount).await
    }

    /// Claims test tokens from the faucet.
    ///
    /// The cooldown is checked against chain time before anything is
    /// signed. After confirmation the balance is re-read once the settle
    /// delay has passed.
    pub async fn request_test_tokens(&self) -> Result<FaucetOutcome> {
        let session = self.ensure_session().await?;
        let account = session.account();
        let token = &self.config.addresses.test_token;

        let balance_before = self.balance_of(account).await?;
        self.check_faucet_cooldown(account).await?;

        let receipt = self
            .submit(&session, token, methods::FAUCET, vec![account.into()])
            .await?;

        if !self.config.settle_delay.is_zero() {
            tokio::time::sleep(self.config.settle_delay).await;
        }

        let balance_after = self.balance_of(account).await?;
        let outcome = FaucetOutcome {
            receipt,
            balance_before,
            balance_after,
        };
        if outcome.credited() {
            info!(before = %balance_before, after = %balance_after, "faucet tokens received");
        } else {
            warn!(balance = %balance_after, "faucet confirmed but balance did not increase");
        }
        Ok(outcome)
    }

    async fn check_faucet_cooldown(&self, account: &Address) -> Result<()> {
        let last = match self
            .read(
                &self.config.addresses.test_token,
                methods::LAST_FAUCET_TIME,
                vec![account.into()],
                Shape::U64,
            )
            .await
        {
            Ok(value) => value.as_u64().unwrap_or(0),
            Err(e) => {
                warn!("could not read last faucet time: {}", e);
                return Ok(());
            }
        };
        if last == 0 {
            return Ok(());
        }

        let now = self
            .transport
            .latest_timestamp()
            .await
            .map_err(GatewayError::Read)?;
        let ready_at = last.saturating_add(self.config.faucet_cooldown.as_secs());
        if now < ready_at {
            let minutes = (ready_at - now).div_ceil(60);
            debug!(last, now, minutes, "faucet still cooling down");
            return Err(GatewayError::FaucetCooldown { minutes });
        }
        Ok(())
    }

    pub(super) async fn balance_of(&self, account: &Address) -> Result<TokenAmount> {
        self.read_amount(
            &self.config.addresses.test_token,
            methods::BALANCE,
            vec![account.into()],
        )
        .await
    }
}
