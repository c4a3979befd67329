use std::cell::RefCell;

use super::{ActionTracker, Notice, NoticeSlot};
use crate::error::GatewayError;
use crate::gateway::ContractGateway;
use crate::types::TokenBalance;

const BALANCES: &str = "balances";
const DEPOSIT: &str = "deposit";
const WITHDRAW: &str = "withdraw";
const FAUCET: &str = "get-tokens";

/// Token and investment balances with deposit, withdraw and faucet actions.
pub struct InvestmentPortal<'g> {
    gateway: &'g ContractGateway,
    token_balance: RefCell<Option<TokenBalance>>,
    invested: RefCell<Option<TokenBalance>>,
    deposit_amount: RefCell<String>,
    withdraw_amount: RefCell<String>,
    actions: ActionTracker,
    notice: NoticeSlot,
}

impl<'g> InvestmentPortal<'g> {
    pub fn new(gateway: &'g ContractGateway) -> Self {
        InvestmentPortal {
            gateway,
            token_balance: RefCell::new(None),
            invested: RefCell::new(None),
            deposit_amount: RefCell::new(String::new()),
            withdraw_amount: RefCell::new(String::new()),
            actions: ActionTracker::new(),
            notice: NoticeSlot::default(),
        }
    }

    pub fn token_balance(&self) -> Option<TokenBalance> {
        self.token_balance.borrow().clone()
    }

    pub fn invested(&self) -> Option<TokenBalance> {
        self.invested.borrow().clone()
    }

    pub fn set_deposit_amount(&self, amount: impl Into<String>) {
        *self.deposit_amount.borrow_mut() = amount.into();
    }

    pub fn set_withdraw_amount(&self, amount: impl Into<String>) {
        *self.withdraw_amount.borrow_mut() = amount.into();
    }

    pub fn actions(&self) -> &ActionTracker {
        &self.actions
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice.get()
    }

    pub async fn refresh(&self) -> bool {
        let Some(_guard) = self.actions.begin(BALANCES) else {
            return false;
        };
        match self.gateway.investment_balance().await {
            Ok(balance) => *self.invested.borrow_mut() = Some(balance),
            Err(e) => self.notice.failure("Failed to load investment balance", &e),
        }
        match self.gateway.token_balance().await {
            Ok(balance) => *self.token_balance.borrow_mut() = Some(balance),
            Err(e) => self.notice.failure("Failed to load token balance", &e),
        }
        true
    }

    /// Approves and deposits the entered amount.
    pub async fn deposit(&self) -> bool {
        let Some(_guard) = self.actions.begin(DEPOSIT) else {
            return false;
        };
        let amount = self.deposit_amount.borrow().clone();
        match self.gateway.deposit_for_investment(&amount).await {
            Ok(_) => {
                self.deposit_amount.borrow_mut().clear();
                self.notice.success(format!("Deposited {} tokens", amount.trim()));
                true
            }
            Err(e) => {
                self.notice.failure("Failed to deposit", &e);
                false
            }
        }
    }

    pub async fn withdraw(&self) -> bool {
        let Some(_guard) = self.actions.begin(WITHDRAW) else {
            return false;
        };
        let amount = self.withdraw_amount.borrow().clone();
        match self.gateway.withdraw_investment(&amount).await {
            Ok(_) => {
                self.withdraw_amount.borrow_mut().clear();
                self.notice.success(format!("Withdrew {} tokens", amount.trim()));
                true
            }
            Err(e) => {
                self.notice.failure("Failed to withdraw", &e);
                false
            }
        }
    }

    /// Requests faucet tokens. The token balance shown is the one re-read
    /// after the settle delay.
    pub async fn get_test_tokens(&self) -> bool {
        let Some(_guard) = self.actions.begin(FAUCET) else {
            return false;
        };
        match self.gateway.request_test_tokens().await {
            Ok(outcome) => {
                *self.token_balance.borrow_mut() = Some(outcome.balance_after.into());
                if outcome.credited() {
                    self.notice.success("Test tokens received successfully!");
                } else {
                    self.notice.success(
                        "Faucet transaction confirmed; the new balance may take a moment to appear",
                    );
                }
                true
            }
            Err(e @ GatewayError::FaucetCooldown { .. }) => {
                self.notice.failure("Faucet unavailable", &e);
                false
            }
            Err(e) => {
                self.notice.failure("Failed to get tokens", &e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::mock::{self, MockTransport};
    use crate::transport::TxStatus;
    use crate::types::{TokenAmount, Value};

    #[tokio::test]
    async fn test_refresh_loads_both_balances() {
        let transport = MockTransport::new();
        transport.returns("get_user_balance", Value::I128(TokenAmount::tokens(5).minor()));
        transport.returns("balance", Value::I128(TokenAmount::tokens(95).minor()));
        let (gateway, _) = mock::gateway(&transport);
        let view = InvestmentPortal::new(&gateway);

        assert!(view.refresh().await);
        assert_eq!(view.invested().unwrap().formatted, "5.0");
        assert_eq!(view.token_balance().unwrap().formatted, "95.0");
        assert!(view.notice().is_none());
    }

    #[tokio::test]
    async fn test_faucet_updates_balance_without_refresh() {
        let transport = MockTransport::new();
        let balance = Rc::new(Cell::new(0i128));
        let read = balance.clone();
        transport.on_call("balance", move |_| Ok(Value::I128(read.get())));
        transport.returns("last_faucet_time", Value::U64(0));
        let write = balance.clone();
        transport.on_send("faucet", move |_| {
            write.set(TokenAmount::tokens(100).minor());
            TxStatus::Success
        });
        let (gateway, _) = mock::gateway(&transport);
        let view = InvestmentPortal::new(&gateway);

        assert!(view.get_test_tokens().await);
        assert_eq!(view.token_balance().unwrap().formatted, "100.0");
        assert_eq!(
            view.notice(),
            Some(Notice::Success("Test tokens received successfully!".to_string()))
        );
    }

    #[tokio::test]
    async fn test_faucet_cooldown_notice() {
        let transport = MockTransport::new();
        transport.returns("balance", Value::I128(0));
        transport.returns("last_faucet_time", Value::U64(1_700_000_000));
        let (gateway, _) = mock::gateway(&transport);
        let view = InvestmentPortal::new(&gateway);

        assert!(!view.get_test_tokens().await);
        assert_eq!(
            view.notice().unwrap().message(),
            "Faucet unavailable: Please wait 60 more minutes before requesting tokens again"
        );
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_empty_deposit_rejected_locally() {
        let transport = MockTransport::new();
        let (gateway, _) = mock::gateway(&transport);
        let view = InvestmentPortal::new(&gateway);

        assert!(!view.deposit().await);
        assert_eq!(
            view.notice().unwrap().message(),
            "Failed to deposit: Please enter a deposit amount"
        );
        assert!(transport.log().is_empty());
    }
}
