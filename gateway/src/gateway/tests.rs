use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::error::{TransportError, WriteFailure};
use crate::mock::{self, MockTransport};
use crate::transport::TxStatus;
use crate::types::Value;

fn budget_tuple(limit: i64, spent: i64, category: &str) -> Value {
    Value::Tuple(vec![
        Value::I128(TokenAmount::tokens(limit).minor()),
        Value::I128(TokenAmount::tokens(spent).minor()),
        Value::U64(1_700_000_000),
        Value::Text(category.to_string()),
    ])
}

#[tokio::test]
async fn test_budgets_skip_failed_and_empty_entries() {
    let transport = MockTransport::new();
    transport.returns("user_budget_count", Value::U32(4));
    transport.on_call("get_budget", |call| match call.args[1] {
        Value::U32(0) => Ok(budget_tuple(100, 30, "Food")),
        Value::U32(1) => Err(TransportError::Call("execution reverted".to_string())),
        Value::U32(2) => Ok(budget_tuple(50, 0, "   ")),
        _ => Ok(budget_tuple(200, 10, "Rent")),
    });
    let (gateway, _) = mock::gateway(&transport);

    let budgets = gateway.budgets().await.unwrap();
    let categories: Vec<_> = budgets.iter().map(|b| b.category.as_str()).collect();
    assert_eq!(categories, vec!["Food", "Rent"]);
    assert_eq!(budgets[0].id, 0);
    assert_eq!(budgets[1].id, 3);
    assert_eq!(budgets[0].limit.to_string(), "100.0");
    assert_eq!(transport.count("call:get_budget"), 4);
}

#[tokio::test]
async fn test_undecodable_entry_is_skipped() {
    let transport = MockTransport::new();
    transport.returns("user_budget_count", Value::U32(2));
    transport.on_call("get_budget", |call| match call.args[1] {
        Value::U32(0) => Ok(Value::Tuple(vec![Value::I128(1)])),
        _ => Ok(budget_tuple(10, 1, "Fun")),
    });
    let (gateway, _) = mock::gateway(&transport);

    let budgets = gateway.budgets().await.unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].category, "Fun");
}

#[tokio::test]
async fn test_count_without_probing_fails_explicitly() {
    let transport = MockTransport::new();
    transport.returns("budget_count", Value::U32(3));
    let (gateway, _) = mock::gateway(&transport);

    let err = gateway.budgets().await.unwrap_err();
    match err {
        GatewayError::ProbeExhausted { entity, tried } => {
            assert_eq!(entity, "budget");
            assert_eq!(tried, vec!["user_budget_count"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(transport.count("call:get_budget"), 0);
}

#[tokio::test]
async fn test_probing_uses_first_answering_accessor() {
    let transport = MockTransport::new();
    transport.returns("budget_count", Value::U32(1));
    transport.returns("get_budget", budget_tuple(100, 0, "Food"));

    let wallet = Rc::new(crate::local::LocalWallet::new(vec![mock::user()], 1337));
    wallet.grant();
    let mut config = GatewayConfig::new(mock::addresses(), 1337);
    config.probe_counts = true;
    let gateway = ContractGateway::new(config, transport.clone(), Some(wallet)).unwrap();

    let budgets = gateway.budgets().await.unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(
        transport.log()[..3],
        [
            "call:user_budget_count",
            "call:get_budget_count",
            "call:budget_count"
        ]
    );
}

#[tokio::test]
async fn test_probe_exhaustion_lists_all_candidates() {
    let transport = MockTransport::new();
    let wallet = Rc::new(crate::local::LocalWallet::new(vec![mock::user()], 1337));
    wallet.grant();
    let mut config = GatewayConfig::new(mock::addresses(), 1337);
    config.probe_counts = true;
    let gateway = ContractGateway::new(config, transport.clone(), Some(wallet)).unwrap();

    let err = gateway.savings_pools().await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::ProbeExhausted { entity: "pool", ref tried } if tried.len() == 2
    ));
}

#[tokio::test]
async fn test_missing_contract_short_circuits() {
    let transport = MockTransport::new();
    transport.set_code(false);
    let (gateway, _) = mock::gateway(&transport);

    assert!(gateway.budgets().await.unwrap().is_empty());
    assert!(gateway.loans().await.unwrap().is_empty());
    assert!(transport.log().is_empty());
}

#[tokio::test]
async fn test_validation_makes_no_remote_calls() {
    let transport = MockTransport::new();
    let (gateway, _) = mock::gateway(&transport);

    for (category, limit) in [("", "100"), ("Food", ""), ("Food", "0"), ("Food", "abc")] {
        let err = gateway.create_budget(category, limit).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)), "{category}/{limit}");
    }
    let err = gateway.offer_loan("10", "", "30").await.unwrap_err();
    assert_eq!(err.to_string(), "Please enter an interest rate");
    assert!(transport.log().is_empty());
}

/// Allowance state shared between the read handler and the approve hook.
fn track_allowance(transport: &MockTransport, initial: i128) -> Rc<Cell<i128>> {
    let allowance = Rc::new(Cell::new(initial));
    let read = allowance.clone();
    transport.on_call("allowance", move |_| Ok(Value::I128(read.get())));
    let write = allowance.clone();
    transport.on_send("approve", move |tx| {
        if let Some(v) = tx.args[2].as_i128() {
            write.set(v);
        }
        TxStatus::Success
    });
    allowance
}

#[tokio::test]
async fn test_deposit_resets_then_approves_exact_amount() {
    let transport = MockTransport::new();
    track_allowance(&transport, 7);
    let (gateway, _) = mock::gateway(&transport);

    gateway.deposit_for_investment("5").await.unwrap();
    assert_eq!(transport.sent(), vec!["approve", "approve", "deposit"]);
    assert_eq!(
        transport.log(),
        vec![
            "call:allowance",
            "send:approve",
            "send:approve",
            "call:allowance",
            "send:deposit"
        ]
    );
}

#[tokio::test]
async fn test_zero_allowance_skips_reset() {
    let transport = MockTransport::new();
    track_allowance(&transport, 0);
    let (gateway, _) = mock::gateway(&transport);

    gateway.contribute(0, "2").await.unwrap();
    assert_eq!(transport.sent(), vec!["approve", "contribute"]);
}

#[tokio::test]
async fn test_allowance_mismatch_stops_the_flow() {
    let transport = MockTransport::new();
    transport.returns("allowance", Value::I128(0));
    let (gateway, _) = mock::gateway(&transport);

    let err = gateway.offer_loan("10", "10", "30").await.unwrap_err();
    match &err {
        GatewayError::AllowanceMismatch { expected, actual } => {
            assert_eq!(*expected, TokenAmount::tokens(10));
            assert!(actual.is_zero());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(transport.sent(), vec!["approve"]);
    assert_eq!(transport.log().last().map(String::as_str), Some("call:allowance"));
}

#[tokio::test]
async fn test_repay_approves_amount_due() {
    let transport = MockTransport::new();
    let allowance = track_allowance(&transport, 0);
    transport.returns("amount_due", Value::I128(TokenAmount::tokens(11).minor()));
    let (gateway, _) = mock::gateway(&transport);

    gateway.repay_loan(0).await.unwrap();
    assert_eq!(allowance.get(), TokenAmount::tokens(11).minor());
    assert_eq!(transport.sent(), vec!["approve", "repay_loan"]);
}

#[tokio::test]
async fn test_reverted_write_is_classified() {
    let transport = MockTransport::new();
    transport.on_send("record_expense", |_| {
        TxStatus::Reverted("execution reverted: budget exceeded".to_string())
    });
    let (gateway, _) = mock::gateway(&transport);

    let err = gateway.record_expense(0, "500").await.unwrap_err();
    assert_eq!(
        err.write_kind(),
        Some(&WriteFailure::Reverted("budget exceeded".to_string()))
    );
    assert_eq!(err.to_string(), "Transaction reverted: budget exceeded");
}

#[tokio::test]
async fn test_signer_rejection_is_classified() {
    let transport = MockTransport::new();
    let (gateway, wallet) = mock::gateway(&transport);
    wallet.set_reject_signing(true);

    let err = gateway.take_loan(3).await.unwrap_err();
    assert_eq!(err.write_kind(), Some(&WriteFailure::RejectedBySigner));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_faucet_cooldown_checked_before_signing() {
    let transport = MockTransport::new();
    transport.returns("balance", Value::I128(0));
    transport.returns("last_faucet_time", Value::U64(1_700_000_000));
    transport.set_timestamp(1_700_000_000 + 30 * 60 + 1);
    let (gateway, _) = mock::gateway(&transport);

    let err = gateway.request_test_tokens().await.unwrap_err();
    assert!(matches!(err, GatewayError::FaucetCooldown { minutes: 30 }));
    assert_eq!(
        err.to_string(),
        "Please wait 30 more minutes before requesting tokens again"
    );
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_faucet_reports_uncredited_balance() {
    let transport = MockTransport::new();
    transport.returns("balance", Value::I128(0));
    transport.returns("last_faucet_time", Value::U64(0));
    let (gateway, _) = mock::gateway(&transport);

    let outcome = gateway.request_test_tokens().await.unwrap();
    assert!(!outcome.credited());
    assert_eq!(transport.sent(), vec!["faucet"]);
    assert_eq!(transport.count("call:balance"), 2);
}

#[tokio::test]
async fn test_session_restored_once_from_granted_accounts() {
    let transport = MockTransport::new();
    transport.returns("credit_score", Value::U32(500));
    let (gateway, _) = mock::gateway(&transport);

    assert!(!gateway.is_connected());
    assert_eq!(gateway.credit_score().await.unwrap(), 500);
    assert_eq!(gateway.account(), Some(mock::user()));
}

#[tokio::test]
async fn test_not_initialized_without_granted_accounts() {
    let transport = MockTransport::new();
    let wallet = Rc::new(crate::local::LocalWallet::new(vec![mock::user()], 1337));
    let gateway = ContractGateway::new(
        GatewayConfig::new(mock::addresses(), 1337),
        transport.clone(),
        Some(wallet),
    )
    .unwrap();

    let err = gateway.token_balance().await.unwrap_err();
    assert!(matches!(err, GatewayError::NotInitialized));
    assert!(transport.log().is_empty());
}

#[tokio::test]
async fn test_connect_without_provider() {
    let transport = MockTransport::new();
    let gateway = ContractGateway::new(
        GatewayConfig::new(mock::addresses(), 1337),
        transport,
        None,
    )
    .unwrap();

    let err = gateway.connect().await.unwrap_err();
    assert!(matches!(err, GatewayError::Wallet(WalletError::NoProvider)));
    assert!(!gateway.ensure_correct_network().await);
}

#[tokio::test]
async fn test_account_changes_follow_wallet() {
    let transport = MockTransport::new();
    let (gateway, _) = mock::gateway(&transport);
    let (account, chain_id) = gateway.connect().await.unwrap();
    assert_eq!(account, mock::user());
    assert_eq!(chain_id, 1337);

    let other = Address::from_index(2);
    let event = gateway
        .handle_accounts_changed(vec![other.clone()])
        .await
        .unwrap();
    assert_eq!(event, SessionEvent::Switched(other.clone()));
    assert_eq!(gateway.account(), Some(other));

    let event = gateway.handle_accounts_changed(vec![]).await.unwrap();
    assert_eq!(event, SessionEvent::Disconnected);
    assert!(!gateway.is_connected());
}

#[tokio::test]
async fn test_watch_accounts_applies_notifications() {
    let transport = MockTransport::new();
    let wallet = Rc::new(crate::local::LocalWallet::new(
        vec![mock::user(), Address::from_index(2)],
        1337,
    ));
    let gateway = ContractGateway::new(
        GatewayConfig::new(mock::addresses(), 1337),
        transport,
        Some(wallet.clone()),
    )
    .unwrap();
    gateway.connect().await.unwrap();

    let watcher = gateway.watch_accounts();
    let driver = async {
        tokio::task::yield_now().await;
        wallet.switch_account(Address::from_index(2));
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        gateway.account()
    };
    tokio::select! {
        result = watcher => panic!("watcher ended early: {:?}", result.err()),
        account = driver => assert_eq!(account, Some(Address::from_index(2))),
    }
}

#[tokio::test]
async fn test_watch_accounts_survives_failed_switch() {
    let transport = MockTransport::new();
    let wallet = Rc::new(crate::local::LocalWallet::new(
        vec![mock::user(), Address::from_index(2), Address::from_index(3)],
        1337,
    ));
    let gateway = ContractGateway::new(
        GatewayConfig::new(mock::addresses(), 1337),
        transport,
        Some(wallet.clone()),
    )
    .unwrap();
    gateway.connect().await.unwrap();
    wallet.fail_chain_id_lookups(1);

    let watcher = gateway.watch_accounts();
    let driver = async {
        tokio::task::yield_now().await;
        wallet.switch_account(Address::from_index(2));
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        let after_failure = gateway.account();

        wallet.switch_account(Address::from_index(3));
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        (after_failure, gateway.account())
    };
    tokio::select! {
        result = watcher => panic!("watcher ended early: {:?}", result.err()),
        (after_failure, account) = driver => {
            assert_eq!(after_failure, Some(mock::user()));
            assert_eq!(account, Some(Address::from_index(3)));
        }
    }
}

#[tokio::test]
async fn test_loan_book_partition_from_contract() {
    let transport = MockTransport::new();
    transport.returns("loan_count", Value::U32(2));
    transport.on_call("loans", |call| {
        let borrower = match call.args[0] {
            Value::U32(0) => Address::zero(),
            _ => mock::user(),
        };
        Ok(Value::Tuple(vec![
            Value::I128(TokenAmount::tokens(10).minor()),
            Value::U32(1_000),
            Value::U64(30 * 86_400),
            Value::U64(0),
            Value::Address(borrower),
            Value::Address(Address::from_index(9)),
            Value::Bool(true),
            Value::Bool(false),
        ]))
    });
    let (gateway, _) = mock::gateway(&transport);

    let book = gateway.loan_book().await.unwrap();
    assert_eq!(book.available.len(), 1);
    assert_eq!(book.available[0].id, 0);
    assert_eq!(book.borrowed.len(), 1);
    assert_eq!(book.borrowed[0].id, 1);
    assert!(book.offered.is_empty());
    assert_eq!(book.available[0].interest_rate.to_string(), "10");
    assert_eq!(book.available[0].duration_days.to_string(), "30");
}

#[tokio::test]
async fn test_constraints_fall_back_per_field() {
    let transport = MockTransport::new();
    transport.returns("max_interest_rate", Value::U32(2_000));
    let (gateway, _) = mock::gateway(&transport);

    let bounds = gateway.loan_constraints().await;
    assert_eq!(bounds.max_interest_rate.to_string(), "20");
    assert_eq!(
        bounds.min_interest_rate,
        crate::model::LoanConstraints::default().min_interest_rate
    );
    assert_eq!(bounds.max_amount, TokenAmount::tokens(1_000));
}
