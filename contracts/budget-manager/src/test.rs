#![cfg(test)]

use super::*;
use soroban_sdk::{
    testutils::{Address as _, Events, Ledger},
    Address, Env, String,
};

fn setup() -> (Env, BudgetManagerContractClient<'static>) {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().with_mut(|li| {
        li.timestamp = 1_700_000_000;
    });

    let contract_id = env.register(BudgetManagerContract, ());
    let client = BudgetManagerContractClient::new(&env, &contract_id);
    (env, client)
}

#[test]
fn test_create_budget() {
    let (env, client) = setup();
    let user = Address::generate(&env);

    let id = client.create_budget(&user, &String::from_str(&env, "Food"), &100);
    assert_eq!(id, 0);
    assert_eq!(client.user_budget_count(&user), 1);

    let (limit, spent, last_reset, category) = client.get_budget(&user, &0);
    assert_eq!(limit, 100);
    assert_eq!(spent, 0);
    assert_eq!(last_reset, 1_700_000_000);
    assert_eq!(category, String::from_str(&env, "Food"));
    assert!(!env.events().all().is_empty());
}

#[test]
fn test_budgets_are_per_user() {
    let (env, client) = setup();
    let alice = Address::generate(&env);
    let bob = Address::generate(&env);

    client.create_budget(&alice, &String::from_str(&env, "Food"), &100);
    client.create_budget(&alice, &String::from_str(&env, "Rent"), &900);
    client.create_budget(&bob, &String::from_str(&env, "Food"), &50);

    assert_eq!(client.user_budget_count(&alice), 2);
    assert_eq!(client.user_budget_count(&bob), 1);
    assert_eq!(client.get_budget(&bob, &0).0, 50);
    assert_eq!(client.get_budget(&alice, &1).3, String::from_str(&env, "Rent"));
}

#[test]
fn test_record_expense() {
    let (env, client) = setup();
    let user = Address::generate(&env);
    client.create_budget(&user, &String::from_str(&env, "Entertainment"), &100);

    client.record_expense(&user, &0, &30);
    client.record_expense(&user, &0, &20);

    let (limit, spent, _, _) = client.get_budget(&user, &0);
    assert_eq!(limit, 100);
    assert_eq!(spent, 50);
}

#[test]
fn test_expense_over_limit_rejected() {
    let (env, client) = setup();
    let user = Address::generate(&env);
    client.create_budget(&user, &String::from_str(&env, "Food"), &100);
    client.record_expense(&user, &0, &90);

    let err = client.try_record_expense(&user, &0, &11).unwrap_err().unwrap();
    assert_eq!(err, soroban_sdk::Error::from(BudgetError::BudgetExceeded));
    assert_eq!(client.get_budget(&user, &0).1, 90);
}

#[test]
fn test_period_reset() {
    let (env, client) = setup();
    let user = Address::generate(&env);
    client.create_budget(&user, &String::from_str(&env, "Food"), &100);
    client.record_expense(&user, &0, &80);

    env.ledger().with_mut(|li| {
        li.timestamp += BUDGET_PERIOD_SECS;
    });
    client.record_expense(&user, &0, &40);

    let (_, spent, last_reset, _) = client.get_budget(&user, &0);
    assert_eq!(spent, 40);
    assert_eq!(last_reset, 1_700_000_000 + BUDGET_PERIOD_SECS);
}

#[test]
fn test_duplicate_category_rejected() {
    let (env, client) = setup();
    let user = Address::generate(&env);
    client.create_budget(&user, &String::from_str(&env, "Food"), &100);

    let err = client
        .try_create_budget(&user, &String::from_str(&env, "Food"), &200)
        .unwrap_err()
        .unwrap();
    assert_eq!(err, soroban_sdk::Error::from(BudgetError::DuplicateCategory));
}

#[test]
fn test_invalid_inputs_rejected() {
    let (env, client) = setup();
    let user = Address::generate(&env);

    let err = client
        .try_create_budget(&user, &String::from_str(&env, ""), &100)
        .unwrap_err()
        .unwrap();
    assert_eq!(err, soroban_sdk::Error::from(BudgetError::EmptyCategory));

    let err = client
        .try_create_budget(&user, &String::from_str(&env, "Food"), &0)
        .unwrap_err()
        .unwrap();
    assert_eq!(err, soroban_sdk::Error::from(BudgetError::InvalidAmount));
}

#[test]
fn test_missing_budget() {
    let (env, client) = setup();
    let user = Address::generate(&env);

    let err = client.try_get_budget(&user, &3).unwrap_err().unwrap();
    assert_eq!(err, soroban_sdk::Error::from(BudgetError::BudgetNotFound));
}

#[test]
fn test_update_limit() {
    let (env, client) = setup();
    let user = Address::generate(&env);
    client.create_budget(&user, &String::from_str(&env, "Food"), &100);
    client.record_expense(&user, &0, &60);

    client.update_limit(&user, &0, &250);
    assert_eq!(client.get_budget(&user, &0).0, 250);

    let err = client.try_update_limit(&user, &0, &50).unwrap_err().unwrap();
    assert_eq!(err, soroban_sdk::Error::from(BudgetError::BudgetExceeded));
}
