#![cfg(test)]

use super::*;
use soroban_sdk::{testutils::Address as _, Address, Env, String};
use test_token::{TestTokenContract, TestTokenContractClient, ONE_TOKEN};

fn setup() -> (
    Env,
    Address,
    TestTokenContractClient<'static>,
    CommunitySavingsContractClient<'static>,
) {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let token_id = env.register(TestTokenContract, ());
    let token = TestTokenContractClient::new(&env, &token_id);
    token.initialize(&admin);

    let savings_id = env.register(CommunitySavingsContract, ());
    let savings = CommunitySavingsContractClient::new(&env, &savings_id);
    savings.initialize(&admin, &token_id);

    (env, admin, token, savings)
}

#[test]
fn test_create_pool() {
    let (env, _, _, savings) = setup();
    let creator = Address::generate(&env);

    let id = savings.create_pool(
        &creator,
        &String::from_str(&env, "Business Development Fund"),
        &(5 * ONE_TOKEN),
    );
    assert_eq!(id, 0);
    assert_eq!(savings.pool_count(), 1);

    let (name, goal, balance, active, members) = savings.get_pool(&0);
    assert_eq!(name, String::from_str(&env, "Business Development Fund"));
    assert_eq!(goal, 5 * ONE_TOKEN);
    assert_eq!(balance, 0);
    assert!(active);
    assert_eq!(members, 0);
}

#[test]
fn test_contributions_count_members_once() {
    let (env, admin, token, savings) = setup();
    let creator = Address::generate(&env);
    let member = Address::generate(&env);
    savings.create_pool(&creator, &String::from_str(&env, "Education"), &(3 * ONE_TOKEN));

    token.mint(&admin, &member, &(10 * ONE_TOKEN));
    token.approve(&member, &savings.address, &(10 * ONE_TOKEN));
    savings.contribute(&member, &0, &ONE_TOKEN);
    savings.contribute(&member, &0, &ONE_TOKEN);

    let (_, _, balance, _, members) = savings.get_pool(&0);
    assert_eq!(balance, 2 * ONE_TOKEN);
    assert_eq!(members, 1);
    assert_eq!(savings.contribution_of(&0, &member), 2 * ONE_TOKEN);
}

#[test]
fn test_close_pool_pays_creator() {
    let (env, admin, token, savings) = setup();
    let creator = Address::generate(&env);
    let member = Address::generate(&env);
    savings.create_pool(&creator, &String::from_str(&env, "Roof"), &(2 * ONE_TOKEN));

    token.mint(&admin, &member, &(2 * ONE_TOKEN));
    token.approve(&member, &savings.address, &(2 * ONE_TOKEN));
    savings.contribute(&member, &0, &(2 * ONE_TOKEN));

    let err = savings.try_close_pool(&member, &0).unwrap_err().unwrap();
    assert_eq!(err, soroban_sdk::Error::from(SavingsError::NotCreator));

    savings.close_pool(&creator, &0);
    assert_eq!(token.balance(&creator), 2 * ONE_TOKEN);

    let (_, _, balance, active, _) = savings.get_pool(&0);
    assert_eq!(balance, 0);
    assert!(!active);

    let err = savings
        .try_contribute(&member, &0, &ONE_TOKEN)
        .unwrap_err()
        .unwrap();
    assert_eq!(err, soroban_sdk::Error::from(SavingsError::PoolClosed));
}

#[test]
fn test_invalid_pool() {
    let (env, _, _, savings) = setup();
    let creator = Address::generate(&env);

    let err = savings
        .try_create_pool(&creator, &String::from_str(&env, ""), &ONE_TOKEN)
        .unwrap_err()
        .unwrap();
    assert_eq!(err, soroban_sdk::Error::from(SavingsError::InvalidName));

    let err = savings.try_get_pool(&9).unwrap_err().unwrap();
    assert_eq!(err, soroban_sdk::Error::from(SavingsError::PoolNotFound));
}
