use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;

use tracing::warn;

use super::{ActionTracker, Notice, NoticeSlot};
use crate::gateway::ContractGateway;
use crate::model::SavingsPool;
use crate::types::TokenAmount;

const REFRESH: &str = "pools";
const CREATE: &str = "create-pool";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewPoolForm {
    pub name: String,
    pub goal: String,
}

/// Community savings pools.
pub struct SavingsView<'g> {
    gateway: &'g ContractGateway,
    pools: RefCell<Vec<SavingsPool>>,
    contributions: RefCell<BTreeMap<u32, TokenAmount>>,
    new_pool: RefCell<NewPoolForm>,
    /// Contribution input per pool id
    amounts: RefCell<BTreeMap<u32, String>>,
    actions: ActionTracker,
    notice: NoticeSlot,
}

impl<'g> SavingsView<'g> {
    pub fn new(gateway: &'g ContractGateway) -> Self {
        SavingsView {
            gateway,
            pools: RefCell::new(Vec::new()),
            contributions: RefCell::new(BTreeMap::new()),
            new_pool: RefCell::new(NewPoolForm::default()),
            amounts: RefCell::new(BTreeMap::new()),
            actions: ActionTracker::new(),
            notice: NoticeSlot::default(),
        }
    }

    pub fn pools(&self) -> Ref<'_, Vec<SavingsPool>> {
        self.pools.borrow()
    }

    /// What the session account has contributed to `pool_id`, as of the
    /// last refresh.
    pub fn my_contribution(&self, pool_id: u32) -> Option<TokenAmount> {
        self.contributions.borrow().get(&pool_id).copied()
    }

    pub fn new_pool_form(&self) -> RefMut<'_, NewPoolForm> {
        self.new_pool.borrow_mut()
    }

    pub fn set_contribution_amount(&self, pool_id: u32, amount: impl Into<String>) {
        self.amounts.borrow_mut().insert(pool_id, amount.into());
    }

    pub fn actions(&self) -> &ActionTracker {
        &self.actions
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice.get()
    }

    /// Reloads pools and the session account's contribution to each.
    pub async fn refresh(&self) -> bool {
        let Some(_guard) = self.actions.begin(REFRESH) else {
            return false;
        };
        let pools = match self.gateway.savings_pools().await {
            Ok(pools) => pools,
            Err(e) => {
                self.notice.failure("Failed to load savings pools", &e);
                return true;
            }
        };

        let mut contributions = BTreeMap::new();
        for pool in &pools {
            match self.gateway.my_contribution(pool.id).await {
                Ok(amount) => {
                    contributions.insert(pool.id, amount);
                }
                Err(e) => warn!(pool = pool.id, "contribution unavailable: {}", e),
            }
        }
        *self.pools.borrow_mut() = pools;
        *self.contributions.borrow_mut() = contributions;
        true
    }

    pub async fn create_pool(&self) -> bool {
        let Some(_guard) = self.actions.begin(CREATE) else {
            return false;
        };
        let form = self.new_pool.borrow().clone();
        match self.gateway.create_pool(&form.name, &form.goal).await {
            Ok(_) => {
                *self.new_pool.borrow_mut() = NewPoolForm::default();
                self.notice
                    .success(format!("Savings pool '{}' created", form.name.trim()));
                true
            }
            Err(e) => {
                self.notice.failure("Failed to create pool", &e);
                false
            }
        }
    }

    /// Contributes the amount entered for `pool_id`.
    pub async fn contribute(&self, pool_id: u32) -> bool {
        let Some(_guard) = self.actions.begin(format!("contribute-{}", pool_id)) else {
            return false;
        };
        let amount = self
            .amounts
            .borrow()
            .get(&pool_id)
            .cloned()
            .unwrap_or_default();
        match self.gateway.contribute(pool_id, &amount).await {
            Ok(_) => {
                self.amounts.borrow_mut().remove(&pool_id);
                self.notice.success(format!(
                    "Contributed {} tokens to pool #{}",
                    amount.trim(),
                    pool_id
                ));
                true
            }
            Err(e) => {
                self.notice.failure("Failed to contribute", &e);
                false
            }
        }
    }

    pub async fn close_pool(&self, pool_id: u32) -> bool {
        let Some(_guard) = self.actions.begin(format!("close-{}", pool_id)) else {
            return false;
        };
        match self.gateway.close_pool(pool_id).await {
            Ok(_) => {
                self.notice.success(format!("Pool #{} closed", pool_id));
                true
            }
            Err(e) => {
                self.notice.failure("Failed to close pool", &e);
                false
            }
        }
    }
}
