//! Remote contract interface descriptions.
//!
//! Entity getters return positional tuples. Each entity gets a schema naming
//! the positions; the schema set for an [`InterfaceVersion`] is checked once
//! when the gateway is built, so the per-entity mapping can look fields up
//! by name.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::types::{Address, Shape, Value};

/// Contract method names shared by every interface version.
pub mod methods {
    pub const CREATE_BUDGET: &str = "create_budget";
    pub const RECORD_EXPENSE: &str = "record_expense";
    pub const UPDATE_LIMIT: &str = "update_limit";

    pub const BALANCE: &str = "balance";
    pub const ALLOWANCE: &str = "allowance";
    pub const APPROVE: &str = "approve";
    pub const FAUCET: &str = "faucet";
    pub const LAST_FAUCET_TIME: &str = "last_faucet_time";

    pub const DEPOSIT: &str = "deposit";
    pub const WITHDRAW: &str = "withdraw";
    pub const USER_BALANCE: &str = "get_user_balance";

    pub const OFFER_LOAN: &str = "offer_loan";
    pub const TAKE_LOAN: &str = "take_loan";
    pub const REPAY_LOAN: &str = "repay_loan";
    pub const CANCEL_LOAN: &str = "cancel_loan";
    pub const AMOUNT_DUE: &str = "amount_due";
    pub const CREDIT_SCORE: &str = "credit_score";
    pub const MIN_LOAN_AMOUNT: &str = "min_loan_amount";
    pub const MAX_LOAN_AMOUNT: &str = "max_loan_amount";
    pub const MIN_INTEREST_RATE: &str = "min_interest_rate";
    pub const MAX_INTEREST_RATE: &str = "max_interest_rate";
    pub const MIN_LOAN_DURATION: &str = "min_loan_duration";
    pub const MAX_LOAN_DURATION: &str = "max_loan_duration";

    pub const CREATE_POOL: &str = "create_pool";
    pub const CONTRIBUTE: &str = "contribute";
    pub const CLOSE_POOL: &str = "close_pool";
    pub const CONTRIBUTION_OF: &str = "contribution_of";
}

/// Field names the entity mappings rely on.
pub mod fields {
    pub const LIMIT: &str = "limit";
    pub const SPENT: &str = "spent";
    pub const LAST_RESET: &str = "last_reset";
    pub const CATEGORY: &str = "category";

    pub const AMOUNT: &str = "amount";
    pub const INTEREST_RATE: &str = "interest_rate";
    pub const DURATION: &str = "duration";
    pub const START_TIME: &str = "start_time";
    pub const BORROWER: &str = "borrower";
    pub const LENDER: &str = "lender";
    pub const ACTIVE: &str = "active";
    pub const REPAID: &str = "repaid";

    pub const NAME: &str = "name";
    pub const GOAL: &str = "goal";
    pub const BALANCE: &str = "balance";
    pub const MEMBERS: &str = "members";
}

const BUDGET_FIELDS: &[&str] = &[fields::LIMIT, fields::SPENT, fields::LAST_RESET, fields::CATEGORY];
const LOAN_FIELDS: &[&str] = &[
    fields::AMOUNT,
    fields::INTEREST_RATE,
    fields::DURATION,
    fields::START_TIME,
    fields::BORROWER,
    fields::LENDER,
    fields::ACTIVE,
    fields::REPAID,
];
const POOL_FIELDS: &[&str] = &[
    fields::NAME,
    fields::GOAL,
    fields::BALANCE,
    fields::ACTIVE,
    fields::MEMBERS,
];

/// Deployed contract ABI generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceVersion {
    #[default]
    V1,
}

impl FromStr for InterfaceVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(InterfaceVersion::V1),
            other => Err(format!("unknown interface version '{}'", other)),
        }
    }
}

/// Whether an accessor is keyed by the session account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Owner,
    Global,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountAccessor {
    pub method: &'static str,
    pub scope: Scope,
}

impl CountAccessor {
    const fn owner(method: &'static str) -> Self {
        CountAccessor {
            method,
            scope: Scope::Owner,
        }
    }

    const fn global(method: &'static str) -> Self {
        CountAccessor {
            method,
            scope: Scope::Global,
        }
    }

    pub fn args(&self, owner: &Address) -> Vec<Value> {
        match self.scope {
            Scope::Owner => vec![Value::Address(owner.clone())],
            Scope::Global => Vec::new(),
        }
    }
}

/// Names the positions of an entity tuple.
#[derive(Clone, Debug)]
pub struct EntitySchema {
    pub entity: &'static str,
    fields: Vec<(&'static str, Shape)>,
}

impl EntitySchema {
    pub fn new(entity: &'static str, fields: Vec<(&'static str, Shape)>) -> Self {
        EntitySchema { entity, fields }
    }

    /// Shape the transport should decode the getter's return into.
    pub fn shape(&self) -> Shape {
        Shape::Tuple(self.fields.iter().map(|(_, shape)| shape.clone()).collect())
    }

    /// Checks field names are unique and every `required` name is present.
    pub fn validate(&self, required: &[&'static str]) -> Result<(), SchemaError> {
        let mut seen = BTreeSet::new();
        for (name, _) in &self.fields {
            if !seen.insert(*name) {
                return Err(SchemaError::DuplicateField {
                    entity: self.entity,
                    field: *name,
                });
            }
        }
        for field in required {
            if !seen.contains(field) {
                return Err(SchemaError::MissingField {
                    entity: self.entity,
                    field: *field,
                });
            }
        }
        Ok(())
    }

    pub fn decode(&self, value: Value) -> Result<Record, SchemaError> {
        let values = match value {
            Value::Tuple(values) => values,
            other => vec![other],
        };
        if values.len() != self.fields.len() {
            return Err(SchemaError::Arity {
                entity: self.entity,
                expected: self.fields.len(),
                actual: values.len(),
            });
        }

        let mut decoded = Vec::with_capacity(values.len());
        for ((name, shape), value) in self.fields.iter().zip(values) {
            if !value.matches(shape) {
                return Err(SchemaError::FieldType {
                    entity: self.entity,
                    field: *name,
                });
            }
            decoded.push((*name, value));
        }
        Ok(Record {
            entity: self.entity,
            fields: decoded,
        })
    }
}

/// A decoded entity tuple with named fields.
#[derive(Clone, Debug)]
pub struct Record {
    entity: &'static str,
    fields: Vec<(&'static str, Value)>,
}

impl Record {
    fn get(&self, field: &'static str) -> Result<&Value, SchemaError> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
            .ok_or(SchemaError::MissingField {
                entity: self.entity,
                field,
            })
    }

    fn typed<T>(
        &self,
        field: &'static str,
        extract: impl FnOnce(&Value) -> Option<T>,
    ) -> Result<T, SchemaError> {
        extract(self.get(field)?).ok_or(SchemaError::FieldType {
            entity: self.entity,
            field,
        })
    }

    pub fn i128(&self, field: &'static str) -> Result<i128, SchemaError> {
        self.typed(field, Value::as_i128)
    }

    pub fn u32(&self, field: &'static str) -> Result<u32, SchemaError> {
        self.typed(field, Value::as_u32)
    }

    pub fn u64(&self, field: &'static str) -> Result<u64, SchemaError> {
        self.typed(field, Value::as_u64)
    }

    pub fn bool(&self, field: &'static str) -> Result<bool, SchemaError> {
        self.typed(field, Value::as_bool)
    }

    pub fn text(&self, field: &'static str) -> Result<String, SchemaError> {
        self.typed(field, |v| v.as_text().map(str::to_string))
    }

    pub fn address(&self, field: &'static str) -> Result<Address, SchemaError> {
        self.typed(field, |v| v.as_address().cloned())
    }
}

/// How to count, fetch and decode one kind of entity.
#[derive(Clone, Debug)]
pub struct EntityInterface {
    /// Count accessors; the first is canonical, the rest are probe
    /// candidates.
    pub counts: Vec<CountAccessor>,
    pub fetch: &'static str,
    pub fetch_scope: Scope,
    pub schema: EntitySchema,
}

impl EntityInterface {
    pub fn entity(&self) -> &'static str {
        self.schema.entity
    }

    pub fn fetch_args(&self, owner: &Address, index: u32) -> Vec<Value> {
        match self.fetch_scope {
            Scope::Owner => vec![Value::Address(owner.clone()), Value::U32(index)],
            Scope::Global => vec![Value::U32(index)],
        }
    }

    /// Accessors to try: only the canonical one unless probing.
    pub fn count_candidates(&self, probe: bool) -> &[CountAccessor] {
        if probe {
            &self.counts
        } else {
            &self.counts[..1.min(self.counts.len())]
        }
    }
}

/// All entity interfaces for one [`InterfaceVersion`], validated.
#[derive(Clone, Debug)]
pub struct InterfaceProfile {
    pub version: InterfaceVersion,
    pub budgets: EntityInterface,
    pub loans: EntityInterface,
    pub pools: EntityInterface,
}

impl InterfaceProfile {
    pub fn new(version: InterfaceVersion) -> Result<Self, SchemaError> {
        let profile = match version {
            InterfaceVersion::V1 => Self::v1(),
        };
        profile.budgets.schema.validate(BUDGET_FIELDS)?;
        profile.loans.schema.validate(LOAN_FIELDS)?;
        profile.pools.schema.validate(POOL_FIELDS)?;
        Ok(profile)
    }

    fn v1() -> Self {
        InterfaceProfile {
            version: InterfaceVersion::V1,
            budgets: EntityInterface {
                counts: vec![
                    CountAccessor::owner("user_budget_count"),
                    CountAccessor::owner("get_budget_count"),
                    CountAccessor::global("budget_count"),
                ],
                fetch: "get_budget",
                fetch_scope: Scope::Owner,
                schema: EntitySchema::new(
                    "budget",
                    vec![
                        (fields::LIMIT, Shape::I128),
                        (fields::SPENT, Shape::I128),
                        (fields::LAST_RESET, Shape::U64),
                        (fields::CATEGORY, Shape::Text),
                    ],
                ),
            },
            loans: EntityInterface {
                counts: vec![
                    CountAccessor::global("loan_count"),
                    CountAccessor::global("get_loan_count"),
                    CountAccessor::global("total_loans"),
                ],
                fetch: "loans",
                fetch_scope: Scope::Global,
                schema: EntitySchema::new(
                    "loan",
                    vec![
                        (fields::AMOUNT, Shape::I128),
                        (fields::INTEREST_RATE, Shape::U32),
                        (fields::DURATION, Shape::U64),
                        (fields::START_TIME, Shape::U64),
                        (fields::BORROWER, Shape::OptionalAddress),
                        (fields::LENDER, Shape::Address),
                        (fields::ACTIVE, Shape::Bool),
                        (fields::REPAID, Shape::Bool),
                    ],
                ),
            },
            pools: EntityInterface {
                counts: vec![
                    CountAccessor::global("pool_count"),
                    CountAccessor::global("get_pool_count"),
                ],
                fetch: "get_pool",
                fetch_scope: Scope::Global,
                schema: EntitySchema::new(
                    "pool",
                    vec![
                        (fields::NAME, Shape::Text),
                        (fields::GOAL, Shape::I128),
                        (fields::BALANCE, Shape::I128),
                        (fields::ACTIVE, Shape::Bool),
                        (fields::MEMBERS, Shape::U32),
                    ],
                ),
            },
        }
    }
}
