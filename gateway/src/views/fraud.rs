//! Fraud analytics dashboard.
//!
//! Presentational only: every transaction, alert and score here is
//! generated locally from a seeded RNG. No contract is consulted.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::error::GatewayError;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const SAMPLE_SIZE: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            70.. => RiskLevel::High,
            40.. => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyntheticTransaction {
    pub id: String,
    pub from: String,
    pub to: String,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub risk_score: u8,
    pub flags: Vec<&'static str>,
}

impl SyntheticTransaction {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FraudAlert {
    pub id: u64,
    pub severity: Severity,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub related_tx: String,
    pub active: bool,
}

/// One point of the weekly risk chart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RiskPoint {
    pub day: &'static str,
    pub score: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FraudSummary {
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    pub total_volume: Decimal,
    /// Volume of high-risk transactions
    pub flagged_volume: Decimal,
}

pub struct FraudAnalytics {
    rng: StdRng,
    transactions: Vec<SyntheticTransaction>,
    alerts: Vec<FraudAlert>,
    risk_scores: Vec<RiskPoint>,
    next_alert_id: u64,
}

impl FraudAnalytics {
    /// Generates the sample data. The same `seed` and `now` always give the
    /// same dashboard.
    pub fn new(seed: u64, now: DateTime<Utc>) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let transactions: Vec<_> = (0..SAMPLE_SIZE)
            .map(|i| synthetic_transaction(&mut rng, now - Duration::hours(i as i64 + 1)))
            .collect();
        let risk_scores = WEEKDAYS
            .iter()
            .map(|&day| RiskPoint {
                day,
                score: rng.gen_range(20..=70),
            })
            .collect();

        let mut view = FraudAnalytics {
            rng,
            transactions,
            alerts: Vec::new(),
            risk_scores,
            next_alert_id: 1,
        };
        let flagged: Vec<_> = view
            .transactions
            .iter()
            .filter(|tx| tx.risk_level() != RiskLevel::Low)
            .map(|tx| (tx.risk_level(), tx.id.clone(), tx.timestamp))
            .collect();
        for (level, tx_id, at) in flagged {
            let (severity, description) = match level {
                RiskLevel::High => (Severity::High, "Suspicious transaction pattern detected"),
                _ => (Severity::Medium, "Unusual activity from a new address"),
            };
            view.push_alert(severity, description.to_string(), at, tx_id);
        }
        view
    }

    pub fn transactions(&self) -> &[SyntheticTransaction] {
        &self.transactions
    }

    /// Newest first.
    pub fn alerts(&self) -> &[FraudAlert] {
        &self.alerts
    }

    pub fn active_alerts(&self) -> impl Iterator<Item = &FraudAlert> {
        self.alerts.iter().filter(|a| a.active)
    }

    pub fn risk_scores(&self) -> &[RiskPoint] {
        &self.risk_scores
    }

    pub fn summary(&self) -> FraudSummary {
        let mut summary = FraudSummary::default();
        for tx in &self.transactions {
            summary.total_volume += tx.amount;
            match tx.risk_level() {
                RiskLevel::High => {
                    summary.high_risk += 1;
                    summary.flagged_volume += tx.amount;
                }
                RiskLevel::Medium => summary.medium_risk += 1,
                RiskLevel::Low => summary.low_risk += 1,
            }
        }
        summary
    }

    /// Marks an alert resolved. Returns `false` for an unknown id.
    pub fn resolve_alert(&mut self, id: u64) -> bool {
        match self.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.active = false;
                true
            }
            None => false,
        }
    }

    /// Looks up an address. Addresses containing `123` raise a new
    /// high-severity alert; returns whether one was raised.
    pub fn search(&mut self, address: &str) -> Result<bool, GatewayError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(GatewayError::Validation(
                "Please enter an address to search".to_string(),
            ));
        }
        if !address.contains("123") {
            return Ok(false);
        }

        let related = random_hex(&mut self.rng, 3);
        self.alerts.insert(0, FraudAlert {
            id: self.next_alert_id,
            severity: Severity::High,
            description: format!("Suspicious activity detected for address {}", address),
            timestamp: Utc::now(),
            related_tx: related,
            active: true,
        });
        self.next_alert_id += 1;
        info!(address, "address flagged");
        Ok(true)
    }

    fn push_alert(
        &mut self,
        severity: Severity,
        description: String,
        timestamp: DateTime<Utc>,
        related_tx: String,
    ) {
        self.alerts.push(FraudAlert {
            id: self.next_alert_id,
            severity,
            description,
            timestamp,
            related_tx,
            active: true,
        });
        self.next_alert_id += 1;
    }
}

fn synthetic_transaction(rng: &mut StdRng, timestamp: DateTime<Utc>) -> SyntheticTransaction {
    let amount = Decimal::new(rng.gen_range(1..=500), 2);
    let risk_score = rng.gen_range(0..=100u8);

    let mut flags = Vec::new();
    match RiskLevel::from_score(risk_score) {
        RiskLevel::High => {
            flags.push("Unusual pattern");
            if amount >= Decimal::ONE {
                flags.push("Large amount");
            }
        }
        RiskLevel::Medium => flags.push("New address"),
        RiskLevel::Low => {}
    }

    SyntheticTransaction {
        id: random_hex(rng, 3),
        from: short_address(rng),
        to: short_address(rng),
        amount,
        timestamp,
        risk_score,
        flags,
    }
}

fn random_hex(rng: &mut StdRng, bytes: usize) -> String {
    let raw: Vec<u8> = (0..bytes).map(|_| rng.gen()).collect();
    format!("0x{}", hex::encode(raw))
}

fn short_address(rng: &mut StdRng) -> String {
    let full = random_hex(rng, 20);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_risk_levels() {
        assert_eq!(RiskLevel::from_score(85), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(69), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(40), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(39), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
    }

    #[test]
    fn test_same_seed_same_dashboard() {
        let a = FraudAnalytics::new(7, now());
        let b = FraudAnalytics::new(7, now());
        assert_eq!(a.transactions(), b.transactions());
        assert_eq!(a.risk_scores(), b.risk_scores());
        assert_eq!(a.transactions().len(), SAMPLE_SIZE);
        assert_eq!(a.risk_scores().len(), 7);
        assert!(a.risk_scores().iter().all(|p| (20..=70).contains(&p.score)));
    }

    #[test]
    fn test_summary_matches_transactions() {
        let view = FraudAnalytics::new(42, now());
        let summary = view.summary();
        assert_eq!(
            summary.high_risk + summary.medium_risk + summary.low_risk,
            SAMPLE_SIZE
        );
        let total: Decimal = view.transactions().iter().map(|t| t.amount).sum();
        assert_eq!(summary.total_volume, total);
        assert!(summary.flagged_volume <= summary.total_volume);
        assert_eq!(
            view.alerts().len(),
            summary.high_risk + summary.medium_risk
        );
    }

    #[test]
    fn test_search() {
        let mut view = FraudAnalytics::new(1, now());
        let before = view.alerts().len();

        let err = view.search("  ").unwrap_err();
        assert_eq!(err.to_string(), "Please enter an address to search");

        assert!(!view.search("0xabcdef").unwrap());
        assert_eq!(view.alerts().len(), before);

        assert!(view.search("0x123abc").unwrap());
        let alert = &view.alerts()[0];
        assert_eq!(alert.severity, Severity::High);
        assert!(alert.active);
        assert!(alert.description.ends_with("0x123abc"));
        assert_eq!(view.alerts().len(), before + 1);
    }

    #[test]
    fn test_resolve_alert() {
        let mut view = FraudAnalytics::new(3, now());
        view.search("123").unwrap();
        let id = view.alerts()[0].id;
        let active = view.active_alerts().count();

        assert!(view.resolve_alert(id));
        assert_eq!(view.active_alerts().count(), active - 1);
        assert!(!view.resolve_alert(9_999));
    }
}
