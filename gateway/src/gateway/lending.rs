use tracing::{info, warn};

use super::{parse_amount, ContractGateway};
use crate::config::ContractKind;
use crate::error::{GatewayError, Result};
use crate::model::{Loan, LoanBook, LoanConstraints};
use crate::schema::methods;
use crate::transport::Receipt;
use crate::types::{TokenAmount, Value};
use crate::units::{bps_to_percent, days_to_seconds, percent_to_bps, seconds_to_days};

impl ContractGateway {
    /// Number of loan ids issued so far.
    pub async fn loan_count(&self) -> Result<u32> {
        let session = self.ensure_session().await?;
        self.resolve_count(
            &self.profile.loans,
            &self.config.addresses.micro_lending,
            session.account(),
        )
        .await
    }

    /// Every loan that can still be read. Cancelled ids are skipped.
    pub async fn loans(&self) -> Result<Vec<Loan>> {
        let session = self.ensure_session().await?;
        self.enumerate(
            ContractKind::MicroLending,
            &self.profile.loans,
            session.account(),
            Loan::from_record,
        )
        .await
    }

    pub async fn loan(&self, loan_id: u32) -> Result<Loan> {
        let iface = &self.profile.loans;
        let value = self
            .read(
                &self.config.addresses.micro_lending,
                iface.fetch,
                vec![Value::U32(loan_id)],
                iface.schema.shape(),
            )
            .await?;
        let record = iface.schema.decode(value)?;
        Ok(Loan::from_record(loan_id, &record)?)
    }

    /// All loans split into available, borrowed by me and offered by me.
    pub async fn loan_book(&self) -> Result<LoanBook> {
        let session = self.ensure_session().await?;
        let loans = self.loans().await?;
        Ok(LoanBook::partition(&loans, session.account()))
    }

    /// Open offers (borrower still the zero address).
    pub async fn available_loans(&self) -> Result<Vec<Loan>> {
        Ok(self.loan_book().await?.available)
    }

    /// Loans the session account has borrowed.
    pub async fn my_loans(&self) -> Result<Vec<Loan>> {
        Ok(self.loan_book().await?.borrowed)
    }

    /// Loans the session account has offered.
    pub async fn my_offers(&self) -> Result<Vec<Loan>> {
        Ok(self.loan_book().await?.offered)
    }

    /// Escrows `amount` as a new offer.
    ///
    /// # Arguments
    /// * `amount` - Principal in tokens, e.g. `"10"`
    /// * `rate_percent` - Flat interest in percent, e.g. `"10"`
    /// * `duration_days` - Term in days, e.g. `"30"`
    pub async fn offer_loan(
        &self,
        amount: &str,
        rate_percent: &str,
        duration_days: &str,
    ) -> Result<Receipt> {
        let amount = parse_amount(amount, "loan amount")?;
        let rate_bps = parse_rate(rate_percent)?;
        let duration = parse_duration(duration_days)?;

        let session = self.ensure_session().await?;
        let lending = &self.config.addresses.micro_lending;

        self.approve_with(&session, lending, amount).await?;
        let receipt = self
            .submit(
                &session,
                lending,
                methods::OFFER_LOAN,
                vec![
                    session.account().into(),
                    amount.into(),
                    Value::U32(rate_bps),
                    Value::U64(duration),
                ],
            )
            .await?;
        info!(%amount, rate_bps, duration, "loan offered");
        Ok(receipt)
    }

    pub async fn take_loan(&self, loan_id: u32) -> Result<Receipt> {
        let session = self.ensure_session().await?;
        self.submit(
            &session,
            &self.config.addresses.micro_lending,
            methods::TAKE_LOAN,
            vec![session.account().into(), Value::U32(loan_id)],
        )
        .await
    }

    /// Approves principal plus interest, then repays.
    pub async fn repay_loan(&self, loan_id: u32) -> Result<Receipt> {
        let session = self.ensure_session().await?;
        let lending = &self.config.addresses.micro_lending;

        let due = self
            .read_amount(lending, methods::AMOUNT_DUE, vec![Value::U32(loan_id)])
            .await?;
        self.approve_with(&session, lending, due).await?;

        let receipt = self
            .submit(
                &session,
                lending,
                methods::REPAY_LOAN,
                vec![session.account().into(), Value::U32(loan_id)],
            )
            .await?;
        info!(loan_id, %due, "loan repaid");
        Ok(receipt)
    }

    /// Withdraws an untaken offer; the loan book removes it and refunds.
    pub async fn cancel_loan(&self, loan_id: u32) -> Result<Receipt> {
        let session = self.ensure_session().await?;
        self.submit(
            &session,
            &self.config.addresses.micro_lending,
            methods::CANCEL_LOAN,
            vec![session.account().into(), Value::U32(loan_id)],
        )
        .await
    }

    pub async fn credit_score(&self) -> Result<u32> {
        let session = self.ensure_session().await?;
        self.read_u32(
            &self.config.addresses.micro_lending,
            methods::CREDIT_SCORE,
            vec![session.account().into()],
        )
        .await
    }

    /// Offer bounds. Any bound that cannot be read keeps its default.
    pub async fn loan_constraints(&self) -> LoanConstraints {
        let lending = &self.config.addresses.micro_lending;
        let mut bounds = LoanConstraints::default();

        match self.read_amount(lending, methods::MIN_LOAN_AMOUNT, vec![]).await {
            Ok(v) => bounds.min_amount = v,
            Err(e) => warn!("using default minimum loan amount: {}", e),
        }
        match self.read_amount(lending, methods::MAX_LOAN_AMOUNT, vec![]).await {
            Ok(v) => bounds.max_amount = v,
            Err(e) => warn!("using default maximum loan amount: {}", e),
        }
        match self.read_u32(lending, methods::MIN_INTEREST_RATE, vec![]).await {
            Ok(v) => bounds.min_interest_rate = bps_to_percent(v),
            Err(e) => warn!("using default minimum interest rate: {}", e),
        }
        match self.read_u32(lending, methods::MAX_INTEREST_RATE, vec![]).await {
            Ok(v) => bounds.max_interest_rate = bps_to_percent(v),
            Err(e) => warn!("using default maximum interest rate: {}", e),
        }
        match self.read_u64(lending, methods::MIN_LOAN_DURATION, vec![]).await {
            Ok(v) => bounds.min_duration_days = seconds_to_days(v),
            Err(e) => warn!("using default minimum duration: {}", e),
        }
        match self.read_u64(lending, methods::MAX_LOAN_DURATION, vec![]).await {
            Ok(v) => bounds.max_duration_days = seconds_to_days(v),
            Err(e) => warn!("using default maximum duration: {}", e),
        }
        bounds
    }

    /// Principal plus interest currently owed on `loan_id`.
    pub async fn amount_due(&self, loan_id: u32) -> Result<TokenAmount> {
        self.read_amount(
            &self.config.addresses.micro_lending,
            methods::AMOUNT_DUE,
            vec![Value::U32(loan_id)],
        )
        .await
    }
}

fn parse_rate(input: &str) -> Result<u32> {
    if input.trim().is_empty() {
        return Err(GatewayError::Validation(
            "Please enter an interest rate".to_string(),
        ));
    }
    let bps = percent_to_bps(input)
        .map_err(|e| GatewayError::Validation(format!("Invalid interest rate: {}", e)))?;
    if bps == 0 {
        return Err(GatewayError::Validation(
            "The interest rate must be greater than zero".to_string(),
        ));
    }
    Ok(bps)
}

fn parse_duration(input: &str) -> Result<u64> {
    if input.trim().is_empty() {
        return Err(GatewayError::Validation(
            "Please enter a loan duration".to_string(),
        ));
    }
    let secs = days_to_seconds(input)
        .map_err(|e| GatewayError::Validation(format!("Invalid loan duration: {}", e)))?;
    if secs == 0 {
        return Err(GatewayError::Validation(
            "The loan duration must be greater than zero".to_string(),
        ));
    }
    Ok(secs)
}
