use std::cell::{Ref, RefCell, RefMut};

use super::{ActionTracker, Notice, NoticeSlot};
use crate::gateway::ContractGateway;
use crate::model::{LoanBook, LoanConstraints};

const REFRESH: &str = "loans";
const OFFER: &str = "offer-loan";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OfferForm {
    pub amount: String,
    /// Percent
    pub interest_rate: String,
    /// Days
    pub duration: String,
}

/// Peer-to-peer loan book.
pub struct MicroloansView<'g> {
    gateway: &'g ContractGateway,
    book: RefCell<LoanBook>,
    credit_score: RefCell<Option<u32>>,
    constraints: RefCell<LoanConstraints>,
    offer: RefCell<OfferForm>,
    actions: ActionTracker,
    notice: NoticeSlot,
}

impl<'g> MicroloansView<'g> {
    pub fn new(gateway: &'g ContractGateway) -> Self {
        MicroloansView {
            gateway,
            book: RefCell::new(LoanBook::default()),
            credit_score: RefCell::new(None),
            constraints: RefCell::new(LoanConstraints::default()),
            offer: RefCell::new(OfferForm::default()),
            actions: ActionTracker::new(),
            notice: NoticeSlot::default(),
        }
    }

    pub fn book(&self) -> Ref<'_, LoanBook> {
        self.book.borrow()
    }

    pub fn credit_score(&self) -> Option<u32> {
        *self.credit_score.borrow()
    }

    pub fn constraints(&self) -> LoanConstraints {
        self.constraints.borrow().clone()
    }

    pub fn offer_form(&self) -> RefMut<'_, OfferForm> {
        self.offer.borrow_mut()
    }

    pub fn actions(&self) -> &ActionTracker {
        &self.actions
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice.get()
    }

    /// Reloads the loan book, credit score and offer bounds.
    pub async fn refresh(&self) -> bool {
        let Some(_guard) = self.actions.begin(REFRESH) else {
            return false;
        };
        match self.gateway.loan_book().await {
            Ok(book) => *self.book.borrow_mut() = book,
            Err(e) => {
                self.notice.failure("Failed to load loans", &e);
                return true;
            }
        }
        match self.gateway.credit_score().await {
            Ok(score) => *self.credit_score.borrow_mut() = Some(score),
            Err(e) => self.notice.failure("Failed to load credit score", &e),
        }
        *self.constraints.borrow_mut() = self.gateway.loan_constraints().await;
        true
    }

    pub async fn offer_loan(&self) -> bool {
        let Some(_guard) = self.actions.begin(OFFER) else {
            return false;
        };
        let form = self.offer.borrow().clone();
        match self
            .gateway
            .offer_loan(&form.amount, &form.interest_rate, &form.duration)
            .await
        {
            Ok(_) => {
                *self.offer.borrow_mut() = OfferForm::default();
                self.notice.success("Loan offer created");
                true
            }
            Err(e) => {
                self.notice.failure("Failed to offer loan", &e);
                false
            }
        }
    }

    pub async fn take_loan(&self, loan_id: u32) -> bool {
        let Some(_guard) = self.actions.begin(format!("take-{}", loan_id)) else {
            return false;
        };
        match self.gateway.take_loan(loan_id).await {
            Ok(_) => {
                self.notice.success(format!("Loan #{} taken", loan_id));
                true
            }
            Err(e) => {
                self.notice.failure("Failed to take loan", &e);
                false
            }
        }
    }

    pub async fn repay_loan(&self, loan_id: u32) -> bool {
        let Some(_guard) = self.actions.begin(format!("repay-{}", loan_id)) else {
            return false;
        };
        match self.gateway.repay_loan(loan_id).await {
            Ok(_) => {
                self.notice.success(format!("Loan #{} repaid", loan_id));
                true
            }
            Err(e) => {
                self.notice.failure("Failed to repay loan", &e);
                false
            }
        }
    }

    pub async fn cancel_loan(&self, loan_id: u32) -> bool {
        let Some(_guard) = self.actions.begin(format!("cancel-{}", loan_id)) else {
            return false;
        };
        match self.gateway.cancel_loan(loan_id).await {
            Ok(_) => {
                self.notice.success(format!("Loan #{} cancelled", loan_id));
                true
            }
            Err(e) => {
                self.notice.failure("Failed to cancel loan", &e);
                false
            }
        }
    }
}
