//! Command structs for engine operations.
//!
//! These types group parameters for write operations (transactions,
//! accounts, categories), keeping call sites readable and avoiding long
//! argument lists. Patches follow PATCH semantics: an absent field leaves the
//! stored value alone.

use chrono::{NaiveDate, NaiveTime};

use crate::{
    AccountType, CategoryType, Currency, EngineError, ResultEngine, Transaction, TransactionKind,
    transactions::postings,
};

/// Largest magnitude of an amount or balance, in minor units
/// (`9_999_999_999_999.99`).
pub const MAX_AMOUNT_MINOR: i64 = 999_999_999_999_999;

const MAX_TITLE_LEN: usize = 200;
const MAX_LOCATION_LEN: usize = 200;

/// Create a transaction.
///
/// Build it with [`NewTransaction::expense`], [`NewTransaction::income`] or
/// [`NewTransaction::transfer`], which set the accounts each kind needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub account_id: Option<i64>,
    pub to_account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub amount_minor: i64,
    /// `None` means the default currency (CNY).
    pub currency: Option<Currency>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub transaction_date: NaiveDate,
    pub transaction_time: Option<NaiveTime>,
    pub bill_id: Option<i64>,
    pub wishlist_id: Option<i64>,
    pub tags: Vec<String>,
    pub images: Vec<String>,
}

impl NewTransaction {
    #[must_use]
    pub fn new(kind: TransactionKind, amount_minor: i64, transaction_date: NaiveDate) -> Self {
        Self {
            kind,
            account_id: None,
            to_account_id: None,
            category_id: None,
            amount_minor,
            currency: None,
            title: None,
            description: None,
            location: None,
            transaction_date,
            transaction_time: None,
            bill_id: None,
            wishlist_id: None,
            tags: Vec::new(),
            images: Vec::new(),
        }
    }

    #[must_use]
    pub fn expense(account_id: i64, amount_minor: i64, transaction_date: NaiveDate) -> Self {
        Self::new(TransactionKind::Expense, amount_minor, transaction_date).account_id(account_id)
    }

    #[must_use]
    pub fn income(account_id: i64, amount_minor: i64, transaction_date: NaiveDate) -> Self {
        Self::new(TransactionKind::Income, amount_minor, transaction_date).account_id(account_id)
    }

    #[must_use]
    pub fn transfer(
        from_account_id: i64,
        to_account_id: i64,
        amount_minor: i64,
        transaction_date: NaiveDate,
    ) -> Self {
        Self::new(TransactionKind::Transfer, amount_minor, transaction_date)
            .account_id(from_account_id)
            .to_account_id(to_account_id)
    }

    #[must_use]
    pub fn account_id(mut self, account_id: i64) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn to_account_id(mut self, to_account_id: i64) -> Self {
        self.to_account_id = Some(to_account_id);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn time(mut self, time: NaiveTime) -> Self {
        self.transaction_time = Some(time);
        self
    }

    #[must_use]
    pub fn bill_id(mut self, bill_id: i64) -> Self {
        self.bill_id = Some(bill_id);
        self
    }

    #[must_use]
    pub fn wishlist_id(mut self, wishlist_id: i64) -> Self {
        self.wishlist_id = Some(wishlist_id);
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Checks the shape of the request before any store is touched.
    ///
    /// Every kind needs a source account; a transfer also needs a distinct
    /// destination. A destination on a non-transfer is dropped.
    pub(crate) fn validate(&mut self) -> ResultEngine<()> {
        if self.amount_minor <= 0 {
            return Err(EngineError::Validation("amount must be > 0".to_string()));
        }
        check_amount(self.amount_minor, "amount")?;
        if self.account_id.is_none() {
            return Err(EngineError::Validation(format!(
                "account_id is required for {}",
                self.kind.as_str()
            )));
        }
        match self.kind {
            TransactionKind::Transfer => {
                let Some(to_account_id) = self.to_account_id else {
                    return Err(EngineError::Validation(
                        "to_account_id is required for transfer".to_string(),
                    ));
                };
                if self.account_id == Some(to_account_id) {
                    return Err(EngineError::Validation(
                        "to_account_id must differ from account_id".to_string(),
                    ));
                }
            }
            TransactionKind::Expense | TransactionKind::Income => self.to_account_id = None,
        }

        self.title = normalize_text(self.title.take());
        self.description = normalize_text(self.description.take());
        self.location = normalize_text(self.location.take());
        check_len(self.title.as_deref(), MAX_TITLE_LEN, "title")?;
        check_len(self.location.as_deref(), MAX_LOCATION_LEN, "location")?;
        Ok(())
    }

    pub(crate) fn postings(&self) -> Vec<(i64, i64)> {
        postings(
            self.kind,
            self.account_id,
            self.to_account_id,
            self.amount_minor,
        )
    }
}

impl From<&Transaction> for NewTransaction {
    fn from(tx: &Transaction) -> Self {
        Self {
            kind: tx.kind,
            account_id: tx.account_id,
            to_account_id: tx.to_account_id,
            category_id: tx.category_id,
            amount_minor: tx.amount_minor,
            currency: Some(tx.currency),
            title: tx.title.clone(),
            description: tx.description.clone(),
            location: tx.location.clone(),
            transaction_date: tx.transaction_date,
            transaction_time: tx.transaction_time,
            bill_id: tx.bill_id,
            wishlist_id: tx.wishlist_id,
            tags: tx.tags.clone(),
            images: tx.images.clone(),
        }
    }
}

/// Partial update of a transaction.
///
/// Absent fields are left unchanged. Two zero-value sentinels are kept for
/// compatibility with existing clients: `amount_minor == Some(0)` and an
/// empty `tags`/`images` list also mean "unchanged", so an amount cannot be
/// patched to 0 (it must be positive anyway) and lists cannot be cleared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionPatch {
    pub kind: Option<TransactionKind>,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub to_account_id: Option<i64>,
    pub amount_minor: Option<i64>,
    pub currency: Option<Currency>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub transaction_time: Option<NaiveTime>,
    pub bill_id: Option<i64>,
    pub wishlist_id: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

impl TransactionPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn account_id(mut self, account_id: i64) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn to_account_id(mut self, to_account_id: i64) -> Self {
        self.to_account_id = Some(to_account_id);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn transaction_date(mut self, date: NaiveDate) -> Self {
        self.transaction_date = Some(date);
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Merges the patch into `current`. The result still needs validating.
    pub(crate) fn apply_to(self, mut current: NewTransaction) -> ResultEngine<NewTransaction> {
        match self.amount_minor {
            Some(amount) if amount < 0 => {
                return Err(EngineError::Validation("amount must be > 0".to_string()));
            }
            Some(0) | None => {}
            Some(amount) => current.amount_minor = amount,
        }

        if let Some(kind) = self.kind {
            current.kind = kind;
        }
        if let Some(id) = self.category_id {
            current.category_id = Some(id);
        }
        if let Some(id) = self.account_id {
            current.account_id = Some(id);
        }
        if let Some(id) = self.to_account_id {
            current.to_account_id = Some(id);
        }
        if let Some(currency) = self.currency {
            current.currency = Some(currency);
        }
        if let Some(title) = self.title {
            current.title = Some(title);
        }
        if let Some(description) = self.description {
            current.description = Some(description);
        }
        if let Some(location) = self.location {
            current.location = Some(location);
        }
        if let Some(date) = self.transaction_date {
            current.transaction_date = date;
        }
        if let Some(time) = self.transaction_time {
            current.transaction_time = Some(time);
        }
        if let Some(id) = self.bill_id {
            current.bill_id = Some(id);
        }
        if let Some(id) = self.wishlist_id {
            current.wishlist_id = Some(id);
        }
        if let Some(tags) = self.tags.filter(|tags| !tags.is_empty()) {
            current.tags = tags;
        }
        if let Some(images) = self.images.filter(|images| !images.is_empty()) {
            current.images = images;
        }
        Ok(current)
    }
}

/// Create an account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAccount {
    pub account_type: AccountType,
    pub name: String,
    pub number: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub initial_balance_minor: i64,
    pub include_in_total: bool,
    pub display_order: i32,
}

impl NewAccount {
    #[must_use]
    pub fn new(account_type: AccountType, name: impl Into<String>) -> Self {
        Self {
            account_type,
            name: name.into(),
            number: None,
            icon: None,
            color: None,
            initial_balance_minor: 0,
            include_in_total: true,
            display_order: 0,
        }
    }

    #[must_use]
    pub fn initial_balance(mut self, minor: i64) -> Self {
        self.initial_balance_minor = minor;
        self
    }

    #[must_use]
    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn include_in_total(mut self, include: bool) -> Self {
        self.include_in_total = include;
        self
    }

    #[must_use]
    pub fn display_order(mut self, order: i32) -> Self {
        self.display_order = order;
        self
    }
}

/// Partial update of an account.
///
/// `balance_minor` overwrites the cached balance (manual correction) and is
/// the only write that breaks the posting invariant on purpose.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub number: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub include_in_total: Option<bool>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
    pub balance_minor: Option<i64>,
}

impl AccountPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn include_in_total(mut self, include: bool) -> Self {
        self.include_in_total = Some(include);
        self
    }

    #[must_use]
    pub fn display_order(mut self, order: i32) -> Self {
        self.display_order = Some(order);
        self
    }

    #[must_use]
    pub fn balance(mut self, minor: i64) -> Self {
        self.balance_minor = Some(minor);
        self
    }
}

/// Create a category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCategory {
    pub kind: CategoryType,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub display_order: i32,
}

impl NewCategory {
    #[must_use]
    pub fn new(kind: CategoryType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            icon: None,
            color: None,
            display_order: 0,
        }
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn display_order(mut self, order: i32) -> Self {
        self.display_order = order;
        self
    }
}

/// Partial update of a user category.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl CategoryPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn is_active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Rejects amounts and balances beyond [`MAX_AMOUNT_MINOR`].
pub(crate) fn check_amount(minor: i64, label: &str) -> ResultEngine<()> {
    if minor.unsigned_abs() > MAX_AMOUNT_MINOR.unsigned_abs() {
        return Err(EngineError::Validation(format!(
            "{label} must be within ±{MAX_AMOUNT_MINOR} minor units"
        )));
    }
    Ok(())
}

fn check_len(value: Option<&str>, max: usize, label: &str) -> ResultEngine<()> {
    if value.is_some_and(|v| v.chars().count() > max) {
        return Err(EngineError::Validation(format!(
            "{label} must be at most {max} characters"
        )));
    }
    Ok(())
}
