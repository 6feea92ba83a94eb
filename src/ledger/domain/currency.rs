use std::fmt;

use semval::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ledger::errors::LedgerError;

const CURRENCY_CODE_LENGTH: usize = 3;

/// A three character currency code such as `GBP` or `EUR`.
///
/// The code is not checked against any list of known currencies. Two codes are
/// equal if their strings are equal.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CurrencyCodeInvalidity {
    /// The code does not have exactly three characters. The parameter is the
    /// number of characters that were provided.
    InvalidLength(usize),
}

impl CurrencyCode {
    /// Parse a currency code.
    ///
    /// # Arguments
    /// * `code` - The raw code. It must be exactly three characters long.
    ///
    /// # Examples
    ///
    /// ```
    /// # use balance_book::ledger::domain::currency::CurrencyCode;
    /// let gbp = CurrencyCode::new("GBP").unwrap();
    /// assert_eq!("GBP", gbp.as_str());
    ///
    /// assert!(CurrencyCode::new("POUNDS").is_err());
    /// ```
    pub fn new(code: &str) -> Result<Self, LedgerError> {
        Self::validated_from(code)
            .map_err(|(_, context)| LedgerError::InvalidCurrencyCode(context.into_iter().collect()))
    }

    /// Create an unvalidated currency code.
    ///
    /// This is used while assembling an object that contains a currency code
    /// and validates it as part of its own validation.
    pub(crate) fn unvalidated(code: String) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for CurrencyCode {
    type Invalidity = CurrencyCodeInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        let length = self.0.chars().count();

        ValidationContext::new()
            .invalidate_if(
                length != CURRENCY_CODE_LENGTH,
                CurrencyCodeInvalidity::InvalidLength(length),
            )
            .into()
    }
}

impl ValidatedFrom<&str> for CurrencyCode {
    fn validated_from(from: &str) -> ValidatedResult<Self> {
        let into = Self(from.to_owned());

        match into.validate() {
            Ok(()) => Ok(into),
            Err(context) => Err((into, context)),
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = LedgerError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::new(&code)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
