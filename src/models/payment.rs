//! Payment-method codes
//!
//! A small integer describing how a transaction was settled. Stored as the
//! bare integer so files stay compatible with the spreadsheet side.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a transaction was settled. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PaymentMethod {
    #[default]
    Unspecified,
    Cash,
    DebitCard,
    CreditCard,
    BankTransfer,
    DirectDebit,
    Cheque,
    Online,
    Other,
}

impl PaymentMethod {
    /// All methods in code order
    pub const ALL: [PaymentMethod; 9] = [
        Self::Unspecified,
        Self::Cash,
        Self::DebitCard,
        Self::CreditCard,
        Self::BankTransfer,
        Self::DirectDebit,
        Self::Cheque,
        Self::Online,
        Self::Other,
    ];

    /// The stored integer code
    pub const fn code(self) -> u8 {
        match self {
            Self::Unspecified => 0,
            Self::Cash => 1,
            Self::DebitCard => 2,
            Self::CreditCard => 3,
            Self::BankTransfer => 4,
            Self::DirectDebit => 5,
            Self::Cheque => 6,
            Self::Online => 7,
            Self::Other => 99,
        }
    }

    /// Look up a method by its integer code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    /// Parse from a code ("3") or a name ("credit-card", "cash")
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Self::from_code(code);
        }
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "" | "unspecified" | "none" => Some(Self::Unspecified),
            "cash" => Some(Self::Cash),
            "debit" | "debitcard" | "ec" => Some(Self::DebitCard),
            "credit" | "creditcard" | "card" => Some(Self::CreditCard),
            "transfer" | "banktransfer" | "wire" => Some(Self::BankTransfer),
            "directdebit" | "sepa" => Some(Self::DirectDebit),
            "cheque" | "check" => Some(Self::Cheque),
            "online" | "paypal" => Some(Self::Online),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl From<PaymentMethod> for u8 {
    fn from(method: PaymentMethod) -> Self {
        method.code()
    }
}

impl TryFrom<u8> for PaymentMethod {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown payment method code {}", code))
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unspecified => "",
            Self::Cash => "Cash",
            Self::DebitCard => "Debit card",
            Self::CreditCard => "Credit card",
            Self::BankTransfer => "Bank transfer",
            Self::DirectDebit => "Direct debit",
            Self::Cheque => "Cheque",
            Self::Online => "Online",
            Self::Other => "Other",
        };
        write!(f, "{}", label)
    }
}
