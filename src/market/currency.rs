use std::fmt;

use serde::{Deserialize, Serialize};

/// Currencies a tier may carry an explicit price for. The reference currency
/// (USD) is priced on the tier itself and is deliberately absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Aud,
    Brl,
    Cad,
    Chf,
    Czk,
    Dkk,
    Eur,
    Gbp,
    Hkd,
    Huf,
    Ils,
    Jpy,
    Mxn,
    Myr,
    Nok,
    Nzd,
    Php,
    Pln,
    Sek,
    Sgd,
    Thb,
    Twd,
}

impl Currency {
    pub const ALL: [Currency; 22] = [
        Currency::Aud,
        Currency::Brl,
        Currency::Cad,
        Currency::Chf,
        Currency::Czk,
        Currency::Dkk,
        Currency::Eur,
        Currency::Gbp,
        Currency::Hkd,
        Currency::Huf,
        Currency::Ils,
        Currency::Jpy,
        Currency::Mxn,
        Currency::Myr,
        Currency::Nok,
        Currency::Nzd,
        Currency::Php,
        Currency::Pln,
        Currency::Sek,
        Currency::Sgd,
        Currency::Thb,
        Currency::Twd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Aud => "AUD",
            Currency::Brl => "BRL",
            Currency::Cad => "CAD",
            Currency::Chf => "CHF",
            Currency::Czk => "CZK",
            Currency::Dkk => "DKK",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Hkd => "HKD",
            Currency::Huf => "HUF",
            Currency::Ils => "ILS",
            Currency::Jpy => "JPY",
            Currency::Mxn => "MXN",
            Currency::Myr => "MYR",
            Currency::Nok => "NOK",
            Currency::Nzd => "NZD",
            Currency::Php => "PHP",
            Currency::Pln => "PLN",
            Currency::Sek => "SEK",
            Currency::Sgd => "SGD",
            Currency::Thb => "THB",
            Currency::Twd => "TWD",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Currency::Aud => "Australian Dollar",
            Currency::Brl => "Brazilian Real",
            Currency::Cad => "Canadian Dollar",
            Currency::Chf => "Swiss Franc",
            Currency::Czk => "Czech Koruna",
            Currency::Dkk => "Danish Krone",
            Currency::Eur => "Euro",
            Currency::Gbp => "Pound Sterling",
            Currency::Hkd => "Hong Kong Dollar",
            Currency::Huf => "Hungarian Forint",
            Currency::Ils => "Israeli New Sheqel",
            Currency::Jpy => "Japanese Yen",
            Currency::Mxn => "Mexican Peso",
            Currency::Myr => "Malaysian Ringgit",
            Currency::Nok => "Norwegian Krone",
            Currency::Nzd => "New Zealand Dollar",
            Currency::Php => "Philippine Peso",
            Currency::Pln => "Polish Zloty",
            Currency::Sek => "Swedish Krona",
            Currency::Sgd => "Singapore Dollar",
            Currency::Thb => "Thai Baht",
            Currency::Twd => "Taiwan New Dollar",
        }
    }

    /// Exact, upper-case match on the ISO code.
    pub fn from_code(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|currency| currency.as_str() == value)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
