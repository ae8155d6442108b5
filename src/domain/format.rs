/// Currency a quote amount is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Currency {
    /// Renminbi, the currency rate sheets are priced in.
    Primary,
    /// US dollars, derived through the exchange rate.
    Secondary,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Primary => "¥",
            Self::Secondary => "$",
        }
    }
}

/// Renders `amount` with two decimals and the currency symbol.
pub fn format_currency(amount: f64, currency: Currency) -> String {
    format!("{}{:.2}", currency.symbol(), amount)
}
