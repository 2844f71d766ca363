//! Price policy: stablecoin tiers by name length and native fee fallback.

use super::types::{CandidateName, PriceQuote, Wei};

/// Native fee used until the registry's `mintFee` read resolves (0.0005 native units).
pub const DEFAULT_NATIVE_FEE_WEI: Wei = 500_000_000_000_000;

const WEI_PER_UNIT: Wei = 1_000_000_000_000_000_000;

/// Stablecoin price in whole units for a name of the given length.
///
/// Tiers are inclusive: up to 3 characters costs 20, up to 5 costs 10,
/// anything longer costs 5. The empty name costs nothing.
pub fn stable_price(name: &CandidateName) -> u64 {
    match name.char_len() {
        0 => 0,
        1..=3 => 20,
        4..=5 => 10,
        _ => 5,
    }
}

/// Build the displayed quote from the current name and the last fee read, if any.
pub fn quote(name: &CandidateName, registry_fee: Option<Wei>) -> PriceQuote {
    PriceQuote {
        native_fee: registry_fee.unwrap_or(DEFAULT_NATIVE_FEE_WEI),
        native_fee_resolved: registry_fee.is_some(),
        stable_price: stable_price(name),
    }
}

/// Render a wei amount in native units with four decimals, rounding half up.
pub fn format_native(wei: Wei) -> String {
    let scale: Wei = WEI_PER_UNIT / 10_000;
    let scaled = wei / scale + Wei::from(wei % scale >= scale / 2);
    format!("{}.{:04}", scaled / 10_000, scaled % 10_000)
}

/// Render a whole-unit stablecoin price with two decimals.
pub fn format_stable(units: u64) -> String {
    format!("{units}.00")
}
