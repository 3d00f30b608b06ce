use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Exchange contract specification for a tradable instrument.
///
/// Margin, point value, and tick size are fixed per-instrument constants;
/// they drive position sizing and slippage costs in the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractSpec {
    pub symbol: String,
    pub margin_initial: Decimal,
    pub point_value: Decimal,
    pub tick_size: Decimal,
    pub contract_multiplier: Decimal,
    pub currency: String,
    pub description: String,
}

impl ContractSpec {
    fn new(
        symbol: &str,
        margin_initial: Decimal,
        point_value: Decimal,
        tick_size: Decimal,
        contract_multiplier: Decimal,
        currency: &str,
        description: &str,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            margin_initial,
            point_value,
            tick_size,
            contract_multiplier,
            currency: currency.to_string(),
            description: description.to_string(),
        }
    }

    /// Looks up the built-in spec table by symbol.
    pub fn lookup(symbol: &str) -> Option<ContractSpec> {
        let spec = match symbol {
            // US index futures (micro contracts)
            "MES" => ContractSpec::new(
                "MES",
                dec!(1300.00),
                dec!(5.00),
                dec!(0.25),
                dec!(5.0),
                "USD",
                "Micro E-mini S&P 500 futures contract",
            ),
            "MNQ" => ContractSpec::new(
                "MNQ",
                dec!(1650.00),
                dec!(2.00),
                dec!(0.25),
                dec!(2.0),
                "USD",
                "Micro E-mini Nasdaq-100 futures contract",
            ),
            // Forex standard lots; specs vary by broker
            "EURUSD" => ContractSpec::new(
                "EURUSD",
                dec!(100.00),
                dec!(10.00),
                dec!(0.0001),
                dec!(100000.0),
                "USD",
                "Euro vs US Dollar standard lot",
            ),
            "USDJPY" => ContractSpec::new(
                "USDJPY",
                dec!(100.00),
                dec!(10.00),
                dec!(0.01),
                dec!(100000.0),
                "USD",
                "US Dollar vs Japanese Yen standard lot",
            ),
            "USDCAD" => ContractSpec::new(
                "USDCAD",
                dec!(100.00),
                dec!(10.00),
                dec!(0.0001),
                dec!(100000.0),
                "USD",
                "US Dollar vs Canadian Dollar standard lot",
            ),
            // Crypto perpetuals
            "BTCUSDT" => ContractSpec::new(
                "BTCUSDT",
                dec!(5000.00),
                dec!(1.00),
                dec!(0.01),
                dec!(1.0),
                "USDT",
                "Bitcoin vs Tether",
            ),
            "ETHUSDT" => ContractSpec::new(
                "ETHUSDT",
                dec!(1000.00),
                dec!(1.00),
                dec!(0.01),
                dec!(1.0),
                "USDT",
                "Ethereum vs Tether",
            ),
            "LTCUSDT" => ContractSpec::new(
                "LTCUSDT",
                dec!(200.00),
                dec!(1.00),
                dec!(0.01),
                dec!(1.0),
                "USDT",
                "Litecoin vs Tether",
            ),
            _ => return None,
        };
        Some(spec)
    }

    /// Resolves a symbol to its spec, degrading to a neutral placeholder for
    /// instruments the table does not know about.
    pub fn lookup_or_default(symbol: &str) -> ContractSpec {
        ContractSpec::lookup(symbol).unwrap_or_else(|| {
            warn!(
                instrument = symbol,
                "no contract spec found, using neutral defaults"
            );
            ContractSpec::new(
                symbol,
                dec!(1000.00),
                dec!(1.00),
                dec!(0.01),
                dec!(1.0),
                "USD",
                "Unknown instrument",
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_symbols_resolve() {
        let mes = ContractSpec::lookup("MES").unwrap();
        assert_eq!(mes.point_value, dec!(5.00));
        assert_eq!(mes.margin_initial, dec!(1300.00));
        assert_eq!(mes.tick_size, dec!(0.25));

        let mnq = ContractSpec::lookup("MNQ").unwrap();
        assert_eq!(mnq.point_value, dec!(2.00));
        assert_eq!(mnq.margin_initial, dec!(1650.00));
    }

    #[test]
    fn unknown_symbol_degrades_to_neutral_spec() {
        assert!(ContractSpec::lookup("ZZZ").is_none());
        let spec = ContractSpec::lookup_or_default("ZZZ");
        assert_eq!(spec.symbol, "ZZZ");
        assert_eq!(spec.point_value, dec!(1.00));
    }
}
