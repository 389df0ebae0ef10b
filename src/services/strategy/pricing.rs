// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::NATIVE_GAS_TOKEN;
use crate::domain::error::AppError;
use crate::domain::pool::{ExchangeCatalog, PoolSnapshot};
use alloy::primitives::Address;
use rust_decimal::Decimal;

/// Spot price of `base` in `quote` units on one pool.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceCurve {
    pub cid: String,
    pub exchange: String,
    pub base: Address,
    pub quote: Address,
    pub price: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct CurveContainer {
    curves: Vec<PriceCurve>,
}

impl CurveContainer {
    pub fn new(curves: Vec<PriceCurve>) -> Self {
        Self { curves }
    }

    /// One curve per pool with a usable spot price; empty or unpriceable
    /// pools are skipped.
    pub fn from_snapshots(snapshots: &[PoolSnapshot]) -> Self {
        let mut curves = Vec::with_capacity(snapshots.len());
        for snap in snapshots {
            match snap.spot_price() {
                Ok(Some(price)) => curves.push(PriceCurve {
                    cid: snap.cid.clone(),
                    exchange: snap.exchange_name.clone(),
                    base: snap.token0.address,
                    quote: snap.token1.address,
                    price,
                }),
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(target: "pricing", cid = %snap.cid, error = %e, "Skipping unpriceable pool");
                }
            }
        }
        Self { curves }
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceCurve> {
        self.curves.iter()
    }

    pub fn tokens(&self) -> Vec<Address> {
        let mut out: Vec<Address> = Vec::new();
        for c in &self.curves {
            for t in [c.base, c.quote] {
                if !out.contains(&t) {
                    out.push(t);
                }
            }
        }
        out
    }

    /// Every quote of `base` in `quote` units: direct curves first, then the
    /// inverted reverse-direction curves.
    pub fn quotes(&self, base: Address, quote: Address) -> Vec<(&str, Decimal)> {
        let direct = self
            .curves
            .iter()
            .filter(|c| c.base == base && c.quote == quote)
            .map(|c| (c.exchange.as_str(), c.price));
        let inverted = self
            .curves
            .iter()
            .filter(|c| c.base == quote && c.quote == base)
            .filter_map(|c| Decimal::ONE.checked_div(c.price).map(|p| (c.exchange.as_str(), p)));
        direct.chain(inverted).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitReport {
    pub flashloan_token: Decimal,
    pub gas_token: Decimal,
    /// `None` when no stablecoin quote is available.
    pub usd: Option<Decimal>,
}

/// Converts route profit into gas-token and USD terms.
#[derive(Debug, Clone)]
pub struct ProfitConverter {
    catalog: ExchangeCatalog,
    wrapped_gas_token: Address,
    stablecoin: Option<Address>,
}

impl ProfitConverter {
    pub fn new(
        catalog: ExchangeCatalog,
        wrapped_gas_token: Address,
        stablecoin: Option<Address>,
    ) -> Self {
        Self {
            catalog,
            wrapped_gas_token,
            stablecoin,
        }
    }

    fn is_gas_token(&self, token: Address) -> bool {
        token == self.wrapped_gas_token || token == NATIVE_GAS_TOKEN
    }

    /// Price of `base` in `quote` from the highest-preference exchange.
    pub fn best_rate(
        &self,
        curves: &CurveContainer,
        base: Address,
        quote: Address,
    ) -> Result<Decimal, AppError> {
        let mut quotes = curves.quotes(base, quote);
        // stable sort keeps direct quotes ahead of inverted ones on ties
        quotes.sort_by_key(|(exchange, _)| self.catalog.pricing_rank(exchange));
        quotes
            .first()
            .map(|(_, price)| *price)
            .ok_or_else(|| AppError::Pricing {
                base: format!("{base:#x}"),
                quote: format!("{quote:#x}"),
            })
    }

    pub fn convert_profit(
        &self,
        curves: &CurveContainer,
        profit: Decimal,
        flashloan_token: Address,
        flashloan_fee: Decimal,
    ) -> Result<ProfitReport, AppError> {
        let gas_token = if self.is_gas_token(flashloan_token) {
            profit - flashloan_fee
        } else {
            let rate = self.best_rate(curves, self.wrapped_gas_token, flashloan_token)?;
            let div = |v: Decimal| {
                v.checked_div(rate).ok_or_else(|| AppError::Pricing {
                    base: format!("{:#x}", self.wrapped_gas_token),
                    quote: format!("{flashloan_token:#x}"),
                })
            };
            div(profit)? - div(flashloan_fee)?
        };

        let usd = match self.stablecoin {
            Some(stable) => match self.best_rate(curves, self.wrapped_gas_token, stable) {
                Ok(rate) => gas_token.checked_mul(rate),
                Err(e) => {
                    tracing::debug!(target: "pricing", error = %e, "No USD quote for gas token");
                    None
                }
            },
            None => None,
        };

        tracing::debug!(
            target: "pricing",
            flashloan_token = %format!("{flashloan_token:#x}"),
            profit = %profit,
            profit_gas_token = %gas_token,
            profit_usd = ?usd,
            "Converted route profit"
        );

        Ok(ProfitReport {
            flashloan_token: profit,
            gas_token,
            usd,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use rust_decimal_macros::dec;

    const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
    const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
    const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

    fn curve(exchange: &str, base: Address, quote: Address, price: Decimal) -> PriceCurve {
        PriceCurve {
            cid: format!("{exchange}-pool"),
            exchange: exchange.to_string(),
            base,
            quote,
            price,
        }
    }

    fn converter() -> ProfitConverter {
        ProfitConverter::new(ExchangeCatalog::default(), WETH, Some(USDC))
    }

    #[test]
    fn gas_token_profit_only_subtracts_fee() {
        let report = converter()
            .convert_profit(&CurveContainer::default(), dec!(2), WETH, dec!(0.5))
            .unwrap();
        assert_eq!(report.gas_token, dec!(1.5));
        assert_eq!(report.usd, None);
    }

    #[test]
    fn preferred_exchange_wins_and_reverse_quotes_are_inverted() {
        let curves = CurveContainer::new(vec![
            curve("carbon_v1", WETH, DAI, dec!(1000)),
            curve("uniswap_v3", WETH, DAI, dec!(2500)),
            // DAI per WETH = 1 / 0.0005 = 2000
            curve("bancor_v2", DAI, WETH, dec!(0.0005)),
        ]);
        let rate = converter().best_rate(&curves, WETH, DAI).unwrap();
        assert_eq!(rate, dec!(2000));
    }

    #[test]
    fn carbon_sorts_after_unknown_exchanges() {
        let curves = CurveContainer::new(vec![
            curve("bancor_pol", WETH, DAI, dec!(1000)),
            curve("mystery_dex", WETH, DAI, dec!(3000)),
        ]);
        assert_eq!(converter().best_rate(&curves, WETH, DAI).unwrap(), dec!(3000));
    }

    #[test]
    fn foreign_flashloan_token_converts_through_gas_token() {
        let curves = CurveContainer::new(vec![
            curve("uniswap_v2", WETH, DAI, dec!(2000)),
            curve("uniswap_v2", WETH, USDC, dec!(2001)),
        ]);
        let report = converter()
            .convert_profit(&curves, dec!(100), DAI, dec!(10))
            .unwrap();
        assert_eq!(report.gas_token, dec!(0.045));
        assert_eq!(report.usd, Some(dec!(90.045)));
    }

    #[test]
    fn missing_gas_quote_is_an_error_but_missing_usd_is_not() {
        let conv = converter();
        assert!(matches!(
            conv.convert_profit(&CurveContainer::default(), dec!(1), DAI, Decimal::ZERO),
            Err(AppError::Pricing { .. })
        ));
        let curves = CurveContainer::new(vec![curve("uniswap_v2", WETH, DAI, dec!(2000))]);
        let report = conv.convert_profit(&curves, dec!(20), DAI, Decimal::ZERO).unwrap();
        assert_eq!(report.gas_token, dec!(0.01));
        assert!(report.usd.is_none());
    }
}
