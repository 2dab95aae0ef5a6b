//! Conversions between wire types (major units, `Decimal`) and engine types
//! (integer minor units, fixed-point percentages).

use api_types::{
    Currency as ApiCurrency,
    splits::{SplitCalculate, SplitRule as ApiSplitRule},
};
use engine::{Currency, CustomSplit, EngineError, Money, Percentage, SplitRequest, SplitRule};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use crate::ServerError;

pub(crate) fn currency_view(currency: Currency) -> ApiCurrency {
    match currency {
        Currency::Jpy => ApiCurrency::Jpy,
        Currency::Eur => ApiCurrency::Eur,
        Currency::Usd => ApiCurrency::Usd,
    }
}

pub(crate) fn rule_view(rule: SplitRule) -> ApiSplitRule {
    match rule {
        SplitRule::Equal => ApiSplitRule::Equal,
        SplitRule::Quantity => ApiSplitRule::Quantity,
        SplitRule::Custom => ApiSplitRule::Custom,
    }
}

fn rule_from_view(rule: ApiSplitRule) -> SplitRule {
    match rule {
        ApiSplitRule::Equal => SplitRule::Equal,
        ApiSplitRule::Quantity => SplitRule::Quantity,
        ApiSplitRule::Custom => SplitRule::Custom,
    }
}

/// Minor units to a major-unit decimal, e.g. `1050` EUR is `10.50`.
pub(crate) fn major(amount: Money, currency: Currency) -> Decimal {
    Decimal::new(amount.minor(), u32::from(currency.minor_units()))
}

/// Converts a percentage like `33.3333` to engine units, rounding half up
/// beyond the fourth decimal.
pub(crate) fn percentage(value: Decimal) -> Result<Percentage, ServerError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(EngineError::InvalidSplit(format!("negative percentage: {value}")).into());
    }
    let out_of_range = || EngineError::InvalidSplit(format!("percentage out of range: {value}"));
    let units = value
        .checked_mul(Decimal::from(Percentage::SCALE))
        .ok_or_else(out_of_range)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or_else(out_of_range)?;
    Ok(Percentage::from_units(units))
}

pub(crate) fn split_request(payload: SplitCalculate) -> Result<SplitRequest, ServerError> {
    let custom_splits = payload
        .custom_splits
        .map(|splits| {
            splits
                .into_iter()
                .map(|split| {
                    Ok(CustomSplit {
                        user_id: split.user_id,
                        percentage: percentage(split.percentage)?,
                    })
                })
                .collect::<Result<Vec<_>, ServerError>>()
        })
        .transpose()?;

    Ok(SplitRequest {
        rule: rule_from_view(payload.rule),
        participant_ids: payload.participant_ids,
        custom_splits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_types::splits::CustomSplitView;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn minor_units_render_as_major() {
        assert_eq!(major(Money::new(1050), Currency::Eur), dec("10.50"));
        assert_eq!(major(Money::new(-5), Currency::Usd), dec("-0.05"));
        assert_eq!(major(Money::new(100000), Currency::Jpy), dec("1000"));
    }

    #[test]
    fn percentages_keep_four_decimals() {
        assert_eq!(percentage(dec("100")).ok(), Some(Percentage::HUNDRED));
        assert_eq!(
            percentage(dec("33.3333")).ok(),
            Some(Percentage::from_units(333_333))
        );
        assert_eq!(
            percentage(dec("33.33335")).ok(),
            Some(Percentage::from_units(333_334))
        );
        assert_eq!(percentage(dec("0")).ok(), Some(Percentage::from_units(0)));
    }

    #[test]
    fn huge_percentage_is_rejected() {
        assert!(matches!(
            percentage(Decimal::MAX),
            Err(ServerError::Engine(EngineError::InvalidSplit(_)))
        ));
        assert!(percentage(dec("79228162514264337593543950335")).is_err());
    }

    #[test]
    fn negative_percentage_is_rejected() {
        assert!(percentage(dec("-1")).is_err());
    }

    #[test]
    fn split_request_maps_custom_splits() {
        let request = split_request(SplitCalculate {
            rule: ApiSplitRule::Custom,
            participant_ids: Vec::new(),
            custom_splits: Some(vec![
                CustomSplitView {
                    user_id: "a".to_string(),
                    percentage: dec("60"),
                },
                CustomSplitView {
                    user_id: "b".to_string(),
                    percentage: dec("40"),
                },
            ]),
        })
        .ok()
        .unwrap();

        assert_eq!(request.rule, SplitRule::Custom);
        let custom = request.custom_splits.unwrap();
        assert_eq!(custom[0].percentage, Percentage::from_units(600_000));
        assert_eq!(custom[1].user_id, "b");
    }
}
