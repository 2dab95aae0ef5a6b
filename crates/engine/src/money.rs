use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};

/// Signed money amount represented as **integer minor units**.
///
/// Use this type for **all** monetary values in the engine (purchase totals,
/// shares, balances) to avoid floating-point drift. Conversion to and from
/// major units happens only at the HTTP boundary.
///
/// The value is signed:
/// - positive = paid for the group / owed to the member
/// - negative = owed by the member
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[must_use]
    pub const fn abs(self) -> Money {
        Money(self.0.abs())
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Sums `amounts`, returning `None` if the total leaves the `i64` range.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// Applies a percentage, rounding half up to the nearest minor unit.
    ///
    /// ```rust
    /// use engine::{Money, Percentage};
    ///
    /// let pct = Percentage::from_units(33_3333); // 33.3333 %
    /// assert_eq!(Money::new(1000).percent(pct).minor(), 333);
    /// assert_eq!(Money::new(1).percent(Percentage::from_units(50_0000)).minor(), 1);
    /// ```
    #[must_use]
    pub fn percent(self, pct: Percentage) -> Money {
        Money(div_round_half_up(
            i128::from(self.0) * i128::from(pct.units()),
            i128::from(Percentage::HUNDRED.units()),
        ))
    }

    /// Divides by `n`, rounding half up. Dividing by zero yields zero.
    #[must_use]
    pub fn div_round(self, n: u64) -> Money {
        if n == 0 {
            return Money::ZERO;
        }
        Money(div_round_half_up(i128::from(self.0), i128::from(n)))
    }
}

/// Integer division rounding half away from zero.
///
/// Results outside the `i64` range saturate; callers only feed it products
/// of an `i64` amount and a ratio `<= 1`.
fn div_round_half_up(numerator: i128, denominator: i128) -> i64 {
    let negative = (numerator < 0) != (denominator < 0);
    let (n, d) = (numerator.unsigned_abs(), denominator.unsigned_abs());
    let q = (n + d / 2) / d;
    let q = i128::try_from(q).unwrap_or(i128::MAX);
    let signed = if negative { -q } else { q };
    i64::try_from(signed).unwrap_or(if negative { i64::MIN } else { i64::MAX })
}

/// Distributes `total` pro rata over `weights / denominator`.
///
/// Each share is `round_half_up(total * weight / denominator)`; the result is
/// then passed through [`reconcile_remainder`], so the first entry absorbs any
/// rounding difference.
pub(crate) fn pro_rata(total: Money, weights: &[u64], denominator: u64) -> Vec<Money> {
    let mut shares: Vec<Money> = weights
        .iter()
        .map(|&w| {
            if denominator == 0 {
                Money::ZERO
            } else {
                Money(div_round_half_up(
                    i128::from(total.0) * i128::from(w),
                    i128::from(denominator),
                ))
            }
        })
        .collect();
    reconcile_remainder(total, &mut shares);
    shares
}

/// Forces `shares` to sum exactly to `total`.
///
/// `shares` must already be in tie-break order: the whole difference goes to
/// the first share. A negative difference larger than that share empties it
/// and keeps taking from the following shares in order, so no share turns
/// negative.
pub(crate) fn reconcile_remainder(total: Money, shares: &mut [Money]) {
    let sum: Money = shares.iter().copied().sum();
    let mut difference = total - sum;
    if difference.is_zero() {
        return;
    }
    if difference.is_positive() {
        if let Some(first) = shares.first_mut() {
            *first += difference;
        }
        return;
    }
    for share in shares.iter_mut() {
        let taken = (-difference).min(*share);
        *share -= taken;
        difference += taken;
        if difference.is_zero() {
            break;
        }
    }
}

/// A percentage in fixed point: one unit is 0.0001 %.
///
/// Custom splits are validated and applied in these units so no floating
/// point is ever involved.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Percentage(u64);

impl Percentage {
    /// Number of units in one percent.
    pub const SCALE: u64 = 10_000;
    /// 100 %.
    pub const HUNDRED: Percentage = Percentage(100 * Self::SCALE);
    /// Allowed distance of a custom split total from 100 % (0.01 %).
    pub const TOLERANCE: Percentage = Percentage(Self::SCALE / 100);

    #[must_use]
    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    #[must_use]
    pub const fn units(self) -> u64 {
        self.0
    }

    /// Whether `self`, taken as the sum of a custom split, is 100 % within
    /// [`Percentage::TOLERANCE`].
    #[must_use]
    pub const fn is_whole(self) -> bool {
        self.0.abs_diff(Self::HUNDRED.0) <= Self::TOLERANCE.0
    }
}

impl Add for Percentage {
    type Output = Percentage;

    fn add(self, rhs: Percentage) -> Self::Output {
        Percentage(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Percentage {
    fn sum<I: Iterator<Item = Percentage>>(iter: I) -> Self {
        iter.fold(Percentage(0), Add::add)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::SCALE;
        let frac = self.0 % Self::SCALE;
        write!(f, "{whole}.{frac:04}%")
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let major = abs / 100;
        let minor = abs % 100;
        write!(f, "{sign}{major}.{minor:02}")
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(values: &[i64]) -> Vec<Money> {
        values.iter().copied().map(Money::new).collect()
    }

    #[test]
    fn display_formats_major_units() {
        assert_eq!(Money::new(0).to_string(), "0.00");
        assert_eq!(Money::new(1).to_string(), "0.01");
        assert_eq!(Money::new(1050).to_string(), "10.50");
        assert_eq!(Money::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn percent_rounds_half_up() {
        let half = Percentage::from_units(50 * Percentage::SCALE);
        assert_eq!(Money::new(3).percent(half).minor(), 2);
        assert_eq!(Money::new(1000).percent(Percentage::HUNDRED).minor(), 1000);
        assert_eq!(
            Money::new(999).percent(Percentage::from_units(33_3333)).minor(),
            333
        );
    }

    #[test]
    fn div_round_handles_zero_and_halves() {
        assert_eq!(Money::new(10).div_round(0), Money::ZERO);
        assert_eq!(Money::new(5).div_round(2).minor(), 3);
        assert_eq!(Money::new(4600).div_round(3).minor(), 1533);
    }

    #[test]
    fn reconcile_adds_positive_difference_to_first() {
        let mut shares = money(&[333, 333, 333]);
        reconcile_remainder(Money::new(1000), &mut shares);
        assert_eq!(shares, money(&[334, 333, 333]));
    }

    #[test]
    fn reconcile_never_drives_a_share_negative() {
        // 2 over 4 participants at 25 % rounds every share up to 1.
        let mut shares = money(&[1, 1, 1, 1]);
        reconcile_remainder(Money::new(2), &mut shares);
        assert_eq!(shares, money(&[0, 0, 1, 1]));
    }

    #[test]
    fn pro_rata_sums_to_total() {
        let shares = pro_rata(Money::new(1001), &[1, 1, 1], 3);
        assert_eq!(shares, money(&[333, 334, 334]));
        assert_eq!(shares.iter().copied().sum::<Money>(), Money::new(1001));
    }

    #[test]
    fn checked_sum_detects_overflow() {
        assert_eq!(Money::checked_sum(money(&[1, 2, 3])), Some(Money::new(6)));
        assert_eq!(Money::checked_sum(money(&[i64::MAX, 1])), None);
        assert_eq!(Money::checked_sum(Vec::new()), Some(Money::ZERO));
    }

    #[test]
    fn percentage_tolerance() {
        assert!(Percentage::from_units(99_9950).is_whole());
        assert!(Percentage::from_units(100_0050).is_whole());
        assert!(!Percentage::from_units(99_9899).is_whole());
        assert!(!Percentage::from_units(90_0000).is_whole());
        assert!(!Percentage::from_units(110_0000).is_whole());
    }
}
