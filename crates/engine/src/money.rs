use std::fmt;

/// Signed money amount represented as integer **minor units** (cents).
///
/// The engine stores every monetary value as `i64` minor units to avoid
/// floating-point drift; `Money` exists for formatting and for the
/// commission arithmetic.
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
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
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

    /// Applies a rate expressed in basis points (1 bps = 0.01%), rounding
    /// half away from zero.
    ///
    /// ```rust
    /// use engine::Money;
    ///
    /// assert_eq!(Money::new(10_000).apply_bps(1_000), Money::new(1_000));
    /// assert_eq!(Money::new(5).apply_bps(1_000), Money::new(1));
    /// ```
    #[must_use]
    pub fn apply_bps(self, bps: i32) -> Money {
        let product = i128::from(self.0) * i128::from(bps);
        let half = if product >= 0 { 5_000 } else { -5_000 };
        let rounded = (product + half) / 10_000;
        Money(rounded.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
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
