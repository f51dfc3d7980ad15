//! Integer-cents money type.
//!
//! The portal's hosted API speaks decimal-dollar JSON numbers, but doing the
//! drawer math in binary floating point makes the "drawer is exactly balanced"
//! comparison unreliable. All arithmetic in this crate therefore runs on
//! integer cents; conversion to/from decimal dollars happens only at the
//! serde boundary.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A currency amount in integer cents. Signed — short/over variances are
/// negative when the drawer comes up short.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub const fn from_cents(cents: i64) -> Cents {
        Cents(cents)
    }

    /// Convert operator-typed decimal dollars to cents, rounding half away
    /// from zero to the nearest cent. Non-finite input collapses to zero.
    pub fn from_dollars(dollars: f64) -> Cents {
        if !dollars.is_finite() {
            return Cents(0);
        }
        Cents((dollars * 100.0).round() as i64)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn to_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn abs(self) -> Cents {
        Cents(self.0.abs())
    }

    /// `"$123.45"` — minus sign for negative amounts, never a plus.
    pub fn format_unsigned(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        format!("{sign}${}.{:02}", abs / 100, abs % 100)
    }

    /// `"+$10.00"` / `"-$20.00"` / `"$0.00"` — explicit sign for non-zero
    /// amounts, used for the short/over display.
    pub fn format_signed(self) -> String {
        let sign = match self.0 {
            n if n > 0 => "+",
            n if n < 0 => "-",
            _ => "",
        };
        let abs = self.0.abs();
        format!("{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_unsigned())
    }
}

impl Add for Cents {
    type Output = Cents;
    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0 + rhs.0)
    }
}

impl Sub for Cents {
    type Output = Cents;
    fn sub(self, rhs: Cents) -> Cents {
        Cents(self.0 - rhs.0)
    }
}

impl Neg for Cents {
    type Output = Cents;
    fn neg(self) -> Cents {
        Cents(-self.0)
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Cents) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Cents {
    fn sub_assign(&mut self, rhs: Cents) {
        self.0 -= rhs.0;
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        Cents(iter.map(|c| c.0).sum())
    }
}

// Wire shape: decimal dollars, matching the portal's report payloads.
impl Serialize for Cents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_dollars())
    }
}

impl<'de> Deserialize<'de> for Cents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Cents, D::Error> {
        let dollars = f64::deserialize(deserializer)?;
        Ok(Cents::from_dollars(dollars))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
