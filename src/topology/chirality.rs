//! Chirality: the two-element orientation group relating a local frame
//! (a cell's or face's view of a sub-element) to that sub-element's
//! canonical orientation.
//!
//! Compose = sign product; inverse = self (group C₂). Incidence records in
//! the mesh graph carry one `Chirality` each, and puncture propagation
//! multiplies them along the incidence chain.

use std::fmt;
use std::ops::{Mul, Neg};

use crate::vortex_error::VortexError;

/// ±1 orientation sign; `Pos` means "same orientation as canonical".
#[derive(Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Chirality {
    /// Opposite orientation (reflected / reversed).
    Neg,
    /// Same orientation as the canonical form.
    Pos,
}

impl Chirality {
    /// Group composition (sign product).
    #[inline]
    pub fn compose(a: Self, b: Self) -> Self {
        if a == b { Chirality::Pos } else { Chirality::Neg }
    }

    /// Group inverse; every element of C₂ is its own inverse.
    #[inline]
    pub fn inverse(a: Self) -> Self {
        a
    }

    /// The sign as an integer, `+1` or `-1`.
    #[inline]
    pub const fn sign(self) -> i32 {
        match self {
            Chirality::Pos => 1,
            Chirality::Neg => -1,
        }
    }

    /// Builds a chirality from an integer sign.
    ///
    /// Zero and any magnitude other than 1 are rejected; puncture slots
    /// express "no puncture" as `Option::None`, never as a zero sign.
    #[inline]
    pub fn from_sign(sign: i32) -> Result<Self, VortexError> {
        match sign {
            1 => Ok(Chirality::Pos),
            -1 => Ok(Chirality::Neg),
            other => Err(VortexError::InvalidChirality(other)),
        }
    }
}

impl Mul for Chirality {
    type Output = Chirality;
    #[inline]
    fn mul(self, rhs: Chirality) -> Chirality {
        Chirality::compose(self, rhs)
    }
}

impl Neg for Chirality {
    type Output = Chirality;
    #[inline]
    fn neg(self) -> Chirality {
        match self {
            Chirality::Pos => Chirality::Neg,
            Chirality::Neg => Chirality::Pos,
        }
    }
}

impl fmt::Debug for Chirality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Chirality::Pos => "Pos",
            Chirality::Neg => "Neg",
        })
    }
}

impl fmt::Display for Chirality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Chirality::Pos => "+1",
            Chirality::Neg => "-1",
        })
    }
}
