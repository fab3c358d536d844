//! Essence vectors: the currency used for costs, incomes and rewards.
//!
//! - [`EssenceKind`]: the five resource kinds
//! - [`EssenceMask`]: a set of kinds, used as the exclusion set
//! - [`EssenceSelection`]: fixed-size signed vector with an indeterminate slot
//! - `codec`: the `e:l:c:d:g:x~kind.kind` string form used on the wire
mod codec;
mod error;
mod selection;

pub use error::EssenceParseError;
pub use selection::EssenceSelection;

use bitflags::bitflags;

/// The resource kinds a player can hold.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EssenceKind {
    Elan,
    Life,
    Calm,
    Death,
    Gold,
}

impl EssenceKind {
    /// Number of concrete kinds (the indeterminate slot is not a kind).
    pub const COUNT: usize = 5;

    /// Every kind in slot order.
    pub const ALL: [EssenceKind; Self::COUNT] = [
        EssenceKind::Elan,
        EssenceKind::Life,
        EssenceKind::Calm,
        EssenceKind::Death,
        EssenceKind::Gold,
    ];

    /// Slot index of this kind inside an [`EssenceSelection`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Single-kind mask.
    pub const fn mask(self) -> EssenceMask {
        match self {
            EssenceKind::Elan => EssenceMask::ELAN,
            EssenceKind::Life => EssenceMask::LIFE,
            EssenceKind::Calm => EssenceMask::CALM,
            EssenceKind::Death => EssenceMask::DEATH,
            EssenceKind::Gold => EssenceMask::GOLD,
        }
    }
}

bitflags! {
    /// Set of essence kinds.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct EssenceMask: u8 {
        const ELAN = 1 << 0;
        const LIFE = 1 << 1;
        const CALM = 1 << 2;
        const DEATH = 1 << 3;
        const GOLD = 1 << 4;
    }
}

impl EssenceMask {
    /// Returns true if `kind` is part of the set.
    #[inline]
    pub fn has(self, kind: EssenceKind) -> bool {
        self.contains(kind.mask())
    }

    /// Iterates over the kinds in the set, in slot order.
    pub fn kinds(self) -> impl Iterator<Item = EssenceKind> {
        EssenceKind::ALL.into_iter().filter(move |kind| self.has(*kind))
    }
}
