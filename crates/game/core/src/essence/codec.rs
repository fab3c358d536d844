//! String form of [`EssenceSelection`].
//!
//! `e:l:c:d:g:x` with one signed integer per slot, optionally followed by `~`
//! and the excluded kinds joined with `.`:
//!
//! ```text
//! 2:0:0:0:0:0          two elan
//! 0:0:0:0:0:2~gold     two of anything but gold
//! ```
//!
//! The form avoids every separator the wire envelope uses.
use core::fmt;
use core::str::FromStr;

use super::{EssenceKind, EssenceMask, EssenceParseError, EssenceSelection};

const SLOT_SEP: char = ':';
const EXCLUDE_SEP: char = '~';
const KIND_SEP: char = '.';

impl fmt::Display for EssenceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, value) in self.values().iter().enumerate() {
            if index > 0 {
                write!(f, "{SLOT_SEP}")?;
            }
            write!(f, "{value}")?;
        }
        if !self.excluded().is_empty() {
            write!(f, "{EXCLUDE_SEP}")?;
            for (index, kind) in self.excluded().kinds().enumerate() {
                if index > 0 {
                    write!(f, "{KIND_SEP}")?;
                }
                write!(f, "{kind}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for EssenceSelection {
    type Err = EssenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (slots, excluded) = match s.split_once(EXCLUDE_SEP) {
            Some((slots, excluded)) => (slots, Some(excluded)),
            None => (s, None),
        };

        let raw: Vec<&str> = slots.split(SLOT_SEP).collect();
        if raw.len() != EssenceSelection::SLOTS {
            return Err(EssenceParseError::SlotCount {
                expected: EssenceSelection::SLOTS,
                found: raw.len(),
            });
        }

        let mut values = [0; EssenceSelection::SLOTS];
        for (slot, value) in raw.iter().enumerate() {
            let invalid = || EssenceParseError::InvalidAmount {
                slot,
                value: (*value).to_string(),
            };
            let amount: i32 = value.trim().parse().map_err(|_| invalid())?;
            if amount.abs() > EssenceSelection::MAX_AMOUNT {
                return Err(invalid());
            }
            values[slot] = amount;
        }

        let mut mask = EssenceMask::empty();
        for name in excluded
            .into_iter()
            .flat_map(|list| list.split(KIND_SEP))
            .filter(|name| !name.is_empty())
        {
            let kind: EssenceKind = name
                .parse()
                .map_err(|_| EssenceParseError::UnknownKind(name.to_string()))?;
            mask |= kind.mask();
        }

        Ok(EssenceSelection::new(values, mask))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for EssenceSelection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for EssenceSelection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formats_determined_selection_without_exclusions() {
        let cost = EssenceSelection::of(EssenceKind::Elan, 2);
        assert_eq!(cost.to_string(), "2:0:0:0:0:0");
    }

    #[test]
    fn formats_exclusions_in_slot_order() {
        let cost = EssenceSelection::any_except(2, EssenceMask::GOLD | EssenceMask::LIFE);
        assert_eq!(cost.to_string(), "0:0:0:0:0:2~life.gold");
    }

    #[test]
    fn rejects_wrong_slot_count() {
        let err = "1:2:3".parse::<EssenceSelection>().unwrap_err();
        assert_eq!(
            err,
            EssenceParseError::SlotCount {
                expected: 6,
                found: 3
            }
        );
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = "0:0:0:0:0:1~mana".parse::<EssenceSelection>().unwrap_err();
        assert_eq!(err, EssenceParseError::UnknownKind("mana".into()));
    }

    #[test]
    fn accepts_negative_amounts() {
        let delta: EssenceSelection = "-1:0:0:0:2:0".parse().unwrap();
        assert_eq!(delta.get(EssenceKind::Elan), -1);
        assert_eq!(delta.get(EssenceKind::Gold), 2);
    }

    #[test]
    fn rejects_amounts_past_the_slot_limit() {
        let err = "2147483647:2147483647:0:0:0:0"
            .parse::<EssenceSelection>()
            .unwrap_err();
        assert_eq!(
            err,
            EssenceParseError::InvalidAmount {
                slot: 0,
                value: "2147483647".into()
            }
        );
        assert!("-10000:0:0:0:0:0".parse::<EssenceSelection>().is_err());
        assert!("9999:0:0:0:0:0".parse::<EssenceSelection>().is_ok());
    }

    proptest! {
        #[test]
        fn string_form_round_trips(
            values in prop::array::uniform6(-20i32..20),
            mask in 0u8..32,
        ) {
            let selection = EssenceSelection::new(values, EssenceMask::from_bits_truncate(mask));
            let parsed: EssenceSelection = selection.to_string().parse().unwrap();
            prop_assert_eq!(parsed, selection);
        }
    }
}
