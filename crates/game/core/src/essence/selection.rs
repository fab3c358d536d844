use core::ops::{Add, AddAssign, Sub, SubAssign};

use super::{EssenceKind, EssenceMask};

/// Fixed-size essence vector with one indeterminate slot.
///
/// Slots `0..COUNT` hold determined amounts per [`EssenceKind`]. The last slot
/// holds an amount that is still to be distributed among the kinds that are
/// not part of the exclusion set. A selection is *determined* iff that slot is
/// zero.
///
/// The same type is used for player pools (always determined), card costs and
/// ability templates (possibly indeterminate) and broadcast payloads (always
/// determined).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct EssenceSelection {
    values: [i32; EssenceSelection::SLOTS],
    excluded: EssenceMask,
}

impl EssenceSelection {
    /// Number of slots: one per kind plus the indeterminate slot.
    pub const SLOTS: usize = EssenceKind::COUNT + 1;
    /// Index of the indeterminate slot.
    pub const INDETERMINATE: usize = EssenceKind::COUNT;
    /// Largest magnitude the string form accepts in any slot.
    pub const MAX_AMOUNT: i32 = 9_999;

    pub const fn new(values: [i32; Self::SLOTS], excluded: EssenceMask) -> Self {
        Self { values, excluded }
    }

    pub const fn zero() -> Self {
        Self {
            values: [0; Self::SLOTS],
            excluded: EssenceMask::empty(),
        }
    }

    /// `amount` of a single kind.
    pub fn of(kind: EssenceKind, amount: i32) -> Self {
        Self::zero().with(kind, amount)
    }

    /// `amount` of any kind.
    pub fn any(amount: i32) -> Self {
        Self::any_except(amount, EssenceMask::empty())
    }

    /// `amount` of any kind outside `excluded`.
    pub fn any_except(amount: i32, excluded: EssenceMask) -> Self {
        let mut selection = Self::zero();
        selection.values[Self::INDETERMINATE] = amount;
        selection.excluded = excluded;
        selection
    }

    /// Builds a determined selection from `(kind, amount)` pairs.
    pub fn from_pairs(pairs: &[(EssenceKind, i32)]) -> Self {
        pairs
            .iter()
            .fold(Self::zero(), |acc, (kind, amount)| acc.with(*kind, *amount))
    }

    /// Adds `amount` of `kind` (builder style).
    #[must_use]
    pub fn with(mut self, kind: EssenceKind, amount: i32) -> Self {
        self.values[kind.index()] += amount;
        self
    }

    #[must_use]
    pub fn with_excluded(mut self, excluded: EssenceMask) -> Self {
        self.excluded = excluded;
        self
    }

    #[inline]
    pub fn get(&self, kind: EssenceKind) -> i32 {
        self.values[kind.index()]
    }

    #[inline]
    pub fn set(&mut self, kind: EssenceKind, amount: i32) {
        self.values[kind.index()] = amount;
    }

    #[inline]
    pub fn indeterminate(&self) -> i32 {
        self.values[Self::INDETERMINATE]
    }

    pub fn set_indeterminate(&mut self, amount: i32) {
        self.values[Self::INDETERMINATE] = amount;
    }

    pub fn values(&self) -> &[i32; Self::SLOTS] {
        &self.values
    }

    pub fn excluded(&self) -> EssenceMask {
        self.excluded
    }

    pub fn is_excluded(&self, kind: EssenceKind) -> bool {
        self.excluded.has(kind)
    }

    pub fn exclude(&mut self, kind: EssenceKind) {
        self.excluded |= kind.mask();
    }

    /// Excludes every kind, so no kind may absorb an indeterminate remainder.
    pub fn exclude_all(&mut self) {
        self.excluded = EssenceMask::all();
    }

    #[inline]
    pub fn is_determined(&self) -> bool {
        self.indeterminate() == 0
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|value| *value == 0)
    }

    /// Sum of every slot, indeterminate included.
    pub fn total(&self) -> i32 {
        self.values.iter().sum()
    }

    /// Sum of the determined slots only.
    pub fn determined_total(&self) -> i32 {
        self.values[..EssenceKind::COUNT].iter().sum()
    }

    /// Non-zero determined amounts in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EssenceKind, i32)> + '_ {
        EssenceKind::ALL
            .into_iter()
            .map(|kind| (kind, self.get(kind)))
            .filter(|(_, amount)| *amount != 0)
    }

    /// Adds every slot of `other`; the exclusion sets are merged.
    pub fn add(&mut self, other: &Self) {
        for (slot, value) in self.values.iter_mut().zip(other.values.iter()) {
            *slot += *value;
        }
        self.excluded |= other.excluded;
    }

    /// Subtracts every slot of `other`. Callers check payability first; the
    /// result is not clamped.
    pub fn subtract(&mut self, other: &Self) {
        for (slot, value) in self.values.iter_mut().zip(other.values.iter()) {
            *slot -= *value;
        }
    }

    /// Slot-wise `self - other`, keeping this selection's exclusion set.
    pub fn get_difference(&self, other: &Self) -> Self {
        let mut difference = *self;
        difference.subtract(other);
        difference.excluded = self.excluded;
        difference
    }

    /// Applies a cost reduction.
    ///
    /// Each determined kind is reduced by at most what is owed for that kind.
    /// The reduction that could not be applied, plus the reduction's own
    /// indeterminate amount, is taken off the indeterminate slot. Nothing
    /// drops below zero.
    pub fn reduce(&mut self, reduction: &Self) {
        let mut leftover = reduction.indeterminate().max(0);
        for kind in EssenceKind::ALL {
            let owed = self.get(kind).max(0);
            let offered = reduction.get(kind).max(0);
            let applied = offered.min(owed);
            self.set(kind, owed - applied);
            leftover += offered - applied;
        }
        let remaining = (self.indeterminate() - leftover).max(0);
        self.set_indeterminate(remaining);
    }

    /// Every slot multiplied by `factor`.
    pub fn scale(&self, factor: i32) -> Self {
        let mut scaled = *self;
        for slot in scaled.values.iter_mut() {
            *slot *= factor;
        }
        scaled
    }

    /// Determined amounts limited to what `available` holds per kind.
    ///
    /// Used for losses: a player never loses more than they have.
    pub fn clamp_to(&self, available: &Self) -> Self {
        let mut clamped = Self::zero();
        for kind in EssenceKind::ALL {
            let amount = self.get(kind).max(0).min(available.get(kind).max(0));
            clamped.set(kind, amount);
        }
        clamped
    }

    /// Returns true if `available` can pay this selection as a cost.
    ///
    /// Two phases: every determined amount must be covered by the matching
    /// kind, then the capacity left over on non-excluded kinds must cover the
    /// indeterminate amount.
    pub fn is_payable(&self, available: &Self) -> bool {
        self.remaining_capacity(available, None)
            .is_some_and(|pool| pool >= self.indeterminate().max(0))
    }

    /// Like [`Self::is_payable`], but each kind contributes at most `cap` to
    /// the pooled remainder.
    pub fn is_payable_capped(&self, available: &Self, cap: i32) -> bool {
        self.remaining_capacity(available, Some(cap.max(0)))
            .is_some_and(|pool| pool >= self.indeterminate().max(0))
    }

    fn remaining_capacity(&self, available: &Self, cap: Option<i32>) -> Option<i32> {
        let mut pool: i32 = 0;
        for kind in EssenceKind::ALL {
            let remaining = available.get(kind).checked_sub(self.get(kind).max(0))?;
            if remaining < 0 {
                return None;
            }
            if !self.is_excluded(kind) {
                pool = pool.saturating_add(cap.map_or(remaining, |cap| remaining.min(cap)));
            }
        }
        Some(pool)
    }

    /// Returns true if this determined selection is a legal way to settle
    /// `template`.
    ///
    /// Every determined amount of the template must be present, and the extra
    /// amounts (only on non-excluded kinds) must add up to exactly the
    /// template's indeterminate amount.
    pub fn is_resolution_of(&self, template: &Self) -> bool {
        if !self.is_determined() {
            return false;
        }
        let mut distributed: i32 = 0;
        for kind in EssenceKind::ALL {
            let Some(extra) = self.get(kind).checked_sub(template.get(kind).max(0)) else {
                return false;
            };
            if extra < 0 {
                return false;
            }
            if extra > 0 && template.is_excluded(kind) {
                return false;
            }
            let Some(sum) = distributed.checked_add(extra) else {
                return false;
            };
            distributed = sum;
        }
        distributed == template.indeterminate().max(0)
    }

    /// Settles the indeterminate amount onto the first non-excluded kind.
    ///
    /// Used wherever a decision has to be made without a player, e.g. for
    /// disconnected players' income. If every kind is excluded the remainder
    /// is dropped.
    pub fn default_resolution(&self) -> Self {
        let mut resolved = *self;
        let remainder = resolved.indeterminate().max(0);
        resolved.set_indeterminate(0);
        resolved.excluded = EssenceMask::empty();
        if let Some(kind) = EssenceKind::ALL
            .into_iter()
            .find(|kind| !self.is_excluded(*kind))
        {
            resolved.values[kind.index()] += remainder;
        }
        resolved
    }

    /// The determined amounts alone, with no indeterminate slot and no
    /// exclusions. This is what lands in a player's pool.
    pub fn determined_part(&self) -> Self {
        let mut part = Self::zero();
        part.values[..EssenceKind::COUNT].copy_from_slice(&self.values[..EssenceKind::COUNT]);
        part
    }

    /// Returns true if both selections hold the same amounts, ignoring the
    /// exclusion sets.
    pub fn same_amounts(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Add for EssenceSelection {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        EssenceSelection::add(&mut self, &rhs);
        self
    }
}

impl AddAssign for EssenceSelection {
    fn add_assign(&mut self, rhs: Self) {
        EssenceSelection::add(self, &rhs);
    }
}

impl Sub for EssenceSelection {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        self.subtract(&rhs);
        self
    }
}

impl SubAssign for EssenceSelection {
    fn sub_assign(&mut self, rhs: Self) {
        self.subtract(&rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pool(elan: i32, life: i32, calm: i32, death: i32, gold: i32) -> EssenceSelection {
        EssenceSelection::new([elan, life, calm, death, gold, 0], EssenceMask::empty())
    }

    #[test]
    fn determined_iff_indeterminate_slot_is_zero() {
        assert!(EssenceSelection::of(EssenceKind::Gold, 3).is_determined());
        assert!(!EssenceSelection::any(1).is_determined());
    }

    #[test]
    fn payable_checks_kinds_then_pool() {
        let available = pool(3, 0, 0, 0, 0);
        assert!(EssenceSelection::any(2).is_payable(&available));
        assert!(EssenceSelection::any(3).is_payable(&available));
        assert!(!EssenceSelection::any(4).is_payable(&available));

        let mixed = EssenceSelection::of(EssenceKind::Elan, 2).with(EssenceKind::Gold, 0);
        let mut cost = mixed;
        cost.set_indeterminate(1);
        assert!(cost.is_payable(&available));
        cost.set_indeterminate(2);
        assert!(!cost.is_payable(&available));
    }

    #[test]
    fn excluded_kinds_do_not_absorb_the_remainder() {
        let available = pool(0, 0, 0, 0, 5);
        let cost = EssenceSelection::any_except(2, EssenceMask::GOLD);
        assert!(!cost.is_payable(&available));
        assert!(EssenceSelection::any(2).is_payable(&available));
    }

    #[test]
    fn excluded_determined_amounts_still_need_cover() {
        let available = pool(0, 0, 0, 0, 0);
        let cost = EssenceSelection::of(EssenceKind::Gold, 1).with_excluded(EssenceMask::GOLD);
        assert!(!cost.is_payable(&available));
    }

    #[test]
    fn capped_payability_limits_each_kind() {
        let available = pool(3, 1, 0, 0, 0);
        let cost = EssenceSelection::any(3);
        assert!(cost.is_payable(&available));
        assert!(!cost.is_payable_capped(&available, 1));
        assert!(cost.is_payable_capped(&available, 2));
    }

    #[test]
    fn reduction_clamps_per_kind_and_spills_into_indeterminate() {
        let mut cost = EssenceSelection::of(EssenceKind::Elan, 1);
        cost.set_indeterminate(2);
        cost.reduce(&EssenceSelection::of(EssenceKind::Elan, 2));
        assert_eq!(cost.get(EssenceKind::Elan), 0);
        assert_eq!(cost.indeterminate(), 1);

        cost.reduce(&EssenceSelection::any(5));
        assert_eq!(cost.indeterminate(), 0);
        assert!(cost.is_zero());
    }

    #[test]
    fn reduction_never_goes_negative() {
        let mut cost = EssenceSelection::of(EssenceKind::Death, 1);
        cost.reduce(&EssenceSelection::of(EssenceKind::Gold, 3));
        assert_eq!(cost.get(EssenceKind::Death), 1);
        assert_eq!(cost.get(EssenceKind::Gold), 0);
        assert_eq!(cost.indeterminate(), 0);
    }

    #[test]
    fn resolution_distributes_exactly_the_remainder() {
        let template = EssenceSelection::any(2);
        assert!(EssenceSelection::of(EssenceKind::Elan, 2).is_resolution_of(&template));
        assert!(
            EssenceSelection::from_pairs(&[(EssenceKind::Life, 1), (EssenceKind::Calm, 1)])
                .is_resolution_of(&template)
        );
        assert!(!EssenceSelection::of(EssenceKind::Elan, 1).is_resolution_of(&template));
        assert!(!EssenceSelection::of(EssenceKind::Elan, 3).is_resolution_of(&template));
        assert!(!template.is_resolution_of(&template));
    }

    #[test]
    fn resolution_respects_exclusions() {
        let template = EssenceSelection::of(EssenceKind::Death, 1)
            .with_excluded(EssenceMask::GOLD)
            + EssenceSelection::any_except(1, EssenceMask::GOLD);
        let with_gold = EssenceSelection::of(EssenceKind::Death, 1).with(EssenceKind::Gold, 1);
        let with_life = EssenceSelection::of(EssenceKind::Death, 1).with(EssenceKind::Life, 1);
        assert!(!with_gold.is_resolution_of(&template));
        assert!(with_life.is_resolution_of(&template));
    }

    #[test]
    fn difference_keeps_own_exclusions() {
        let template = EssenceSelection::any_except(3, EssenceMask::GOLD);
        let partial = EssenceSelection::any(1);
        let difference = template.get_difference(&partial);
        assert_eq!(difference.indeterminate(), 2);
        assert_eq!(difference.excluded(), EssenceMask::GOLD);
    }

    #[test]
    fn default_resolution_uses_first_open_kind() {
        let template = EssenceSelection::any_except(2, EssenceMask::ELAN | EssenceMask::LIFE);
        let resolved = template.default_resolution();
        assert_eq!(resolved.get(EssenceKind::Calm), 2);
        assert!(resolved.is_resolution_of(&template));
    }

    #[test]
    fn clamp_to_limits_losses() {
        let loss = EssenceSelection::of(EssenceKind::Life, 3);
        let clamped = loss.clamp_to(&pool(0, 1, 0, 0, 0));
        assert_eq!(clamped.get(EssenceKind::Life), 1);
    }

    proptest! {
        #[test]
        fn payability_is_monotonic_in_available(
            cost in prop::array::uniform6(0i32..4),
            available in prop::array::uniform6(0i32..6),
            extra in prop::array::uniform6(0i32..4),
            mask in 0u8..32,
        ) {
            let cost = EssenceSelection::new(cost, EssenceMask::from_bits_truncate(mask));
            let available = EssenceSelection::new(available, EssenceMask::empty());
            let more = available + EssenceSelection::new(extra, EssenceMask::empty());
            if cost.is_payable(&available) {
                prop_assert!(cost.is_payable(&more));
            }
        }

        #[test]
        fn default_resolution_settles_open_templates(
            amounts in prop::array::uniform6(0i32..4),
            mask in 0u8..31,
        ) {
            let template = EssenceSelection::new(amounts, EssenceMask::from_bits_truncate(mask));
            prop_assert!(template.default_resolution().is_resolution_of(&template));
        }
    }
}
