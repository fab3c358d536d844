//! Default answers for every selector kind.
use arcana_core::{EssenceKind, EssenceSelection, SelectionResult, SelectorKind};

/// A legal answer for `kind`, or `None` when nothing can be picked.
pub fn answer(kind: &SelectorKind) -> Option<SelectionResult> {
    let result = match kind {
        SelectorKind::Target { candidates } => SelectionResult::Target(*candidates.first()?),
        SelectorKind::Cost {
            template,
            available,
        } => SelectionResult::Essences(pay(template, available)?),
        SelectorKind::Output { template } => {
            SelectionResult::Essences(template.default_resolution())
        }
        SelectorKind::DiscardGain => {
            SelectionResult::Essences(EssenceSelection::of(EssenceKind::Gold, 1))
        }
        SelectorKind::Income { sources } => SelectionResult::Income(
            sources
                .iter()
                .map(|(card, collect)| (*card, collect.default_resolution()))
                .collect(),
        ),
        SelectorKind::AttackResponse { protectors, .. } => {
            SelectionResult::Protect(protectors.first().copied())
        }
    };
    Some(result)
}

/// Settles `template` from `available`, spending gold last.
pub fn pay(template: &EssenceSelection, available: &EssenceSelection) -> Option<EssenceSelection> {
    if !template.is_payable(available) {
        return None;
    }
    let mut payment = template.determined_part();
    let mut remainder = template.indeterminate().max(0);
    for kind in EssenceKind::ALL {
        if remainder == 0 {
            break;
        }
        if template.is_excluded(kind) {
            continue;
        }
        let spare = (available.get(kind) - payment.get(kind)).max(0);
        let used = spare.min(remainder);
        payment.set(kind, payment.get(kind) + used);
        remainder -= used;
    }
    (remainder == 0).then_some(payment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcana_core::{EssenceMask, TappableId};

    #[test]
    fn payment_covers_the_template_and_saves_gold() {
        let mut template = EssenceSelection::of(EssenceKind::Life, 1);
        template.set_indeterminate(2);
        let wallet = EssenceSelection::from_pairs(&[
            (EssenceKind::Life, 1),
            (EssenceKind::Calm, 1),
            (EssenceKind::Gold, 3),
        ]);
        let payment = pay(&template, &wallet).unwrap();
        assert!(payment.is_resolution_of(&template));
        assert_eq!(payment.get(EssenceKind::Calm), 1);
        assert_eq!(payment.get(EssenceKind::Gold), 1);
    }

    #[test]
    fn excluded_kinds_are_never_spent() {
        let template = EssenceSelection::any_except(2, EssenceMask::GOLD);
        let wallet = EssenceSelection::of(EssenceKind::Gold, 5);
        assert_eq!(pay(&template, &wallet), None);
    }

    #[test]
    fn attacks_are_blocked_when_possible() {
        let loss = EssenceSelection::of(EssenceKind::Life, 1);
        let protector = TappableId(4);
        assert_eq!(
            answer(&SelectorKind::AttackResponse {
                loss,
                protectors: vec![protector],
            }),
            Some(SelectionResult::Protect(Some(protector)))
        );
        assert_eq!(
            answer(&SelectorKind::AttackResponse {
                loss,
                protectors: Vec::new(),
            }),
            Some(SelectionResult::Protect(None))
        );
    }

    #[test]
    fn an_empty_target_list_has_no_answer() {
        assert_eq!(answer(&SelectorKind::Target { candidates: Vec::new() }), None);
    }
}
