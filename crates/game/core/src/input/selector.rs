//! Single-slot queue of pending local decisions.
//!
//! At most one selector is visible per client. Further requests wait in FIFO
//! order and are shown as soon as the visible one is resolved or canceled.
use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, error};

use crate::essence::EssenceSelection;
use crate::registry::{AbilityId, TappableId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectorId(pub u32);

impl fmt::Display for SelectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Who asked for the decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requester {
    Ability(AbilityId),
    CardPlay(TappableId),
    Buy(TappableId),
    Discard(TappableId),
    Income,
    AttackResponse { ability: AbilityId },
}

impl Requester {
    /// Requests that belong to the current player's turn action.
    pub fn is_turn_input(&self) -> bool {
        matches!(
            self,
            Requester::Ability(_)
                | Requester::CardPlay(_)
                | Requester::Buy(_)
                | Requester::Discard(_)
        )
    }
}

/// What is being asked.
#[derive(Clone, Debug, PartialEq, Eq, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SelectorKind {
    /// Pick one card.
    Target { candidates: Vec<TappableId> },
    /// Settle an indeterminate cost from `available`.
    Cost {
        template: EssenceSelection,
        available: EssenceSelection,
    },
    /// Settle an indeterminate gain.
    Output { template: EssenceSelection },
    /// One gold or two essences of other kinds.
    DiscardGain,
    /// Settle every indeterminate income source.
    Income {
        sources: Vec<(TappableId, EssenceSelection)>,
    },
    /// Protect with one of `protectors` or suffer `loss`.
    AttackResponse {
        loss: EssenceSelection,
        protectors: Vec<TappableId>,
    },
}

/// A player's answer to the visible selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionResult {
    Target(TappableId),
    Essences(EssenceSelection),
    Income(Vec<(TappableId, EssenceSelection)>),
    Protect(Option<TappableId>),
}

impl SelectionResult {
    /// Returns true if this kind of answer belongs to `kind`.
    pub fn fits(&self, kind: &SelectorKind) -> bool {
        matches!(
            (self, kind),
            (SelectionResult::Target(_), SelectorKind::Target { .. })
                | (SelectionResult::Essences(_), SelectorKind::Cost { .. })
                | (SelectionResult::Essences(_), SelectorKind::Output { .. })
                | (SelectionResult::Essences(_), SelectorKind::DiscardGain)
                | (SelectionResult::Income(_), SelectorKind::Income { .. })
                | (SelectionResult::Protect(_), SelectorKind::AttackResponse { .. })
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    pub id: SelectorId,
    pub requester: Requester,
    pub kind: SelectorKind,
    cancelable: bool,
}

impl Selector {
    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }
}

#[derive(Clone, Debug, Default)]
pub struct SelectorQueue {
    next_id: u32,
    visible: Option<Selector>,
    waiting: VecDeque<Selector>,
}

impl SelectorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a request and shows it if nothing else is visible.
    pub fn push(&mut self, requester: Requester, kind: SelectorKind) -> SelectorId {
        let id = SelectorId(self.next_id);
        self.next_id += 1;
        debug!(
            target: "arcana::selector",
            %id,
            ?requester,
            kind = kind.as_ref(),
            "selector queued"
        );
        self.waiting.push_back(Selector {
            id,
            requester,
            kind,
            cancelable: true,
        });
        self.show();
        id
    }

    /// Makes the next waiting selector visible if the slot is free.
    pub fn show(&mut self) -> Option<&Selector> {
        if self.visible.is_none() {
            self.visible = self.waiting.pop_front();
        }
        self.visible.as_ref()
    }

    pub fn current(&self) -> Option<&Selector> {
        self.visible.as_ref()
    }

    /// Marks a mandatory decision.
    pub fn disable_cancel(&mut self, id: SelectorId) -> bool {
        match self.find_mut(id) {
            Some(selector) => {
                selector.cancelable = false;
                true
            }
            None => false,
        }
    }

    /// Removes the visible selector so its answer can be processed.
    pub fn take(&mut self) -> Option<Selector> {
        let taken = self.visible.take();
        self.show();
        taken
    }

    /// Puts a taken selector back in the visible slot, e.g. after an answer
    /// was rejected.
    pub fn restore(&mut self, selector: Selector) {
        if let Some(shown) = self.visible.replace(selector) {
            self.waiting.push_front(shown);
        }
    }

    /// Cancels the visible selector. Mandatory selectors stay in place.
    pub fn cancel(&mut self) -> Option<Selector> {
        let selector = self.visible.as_ref()?;
        if !selector.cancelable {
            error!(
                target: "arcana::selector",
                id = %selector.id,
                requester = ?selector.requester,
                "attempted to cancel a mandatory selector"
            );
            return None;
        }
        self.take()
    }

    /// Drops every selector, visible or waiting, that matches `filter`.
    pub fn discard_where(&mut self, filter: impl Fn(&Requester) -> bool) -> usize {
        let before = self.len();
        if self
            .visible
            .as_ref()
            .is_some_and(|selector| filter(&selector.requester))
        {
            self.visible = None;
        }
        self.waiting.retain(|selector| !filter(&selector.requester));
        self.show();
        before - self.len()
    }

    pub fn contains(&self, requester: Requester) -> bool {
        self.iter().any(|selector| selector.requester == requester)
    }

    pub fn len(&self) -> usize {
        usize::from(self.visible.is_some()) + self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selector> {
        self.visible.iter().chain(self.waiting.iter())
    }

    fn find_mut(&mut self, id: SelectorId) -> Option<&mut Selector> {
        self.visible
            .iter_mut()
            .chain(self.waiting.iter_mut())
            .find(|selector| selector.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(ids: &[u32]) -> SelectorKind {
        SelectorKind::Target {
            candidates: ids.iter().map(|id| TappableId(*id)).collect(),
        }
    }

    #[test]
    fn only_one_selector_is_visible_at_a_time() {
        let mut queue = SelectorQueue::new();
        let first = queue.push(Requester::Ability(AbilityId(0)), target(&[1]));
        let second = queue.push(Requester::Income, SelectorKind::DiscardGain);
        assert_eq!(queue.current().map(|s| s.id), Some(first));
        assert_eq!(queue.len(), 2);

        let taken = queue.take().unwrap();
        assert_eq!(taken.id, first);
        assert_eq!(queue.current().map(|s| s.id), Some(second));
    }

    #[test]
    fn mandatory_selectors_cannot_be_canceled() {
        let mut queue = SelectorQueue::new();
        let id = queue.push(Requester::Income, SelectorKind::DiscardGain);
        assert!(queue.disable_cancel(id));
        assert!(queue.cancel().is_none());
        assert_eq!(queue.current().map(|s| s.id), Some(id));
    }

    #[test]
    fn cancel_shows_the_next_request() {
        let mut queue = SelectorQueue::new();
        queue.push(Requester::CardPlay(TappableId(3)), SelectorKind::DiscardGain);
        let next = queue.push(Requester::Income, SelectorKind::DiscardGain);
        assert!(queue.cancel().is_some());
        assert_eq!(queue.current().map(|s| s.id), Some(next));
    }

    #[test]
    fn restore_puts_a_rejected_answer_back_on_top() {
        let mut queue = SelectorQueue::new();
        let first = queue.push(Requester::Ability(AbilityId(1)), target(&[1, 2]));
        queue.push(Requester::Income, SelectorKind::DiscardGain);
        let taken = queue.take().unwrap();
        queue.restore(taken);
        assert_eq!(queue.current().map(|s| s.id), Some(first));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn discard_where_drops_matching_requests() {
        let mut queue = SelectorQueue::new();
        queue.push(Requester::Ability(AbilityId(1)), target(&[1]));
        queue.push(Requester::Ability(AbilityId(1)), SelectorKind::DiscardGain);
        let kept = queue.push(Requester::Income, SelectorKind::DiscardGain);
        assert_eq!(queue.discard_where(Requester::is_turn_input), 2);
        assert_eq!(queue.current().map(|s| s.id), Some(kept));
    }

    #[test]
    fn results_fit_their_selector_kind() {
        assert!(SelectionResult::Target(TappableId(1)).fits(&target(&[1])));
        assert!(!SelectionResult::Protect(None).fits(&target(&[1])));
        assert!(SelectionResult::Essences(EssenceSelection::zero()).fits(&SelectorKind::DiscardGain));
    }
}
