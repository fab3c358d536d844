//! Entity identities that survive the trip across the wire.
//!
//! Every player, tappable and ability receives a sequential index from a
//! per-kind counter when it is constructed. Because every client runs the
//! same factories over the same static card lists in the same order, the
//! same logical entity receives the same index everywhere. The printable form
//! `<Kind>#<index>#<context>` is what actions carry; each receiving client
//! resolves it independently.
//!
//! Indices double as arena slots: `TappableId(7)` is `state.tappables[7]`.
mod error;
mod ids;

pub use error::RegistryError;
pub use ids::{AbilityId, EntityKind, EntityRef, PlayerId, TappableId};

use tracing::warn;

const ID_SEP: char = '#';

/// Sequential identity allocator and identifier resolver.
///
/// Single-threaded; owned by the game state and only touched by the
/// simulation thread.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityRegistry {
    /// Owning context of every registered entity, per kind, indexed by id.
    contexts: [Vec<String>; EntityKind::COUNT],
    /// Set once setup has run the card factories.
    frozen: bool,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next index for `kind`. Indices are never reused.
    ///
    /// Registering after [`Self::freeze`] still succeeds but is logged: it
    /// means some client constructed an entity outside the deterministic
    /// setup sequence, so identifiers may no longer line up across clients.
    pub fn register(&mut self, kind: EntityKind, context: &str) -> u32 {
        if self.frozen {
            warn!(
                target: "arcana::registry",
                %kind,
                context,
                "entity registered after setup was frozen; identifiers may diverge across clients"
            );
        }
        let contexts = &mut self.contexts[kind.slot()];
        let index = contexts.len() as u32;
        contexts.push(sanitize_context(context));
        index
    }

    pub fn register_player(&mut self, context: &str) -> PlayerId {
        PlayerId(self.register(EntityKind::Player, context))
    }

    pub fn register_tappable(&mut self, context: &str) -> TappableId {
        TappableId(self.register(EntityKind::Tappable, context))
    }

    pub fn register_ability(&mut self, context: &str) -> AbilityId {
        AbilityId(self.register(EntityKind::Ability, context))
    }

    /// Marks setup as complete.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Number of registered entities of `kind`.
    pub fn len(&self, kind: EntityKind) -> usize {
        self.contexts[kind.slot()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.iter().all(Vec::is_empty)
    }

    /// Owning context of an entity, if registered.
    pub fn context(&self, entity: EntityRef) -> Option<&str> {
        self.contexts[entity.kind().slot()]
            .get(entity.index() as usize)
            .map(String::as_str)
    }

    /// Printable identifier of a registered entity.
    pub fn identifier(&self, entity: impl Into<EntityRef>) -> Option<String> {
        let entity = entity.into();
        let context = self.context(entity)?;
        Some(format!(
            "{}{ID_SEP}{}{ID_SEP}{}",
            entity.kind(),
            entity.index(),
            context
        ))
    }

    /// Resolves an identifier string back to the entity it names.
    pub fn resolve(&self, identifier: &str) -> Result<EntityRef, RegistryError> {
        let mut parts = identifier.splitn(3, ID_SEP);
        let (Some(kind), Some(index), Some(context)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(RegistryError::Malformed(identifier.to_string()));
        };

        let kind: EntityKind = kind
            .parse()
            .map_err(|_| RegistryError::UnknownKind(kind.to_string()))?;
        let index: u32 = index
            .parse()
            .map_err(|_| RegistryError::Malformed(identifier.to_string()))?;

        let entity = EntityRef::from_parts(kind, index);
        let expected = self
            .context(entity)
            .ok_or(RegistryError::NotFound { kind, index })?;
        if expected != context {
            return Err(RegistryError::ContextMismatch {
                kind,
                index,
                expected: expected.to_string(),
                found: context.to_string(),
            });
        }
        Ok(entity)
    }

    pub fn resolve_player(&self, identifier: &str) -> Result<PlayerId, RegistryError> {
        match self.resolve(identifier)? {
            EntityRef::Player(id) => Ok(id),
            other => Err(RegistryError::KindMismatch {
                expected: EntityKind::Player,
                found: other.kind(),
            }),
        }
    }

    pub fn resolve_tappable(&self, identifier: &str) -> Result<TappableId, RegistryError> {
        match self.resolve(identifier)? {
            EntityRef::Tappable(id) => Ok(id),
            other => Err(RegistryError::KindMismatch {
                expected: EntityKind::Tappable,
                found: other.kind(),
            }),
        }
    }

    pub fn resolve_ability(&self, identifier: &str) -> Result<AbilityId, RegistryError> {
        match self.resolve(identifier)? {
            EntityRef::Ability(id) => Ok(id),
            other => Err(RegistryError::KindMismatch {
                expected: EntityKind::Ability,
                found: other.kind(),
            }),
        }
    }
}

/// Keeps contexts free of identifier and envelope separators.
fn sanitize_context(context: &str) -> String {
    let cleaned: String = context
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populate(registry: &mut EntityRegistry) -> (PlayerId, TappableId, AbilityId) {
        let player = registry.register_player("seat0");
        let card = registry.register_tappable("crystal_ball");
        let ability = registry.register_ability("crystal_ball.0");
        (player, card, ability)
    }

    #[test]
    fn indices_are_per_kind_and_monotonic() {
        let mut registry = EntityRegistry::new();
        let (player, card, ability) = populate(&mut registry);
        assert_eq!((player.0, card.0, ability.0), (0, 0, 0));
        assert_eq!(registry.register_tappable("dragon_egg"), TappableId(1));
        assert_eq!(registry.len(EntityKind::Tappable), 2);
    }

    #[test]
    fn identifiers_resolve_back() {
        let mut registry = EntityRegistry::new();
        let (_, card, ability) = populate(&mut registry);
        let ident = registry.identifier(card).unwrap();
        assert_eq!(ident, "Tappable#0#crystal_ball");
        assert_eq!(registry.resolve_tappable(&ident), Ok(card));
        let ident = registry.identifier(ability).unwrap();
        assert_eq!(registry.resolve(&ident), Ok(EntityRef::Ability(ability)));
    }

    #[test]
    fn identical_setup_sequences_yield_identical_identifiers() {
        let mut left = EntityRegistry::new();
        let mut right = EntityRegistry::new();
        let a = populate(&mut left);
        let b = populate(&mut right);
        assert_eq!(left.identifier(a.1), right.identifier(b.1));
        assert_eq!(left.identifier(a.2), right.identifier(b.2));
        assert_eq!(left, right);
    }

    #[test]
    fn resolve_reports_lookup_failures() {
        let mut registry = EntityRegistry::new();
        populate(&mut registry);
        assert_eq!(
            registry.resolve("Tappable#9#crystal_ball"),
            Err(RegistryError::NotFound {
                kind: EntityKind::Tappable,
                index: 9
            })
        );
        assert!(matches!(
            registry.resolve("Tappable#0#dragon_egg"),
            Err(RegistryError::ContextMismatch { .. })
        ));
        assert!(matches!(
            registry.resolve("Wizard#0#x"),
            Err(RegistryError::UnknownKind(_))
        ));
        assert!(matches!(
            registry.resolve("Tappable#0"),
            Err(RegistryError::Malformed(_))
        ));
        assert!(matches!(
            registry.resolve_player("Tappable#0#crystal_ball"),
            Err(RegistryError::KindMismatch { .. })
        ));
    }

    #[test]
    fn contexts_are_sanitized() {
        let mut registry = EntityRegistry::new();
        let player = registry.register_player("a|b;c#d");
        assert_eq!(
            registry.identifier(player).as_deref(),
            Some("Player#0#a_b_c_d")
        );
    }

    #[test]
    fn registration_after_freeze_still_allocates() {
        let mut registry = EntityRegistry::new();
        registry.freeze();
        assert!(registry.is_frozen());
        assert_eq!(registry.register_player("late"), PlayerId(0));
    }
}
