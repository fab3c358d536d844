use core::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub u32);

        impl $name {
            /// Arena slot of this entity.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Seat of a player; also the player's slot in the player arena.
    PlayerId,
    "P"
);

entity_id!(
    /// Index of a card-like board object in the tappable arena.
    TappableId,
    "T"
);

entity_id!(
    /// Index of an ability in the ability arena.
    AbilityId,
    "A"
);

/// The kinds of entity that receive registry identities.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    Player,
    Tappable,
    Ability,
}

impl EntityKind {
    pub const COUNT: usize = 3;

    pub(super) const fn slot(self) -> usize {
        match self {
            EntityKind::Player => 0,
            EntityKind::Tappable => 1,
            EntityKind::Ability => 2,
        }
    }
}

/// A typed reference to any registered entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityRef {
    Player(PlayerId),
    Tappable(TappableId),
    Ability(AbilityId),
}

impl EntityRef {
    pub const fn kind(self) -> EntityKind {
        match self {
            EntityRef::Player(_) => EntityKind::Player,
            EntityRef::Tappable(_) => EntityKind::Tappable,
            EntityRef::Ability(_) => EntityKind::Ability,
        }
    }

    pub const fn index(self) -> u32 {
        match self {
            EntityRef::Player(id) => id.0,
            EntityRef::Tappable(id) => id.0,
            EntityRef::Ability(id) => id.0,
        }
    }

    pub(super) const fn from_parts(kind: EntityKind, index: u32) -> Self {
        match kind {
            EntityKind::Player => EntityRef::Player(PlayerId(index)),
            EntityKind::Tappable => EntityRef::Tappable(TappableId(index)),
            EntityKind::Ability => EntityRef::Ability(AbilityId(index)),
        }
    }
}

impl From<PlayerId> for EntityRef {
    fn from(id: PlayerId) -> Self {
        EntityRef::Player(id)
    }
}

impl From<TappableId> for EntityRef {
    fn from(id: TappableId) -> Self {
        EntityRef::Tappable(id)
    }
}

impl From<AbilityId> for EntityRef {
    fn from(id: AbilityId) -> Self {
        EntityRef::Ability(id)
    }
}
