//! Static card content and its loaders.
//!
//! Card lists are data: every client must load byte-identical lists in the
//! same order, because the card factories assign registry identities by
//! walking them. The default catalog ships inside the crate so two clients
//! built from the same revision always agree.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{CatalogLoader, ConfigLoader, ContentFactory, LoadError, LoadResult};

/// RON source of the built-in card catalog.
pub const BUILTIN_CARDS: &str = include_str!("../data/cards.ron");

/// TOML source of the built-in rule parameters.
pub const BUILTIN_CONFIG: &str = include_str!("../data/config.toml");
