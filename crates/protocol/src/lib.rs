//! Line-oriented wire envelope for replicated actions.
//!
//! ```text
//! <role>|<client id>|<action key>|<payload>$\n
//! ```
//!
//! The payload is split into parts by `;` and a part into values by `,`.
//! Entities travel as registry identifier strings and essences in their
//! `e:l:c:d:g:x` form, so a line can only be decoded against the registry of
//! the state it will be applied to. Decoding happens once, here; past this
//! boundary everything is a typed [`Message`].
//!
//! [`Message`]: arcana_core::Message

mod envelope;
mod error;
mod payload;

pub use envelope::{Body, Envelope, Notice, RawLine, Role};
pub use error::ProtocolError;

pub const MAIN_SEP: char = '|';
pub const PART_SEP: char = ';';
pub const VALUE_SEP: char = ',';
pub const END_SEP: char = '$';
/// Stands in for an absent optional value.
pub const NONE_MARK: &str = "-";
