use core::fmt;

use arcana_core::registry::EntityRegistry;
use arcana_core::{ActionKey, Message};

use crate::payload;
use crate::{END_SEP, MAIN_SEP, ProtocolError};

/// Who produced a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// A game client; the relay fans these out unchanged but for the id.
    Client,
    /// The relay itself.
    Server,
}

impl Role {
    pub const fn marker(self) -> char {
        match self {
            Role::Client => 'C',
            Role::Server => 'S',
        }
    }

    fn parse(raw: &str) -> Result<Self, ProtocolError> {
        match raw {
            "C" => Ok(Role::Client),
            "S" => Ok(Role::Server),
            other => Err(ProtocolError::BadRole(other.to_string())),
        }
    }
}

/// Session notices sent by the relay.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Notice {
    /// Tells a fresh connection its client id.
    Welcome,
    /// The named client's connection closed.
    Left,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    Action(Message),
    Notice(Notice),
}

/// A decoded line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Connection the line came from, as stamped by the relay.
    pub client_id: u32,
    pub body: Body,
}

impl Envelope {
    pub fn action(client_id: u32, message: impl Into<Message>) -> Self {
        Self {
            client_id,
            body: Body::Action(message.into()),
        }
    }

    pub fn notice(client_id: u32, notice: Notice) -> Self {
        Self {
            client_id,
            body: Body::Notice(notice),
        }
    }

    pub fn role(&self) -> Role {
        match self.body {
            Body::Action(_) => Role::Client,
            Body::Notice(_) => Role::Server,
        }
    }

    /// Formats the envelope as one line, without the trailing newline.
    pub fn encode(&self, registry: &EntityRegistry) -> Result<String, ProtocolError> {
        let (key, payload) = match &self.body {
            Body::Action(message) => (
                message.key().as_ref().to_string(),
                payload::encode(message, registry)?,
            ),
            Body::Notice(notice) => (notice.as_ref().to_string(), String::new()),
        };
        Ok(RawLine {
            role: self.role(),
            client_id: self.client_id,
            key: &key,
            payload: &payload,
        }
        .to_string())
    }

    /// Parses one line. Identifiers are resolved against `registry`.
    pub fn decode(line: &str, registry: &EntityRegistry) -> Result<Self, ProtocolError> {
        let raw = RawLine::parse(line)?;
        let body = match raw.role {
            Role::Server => Body::Notice(
                raw.key
                    .parse()
                    .map_err(|_| ProtocolError::UnknownNotice(raw.key.to_string()))?,
            ),
            Role::Client => {
                let key: ActionKey = raw
                    .key
                    .parse()
                    .map_err(|_| ProtocolError::UnknownKey(raw.key.to_string()))?;
                Body::Action(payload::decode(key, raw.client_id, raw.payload, registry)?)
            }
        };
        Ok(Self {
            client_id: raw.client_id,
            body,
        })
    }
}

/// Header view of a line with the payload left opaque.
///
/// This is all the relay ever looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawLine<'a> {
    pub role: Role,
    pub client_id: u32,
    pub key: &'a str,
    pub payload: &'a str,
}

impl<'a> RawLine<'a> {
    pub fn parse(line: &'a str) -> Result<Self, ProtocolError> {
        let body = line
            .trim_end_matches(['\r', '\n'])
            .strip_suffix(END_SEP)
            .ok_or(ProtocolError::MissingEnd)?;
        let fields: Vec<&str> = body.splitn(4, MAIN_SEP).collect();
        let [role, client_id, key, payload] = fields[..] else {
            return Err(ProtocolError::Header(fields.len()));
        };
        Ok(Self {
            role: Role::parse(role)?,
            client_id: client_id
                .parse()
                .map_err(|_| ProtocolError::BadClientId(client_id.to_string()))?,
            key,
            payload,
        })
    }

    /// Same line attributed to another connection.
    pub fn with_client(self, client_id: u32) -> Self {
        Self { client_id, ..self }
    }
}

impl fmt::Display for RawLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{MAIN_SEP}{}{MAIN_SEP}{}{MAIN_SEP}{}{END_SEP}",
            self.role.marker(),
            self.client_id,
            self.key,
            self.payload
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_line_splits_the_header_only() {
        let raw = RawLine::parse("C|3|set_name|Player#0#seat0;ana$\n").unwrap();
        assert_eq!(raw.role, Role::Client);
        assert_eq!(raw.client_id, 3);
        assert_eq!(raw.key, "set_name");
        assert_eq!(raw.payload, "Player#0#seat0;ana");
        assert_eq!(
            raw.with_client(9).to_string(),
            "C|9|set_name|Player#0#seat0;ana$"
        );
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert_eq!(
            RawLine::parse("C|3|game_start|"),
            Err(ProtocolError::MissingEnd)
        );
        assert_eq!(RawLine::parse("C|3$"), Err(ProtocolError::Header(2)));
        assert_eq!(
            RawLine::parse("X|3|game_start|$"),
            Err(ProtocolError::BadRole("X".into()))
        );
        assert_eq!(
            RawLine::parse("C|three|game_start|$"),
            Err(ProtocolError::BadClientId("three".into()))
        );
    }

    #[test]
    fn notices_need_no_registry() {
        let registry = EntityRegistry::new();
        let line = Envelope::notice(4, Notice::Welcome)
            .encode(&registry)
            .unwrap();
        assert_eq!(line, "S|4|welcome|$");
        assert_eq!(
            Envelope::decode(&line, &registry).unwrap(),
            Envelope::notice(4, Notice::Welcome)
        );
        assert!(matches!(
            Envelope::decode("S|4|hello|$", &registry),
            Err(ProtocolError::UnknownNotice(_))
        ));
    }

    #[test]
    fn unknown_action_keys_are_rejected() {
        let registry = EntityRegistry::new();
        assert_eq!(
            Envelope::decode("C|1|teleport|$", &registry),
            Err(ProtocolError::UnknownKey("teleport".into()))
        );
    }
}
