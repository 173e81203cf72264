//! Protocol Messages
//!
//! Binary wire format for client-server communication over TCP.
//!
//! Every message travels in a frame: a big-endian `u16` payload length
//! followed by the payload. The first payload byte is the opcode; the rest
//! is the body, all integers and floats big-endian.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::game::events::{
    CardRecord, EntityRecord, GameEvent, PlayerStatus, ProjectileRecord, RosterEntry, UnitRecord,
    NAME_LEN,
};
use crate::game::player::{sanitize_name, DECK_SIZE};
use crate::game::state::Team;

/// Largest payload a frame can carry.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Wire size of one roster entry.
pub const ROSTER_ENTRY_LEN: usize = 2 + 1 + NAME_LEN;
/// Wire size of a unit snapshot record.
pub const UNIT_RECORD_LEN: usize = 34;
/// Wire size of a projectile snapshot record.
pub const PROJECTILE_RECORD_LEN: usize = 29;
/// Wire size of the player status body.
pub const PLAYER_STATUS_LEN: usize = 8 + DECK_SIZE + DECK_SIZE * 6;

/// Offset added to a projectile's team byte.
const PROJECTILE_TEAM_OFFSET: u8 = 3;

// =============================================================================
// OPCODES
// =============================================================================

/// Client -> server opcodes.
pub mod client_op {
    /// Set display name.
    pub const JOIN: u8 = 0;
    /// Change team.
    pub const CHANGE_TEAM: u8 = 1;
    /// Chat line or `/start`.
    pub const CHAT: u8 = 2;
    /// Play a card.
    pub const USE_CARD: u8 = 3;
    /// Replace the deck.
    pub const SET_DECK: u8 = 4;
    /// Answer a ping probe.
    pub const PING_RESPONSE: u8 = 5;
}

/// Server -> client opcodes.
pub mod server_op {
    /// Player list.
    pub const ROSTER: u8 = 0;
    /// Match started.
    pub const MATCH_STARTED: u8 = 1;
    /// Chat line.
    pub const CHAT: u8 = 2;
    /// Private status.
    pub const PLAYER_STATUS: u8 = 3;
    /// Entity snapshot.
    pub const SNAPSHOT: u8 = 4;
    /// Ping probe.
    pub const PING_PROBE: u8 = 5;
    /// Entity removed.
    pub const ENTITY_REMOVED: u8 = 6;
    /// Match ended.
    pub const MATCH_ENDED: u8 = 7;
    /// Spawn resolved.
    pub const SPAWN_RESOLVED: u8 = 8;
}

// =============================================================================
// ERRORS
// =============================================================================

/// Why a payload could not be decoded or framed.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Zero-length payload.
    #[error("empty payload")]
    Empty,

    /// Opcode outside the table.
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),

    /// Body shorter than the message needs.
    #[error("truncated {what}: needed {needed} bytes, had {available}")]
    Truncated {
        /// Field being read.
        what: &'static str,
        /// Bytes required.
        needed: usize,
        /// Bytes left.
        available: usize,
    },

    /// Deck body not a whole number of card ids.
    #[error("deck body of {0} bytes is not a multiple of 4")]
    DeckLength(usize),

    /// Team byte out of range.
    #[error("invalid team byte {0}")]
    InvalidTeam(u8),

    /// Payload too large for the length prefix.
    #[error("payload of {0} bytes exceeds the frame limit")]
    FrameTooLarge(usize),
}

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Set display name (trailing NULs stripped, at most 20 bytes).
    Join {
        /// Requested name.
        name: String,
    },
    /// Switch team; values above 2 are ignored by the match.
    ChangeTeam {
        /// Raw team byte.
        team: u8,
    },
    /// Chat line (trailing NULs stripped).
    Chat {
        /// Text.
        text: String,
    },
    /// Play the card in a hand slot.
    UseCard {
        /// Hand position.
        hand_slot: u8,
        /// Placement X.
        x: i16,
    },
    /// Replace the deck.
    SetDeck {
        /// Card ids in order.
        card_ids: Vec<u32>,
    },
    /// Answer to a ping probe.
    PingResponse,
}

impl ClientMessage {
    /// Opcode byte.
    pub fn opcode(&self) -> u8 {
        match self {
            ClientMessage::Join { .. } => client_op::JOIN,
            ClientMessage::ChangeTeam { .. } => client_op::CHANGE_TEAM,
            ClientMessage::Chat { .. } => client_op::CHAT,
            ClientMessage::UseCard { .. } => client_op::USE_CARD,
            ClientMessage::SetDeck { .. } => client_op::SET_DECK,
            ClientMessage::PingResponse => client_op::PING_RESPONSE,
        }
    }

    /// Decode a payload (opcode + body).
    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        let (&op, body) = payload.split_first().ok_or(ProtocolError::Empty)?;
        let mut r = Reader::new(body);

        let msg = match op {
            client_op::JOIN => ClientMessage::Join {
                name: sanitize_name(body),
            },
            client_op::CHANGE_TEAM => ClientMessage::ChangeTeam {
                team: r.u8("team")?,
            },
            client_op::CHAT => ClientMessage::Chat {
                text: String::from_utf8_lossy(trim_nul(body)).into_owned(),
            },
            client_op::USE_CARD => ClientMessage::UseCard {
                hand_slot: r.u8("hand slot")?,
                x: r.u16("x")? as i16,
            },
            client_op::SET_DECK => {
                if body.len() % 4 != 0 {
                    return Err(ProtocolError::DeckLength(body.len()));
                }
                let card_ids = body
                    .chunks_exact(4)
                    .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                    .collect();
                ClientMessage::SetDeck { card_ids }
            }
            client_op::PING_RESPONSE => ClientMessage::PingResponse,
            other => return Err(ProtocolError::UnknownOpcode(other)),
        };
        Ok(msg)
    }

    /// Encode to a payload (opcode + body).
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.opcode()];
        match self {
            ClientMessage::Join { name } => out.extend_from_slice(name.as_bytes()),
            ClientMessage::ChangeTeam { team } => out.push(*team),
            ClientMessage::Chat { text } => out.extend_from_slice(text.as_bytes()),
            ClientMessage::UseCard { hand_slot, x } => {
                out.push(*hand_slot);
                out.extend_from_slice(&x.to_be_bytes());
            }
            ClientMessage::SetDeck { card_ids } => {
                for id in card_ids {
                    out.extend_from_slice(&id.to_be_bytes());
                }
            }
            ClientMessage::PingResponse => {}
        }
        out
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Opcode of a server event.
pub fn event_opcode(event: &GameEvent) -> u8 {
    match event {
        GameEvent::Roster(_) => server_op::ROSTER,
        GameEvent::MatchStarted => server_op::MATCH_STARTED,
        GameEvent::Chat(_) => server_op::CHAT,
        GameEvent::PlayerStatus(_) => server_op::PLAYER_STATUS,
        GameEvent::Snapshot(_) => server_op::SNAPSHOT,
        GameEvent::PingProbe => server_op::PING_PROBE,
        GameEvent::EntityRemoved(_) => server_op::ENTITY_REMOVED,
        GameEvent::MatchEnded(_) => server_op::MATCH_ENDED,
        GameEvent::SpawnResolved { .. } => server_op::SPAWN_RESOLVED,
    }
}

/// Encode a server event to a payload.
pub fn encode_event(event: &GameEvent) -> Vec<u8> {
    let mut out = vec![event_opcode(event)];
    match event {
        GameEvent::Roster(entries) => {
            out.reserve(entries.len() * ROSTER_ENTRY_LEN);
            for entry in entries {
                out.extend_from_slice(&entry.id.to_be_bytes());
                out.push(entry.team.index());
                let mut name = [0u8; NAME_LEN];
                let bytes = entry.name.as_bytes();
                let n = bytes.len().min(NAME_LEN);
                name[..n].copy_from_slice(&bytes[..n]);
                out.extend_from_slice(&name);
            }
        }
        GameEvent::Chat(line) => out.extend_from_slice(line.as_bytes()),
        GameEvent::PlayerStatus(status) => {
            out.extend_from_slice(&status.id.to_be_bytes());
            out.extend_from_slice(&status.energy.to_be_bytes());
            out.extend_from_slice(&status.max_energy.to_be_bytes());
            out.extend_from_slice(&status.seconds_left.to_be_bytes());
            out.extend_from_slice(&status.order);
            for card in &status.deck {
                out.extend_from_slice(&card.id.to_be_bytes());
                out.extend_from_slice(&card.cost.to_be_bytes());
            }
        }
        GameEvent::Snapshot(records) => {
            for record in records {
                match record {
                    EntityRecord::Unit(u) => encode_unit(&mut out, u),
                    EntityRecord::Projectile(p) => encode_projectile(&mut out, p),
                }
            }
        }
        GameEvent::EntityRemoved(id) => out.extend_from_slice(&id.to_be_bytes()),
        GameEvent::MatchEnded(team) => out.push(team.index()),
        GameEvent::SpawnResolved { x, y } => {
            out.extend_from_slice(&x.to_be_bytes());
            out.extend_from_slice(&y.to_be_bytes());
        }
        GameEvent::MatchStarted | GameEvent::PingProbe => {}
    }
    out
}

fn encode_unit(out: &mut Vec<u8>, u: &UnitRecord) {
    out.extend_from_slice(&u.id.to_be_bytes());
    out.extend_from_slice(&u.type_id.to_be_bytes());
    out.push(u.team.index());
    out.extend_from_slice(&u.x.to_be_bytes());
    out.extend_from_slice(&u.y.to_be_bytes());
    out.extend_from_slice(&u.health.to_be_bytes());
    out.extend_from_slice(&u.max_health.to_be_bytes());
    out.extend_from_slice(&u.poison.to_be_bytes());
    out.push(u8::from(u.reversed));
}

fn encode_projectile(out: &mut Vec<u8>, p: &ProjectileRecord) {
    out.extend_from_slice(&p.id.to_be_bytes());
    out.extend_from_slice(&p.type_id.to_be_bytes());
    out.push(p.team.index() + PROJECTILE_TEAM_OFFSET);
    out.extend_from_slice(&p.x.to_be_bytes());
    out.extend_from_slice(&p.y.to_be_bytes());
    out.extend_from_slice(&p.angle.to_be_bytes());
}

/// Decode a server payload. Used by clients and tests.
pub fn decode_event(payload: &[u8]) -> Result<GameEvent, ProtocolError> {
    let (&op, body) = payload.split_first().ok_or(ProtocolError::Empty)?;
    let mut r = Reader::new(body);

    let event = match op {
        server_op::ROSTER => {
            let mut entries = Vec::new();
            while !r.is_empty() {
                let id = r.u16("roster id")?;
                let team = team(r.u8("roster team")?)?;
                let name = sanitize_name(r.bytes("roster name", NAME_LEN)?);
                entries.push(RosterEntry { id, team, name });
            }
            GameEvent::Roster(entries)
        }
        server_op::MATCH_STARTED => GameEvent::MatchStarted,
        server_op::CHAT => GameEvent::Chat(String::from_utf8_lossy(body).into_owned()),
        server_op::PLAYER_STATUS => {
            let id = r.u16("status id")?;
            let energy = r.u16("energy")?;
            let max_energy = r.u16("max energy")?;
            let seconds_left = r.u16("seconds left")?;
            let mut order = [0u8; DECK_SIZE];
            order.copy_from_slice(r.bytes("order", DECK_SIZE)?);
            let mut deck = [CardRecord::default(); DECK_SIZE];
            for card in &mut deck {
                card.id = r.u32("card id")?;
                card.cost = r.u16("card cost")?;
            }
            GameEvent::PlayerStatus(PlayerStatus {
                id,
                energy,
                max_energy,
                seconds_left,
                order,
                deck,
            })
        }
        server_op::SNAPSHOT => {
            let mut records = Vec::new();
            while !r.is_empty() {
                let team_byte = r.peek(4, "record team")?;
                let record = if team_byte < PROJECTILE_TEAM_OFFSET {
                    EntityRecord::Unit(UnitRecord {
                        id: r.u16("unit id")?,
                        type_id: r.u16("unit type")?,
                        team: team(r.u8("unit team")?)?,
                        x: r.f64("unit x")?,
                        y: r.f64("unit y")?,
                        health: r.u32("health")?,
                        max_health: r.u32("max health")?,
                        poison: r.u32("poison")?,
                        reversed: r.u8("status")? & 1 == 1,
                    })
                } else {
                    EntityRecord::Projectile(ProjectileRecord {
                        id: r.u16("projectile id")?,
                        type_id: r.u16("projectile type")?,
                        team: team(r.u8("projectile team")? - PROJECTILE_TEAM_OFFSET)?,
                        x: r.f64("projectile x")?,
                        y: r.f64("projectile y")?,
                        angle: r.f64("angle")?,
                    })
                };
                records.push(record);
            }
            GameEvent::Snapshot(records)
        }
        server_op::PING_PROBE => GameEvent::PingProbe,
        server_op::ENTITY_REMOVED => GameEvent::EntityRemoved(r.u16("entity id")?),
        server_op::MATCH_ENDED => GameEvent::MatchEnded(team(r.u8("winner")?)?),
        server_op::SPAWN_RESOLVED => GameEvent::SpawnResolved {
            x: r.f64("spawn x")?,
            y: r.f64("spawn y")?,
        },
        other => return Err(ProtocolError::UnknownOpcode(other)),
    };
    Ok(event)
}

fn team(byte: u8) -> Result<Team, ProtocolError> {
    Team::from_index(byte).ok_or(ProtocolError::InvalidTeam(byte))
}

fn trim_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Big-endian cursor over a message body.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn bytes(&mut self, what: &'static str, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.buf.len() < n {
            return Err(ProtocolError::Truncated {
                what,
                needed: n,
                available: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn peek(&self, offset: usize, what: &'static str) -> Result<u8, ProtocolError> {
        self.buf.get(offset).copied().ok_or(ProtocolError::Truncated {
            what,
            needed: offset + 1,
            available: self.buf.len(),
        })
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, ProtocolError> {
        Ok(self.bytes(what, 1)?[0])
    }

    fn u16(&mut self, what: &'static str) -> Result<u16, ProtocolError> {
        let b = self.bytes(what, 2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, ProtocolError> {
        let b = self.bytes(what, 4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f64(&mut self, what: &'static str) -> Result<f64, ProtocolError> {
        let b = self.bytes(what, 8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(f64::from_be_bytes(raw))
    }
}

// =============================================================================
// FRAMING
// =============================================================================

/// Prefix a payload with its length.
pub fn frame(payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let len = u16::try_from(payload.len()).map_err(|_| ProtocolError::FrameTooLarge(payload.len()))?;
    let mut out = Vec::with_capacity(2 + payload.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Read one frame and return its payload.
pub async fn read_frame<R>(reader: &mut R) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u16().await?;
    let mut payload = vec![0u8; usize::from(len)];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Write one framed payload.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let framed = frame(payload).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    writer.write_all(&framed).await
}
