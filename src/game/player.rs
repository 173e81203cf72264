//! Player State
//!
//! Per-player economy: energy pool, deck with its cost ledger, play order
//! and latency samples. Connection handling lives in `network`.

use std::array;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::game::card::{self, Card};
use crate::game::events::{PlayerStatus, RosterEntry, NAME_LEN};
use crate::game::state::{PlayerKey, Team};

/// Deck size.
pub const DECK_SIZE: usize = 8;

/// Playable slots at the front of the order.
pub const HAND_SIZE: usize = 4;

/// Order slot holding the next card to enter the hand.
const NEXT_SLOT: usize = HAND_SIZE;

/// Unanswered probes kept per player; older ones are forgotten.
pub const MAX_PENDING_PINGS: usize = 8;

/// One seated player.
#[derive(Debug, Clone)]
pub struct PlayerState {
    /// Connection key.
    pub key: PlayerKey,
    /// Wire id.
    pub id: u16,
    /// Display name; set once.
    pub name: Option<String>,
    /// Team.
    pub team: Team,
    /// Current energy.
    pub energy: u16,
    /// Energy cap.
    pub max_energy: u16,
    /// Ticks until the next regen step.
    pub energy_timer: u16,
    /// Deck slots.
    pub deck: [Card; DECK_SIZE],
    /// Permutation of deck slots; the first four are the hand.
    pub order: [u8; DECK_SIZE],
    /// Send times of unanswered ping probes, oldest first.
    pub pending_pings: VecDeque<Instant>,
    /// Last measured round trip.
    pub rtt: Duration,
}

impl PlayerState {
    /// Create a nameless player on team 0 with an empty deck.
    pub fn new(key: PlayerKey, id: u16) -> Self {
        Self {
            key,
            id,
            name: None,
            team: Team::Defender,
            energy: 0,
            max_energy: 0,
            energy_timer: 0,
            deck: array::from_fn(|_| Card::empty()),
            order: identity_order(),
            pending_pings: VecDeque::new(),
            rtt: Duration::ZERO,
        }
    }

    /// Name for chat and logs.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Reset the economy for a new match.
    pub fn reset_for_match(&mut self, energy: u16, max_energy: u16, regen: u16) {
        self.order = identity_order();
        self.max_energy = max_energy;
        self.energy = energy.min(max_energy);
        self.energy_timer = regen;
    }

    /// Add energy up to the cap.
    pub fn gain_energy(&mut self, amount: u16) -> u16 {
        self.energy = self.energy.saturating_add(amount).min(self.max_energy);
        self.energy
    }

    /// Count down the regen timer by `speed`; grant one energy when it runs
    /// out. Nothing happens while the pool is full.
    pub fn regenerate(&mut self, speed: u16, period: u16) {
        if self.energy >= self.max_energy {
            return;
        }
        self.energy_timer = self.energy_timer.saturating_sub(speed);
        if self.energy_timer == 0 {
            self.gain_energy(1);
            self.energy_timer = period;
        }
    }

    /// Raise the cap.
    pub fn raise_max_energy(&mut self, amount: u16) {
        self.max_energy = self.max_energy.saturating_add(amount);
    }

    /// Lower the cap, clamping energy to it.
    pub fn lower_max_energy(&mut self, amount: u16) {
        self.max_energy = self.max_energy.saturating_sub(amount);
        self.energy = self.energy.min(self.max_energy);
    }

    /// Discount every deck slot.
    pub fn apply_discount(&mut self, amount: u16) {
        for card in &mut self.deck {
            card.sub_cost(amount);
        }
    }

    /// Undo a discount on every deck slot.
    pub fn revert_discount(&mut self, amount: u16) {
        for card in &mut self.deck {
            card.add_cost(amount);
        }
    }

    /// Replace the deck from catalog ids. Zero ids are skipped, at most
    /// eight are kept, unknown ids become the empty card and unfilled slots
    /// stay empty.
    pub fn set_deck(&mut self, ids: &[u32]) {
        let mut chosen = ids.iter().copied().filter(|&id| id != 0).take(DECK_SIZE);
        self.deck = array::from_fn(|_| chosen.next().map(card::lookup).unwrap_or_default());
    }

    /// Deck slot behind hand position `hand_slot`.
    pub fn hand_card(&self, hand_slot: usize) -> Option<&Card> {
        if hand_slot >= HAND_SIZE {
            return None;
        }
        self.deck.get(usize::from(self.order[hand_slot]))
    }

    /// Cycle the play order after the card in `hand_slot` was used.
    ///
    /// The next card takes the used position, the queue behind it shifts
    /// forward and the used deck slot goes to the back, until a non-empty
    /// card sits in the next slot or every queued card has been tried.
    pub fn rotate_order(&mut self, hand_slot: usize) {
        if hand_slot >= HAND_SIZE {
            return;
        }
        let used = self.order[hand_slot];
        if self.deck[usize::from(self.order[NEXT_SLOT])].is_empty() {
            return;
        }

        self.order[hand_slot] = self.order[NEXT_SLOT];
        let mut back = used;
        for _ in 0..DECK_SIZE - HAND_SIZE {
            self.order.copy_within(NEXT_SLOT + 1.., NEXT_SLOT);
            self.order[DECK_SIZE - 1] = back;
            back = self.order[NEXT_SLOT];
            if !self.deck[usize::from(back)].is_empty() {
                break;
            }
        }
    }

    /// Spawn delay for this player's cards, shortened by their latency.
    pub fn spawn_delay(&self, base: u8) -> u8 {
        let lag_ticks = self.rtt.as_millis() * 60 / 1000;
        let lag_ticks = u8::try_from(lag_ticks).unwrap_or(u8::MAX);
        base.saturating_sub(lag_ticks)
    }

    /// Record a probe sent at `now`.
    pub fn record_probe(&mut self, now: Instant) {
        if self.pending_pings.len() == MAX_PENDING_PINGS {
            self.pending_pings.pop_front();
        }
        self.pending_pings.push_back(now);
    }

    /// Match a probe answer to the oldest outstanding probe.
    pub fn answer_probe(&mut self, now: Instant) -> Option<Duration> {
        let sent = self.pending_pings.pop_front()?;
        self.rtt = now.saturating_duration_since(sent);
        Some(self.rtt)
    }

    /// Roster line.
    pub fn roster_entry(&self) -> RosterEntry {
        RosterEntry {
            id: self.id,
            team: self.team,
            name: self.display_name().to_owned(),
        }
    }

    /// Private status line.
    pub fn status(&self, seconds_left: u16) -> PlayerStatus {
        PlayerStatus {
            id: self.id,
            energy: self.energy,
            max_energy: self.max_energy,
            seconds_left,
            order: self.order,
            deck: array::from_fn(|i| self.deck[i].record()),
        }
    }
}

fn identity_order() -> [u8; DECK_SIZE] {
    array::from_fn(|i| i as u8)
}

/// Trim trailing NULs and cap a name to the wire field, on a char boundary.
pub fn sanitize_name(raw: &[u8]) -> String {
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let mut name = String::from_utf8_lossy(&raw[..end]).into_owned();
    while name.len() > NAME_LEN {
        name.pop();
    }
    name
}
