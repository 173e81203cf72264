//! Player Commands
//!
//! What a player can ask of the match. Every command validates against the
//! current status and silently does nothing when it does not apply.

use std::time::Instant;

use tracing::{debug, info};

use crate::game::events::GameEvent;
use crate::game::player::HAND_SIZE;
use crate::game::state::{MatchState, MatchStatus, PlayerKey, Team};
use crate::game::tick::start_match;

/// Chat line that starts the match.
pub const START_COMMAND: &str = "/start";

impl MatchState {
    /// Set the player's display name. Room only; a name cannot change once
    /// set.
    pub fn join(&mut self, key: PlayerKey, name: &str) -> bool {
        if self.status != MatchStatus::Room {
            return false;
        }
        let Some(player) = self.player_mut(key) else {
            return false;
        };
        if player.name.is_some() {
            return false;
        }
        player.name = Some(name.to_owned());
        info!(session = %hex::encode(&self.id[..4]), player = name, "Player named");
        true
    }

    /// Switch team. Room only; indices above 2 are ignored.
    pub fn change_team(&mut self, key: PlayerKey, team: u8) -> bool {
        if self.status != MatchStatus::Room {
            return false;
        }
        let Some(team) = Team::from_index(team) else {
            return false;
        };
        match self.player_mut(key) {
            Some(player) => {
                player.team = team;
                true
            }
            None => false,
        }
    }

    /// Room chat. `/start` starts the match instead of being broadcast.
    pub fn chat(&mut self, key: PlayerKey, text: &str) -> bool {
        if self.status != MatchStatus::Room {
            return false;
        }
        let Some(player) = self.player(key) else {
            return false;
        };

        if text == START_COMMAND {
            return start_match(self);
        }

        let line = format!("{}: {}", player.display_name(), text);
        self.broadcast(GameEvent::Chat(line));
        true
    }

    /// Play the card in `hand_slot` at `x`. Active only.
    pub fn use_card(&mut self, key: PlayerKey, hand_slot: u8, x: i16) -> bool {
        if self.status != MatchStatus::Active {
            return false;
        }
        let hand_slot = usize::from(hand_slot);
        if hand_slot >= HAND_SIZE {
            return false;
        }
        let Some(slot) = self.slot_of(key) else {
            return false;
        };

        let player = &self.players[slot];
        let delay = player.spawn_delay(self.config.base_spawn_delay);
        let Some(card) = player.hand_card(hand_slot) else {
            return false;
        };

        let mut queued = Vec::new();
        if !card.use_card(key, player.team, player.energy, x, delay, &mut queued) {
            debug!(
                player = player.display_name(),
                card = card.id,
                energy = player.energy,
                x,
                "Card rejected"
            );
            return false;
        }
        let (card_id, cost) = (card.id, card.cost);

        let player = &mut self.players[slot];
        player.energy -= cost;
        player.rotate_order(hand_slot);
        let entry = format!("{} used {}", player.display_name(), card_id);
        debug!(player = player.display_name(), card = card_id, x, delay, "Card used");

        self.spawner.extend(queued);
        self.log_event(entry);
        true
    }

    /// Replace the player's deck. Room only.
    pub fn set_deck(&mut self, key: PlayerKey, card_ids: &[u32]) -> bool {
        if self.status != MatchStatus::Room {
            return false;
        }
        match self.player_mut(key) {
            Some(player) => {
                player.set_deck(card_ids);
                debug!(
                    player = player.display_name(),
                    deck = ?player.deck.iter().map(|c| c.id).collect::<Vec<_>>(),
                    "Deck set"
                );
                true
            }
            None => false,
        }
    }

    /// Answer the oldest outstanding ping probe. Any status; an answer with
    /// no probe outstanding is ignored.
    pub fn answer_ping(&mut self, key: PlayerKey, now: Instant) -> bool {
        self.player_mut(key)
            .and_then(|player| player.answer_probe(now))
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::tick::MatchConfig;

    fn room() -> MatchState {
        let mut state = MatchState::new([1; 16], MatchConfig::default());
        state.add_player(1);
        state.add_player(2);
        state
    }

    #[test]
    fn test_name_is_immutable() {
        let mut state = room();
        assert!(state.join(1, "alice"));
        assert!(!state.join(1, "mallory"));
        assert_eq!(state.players[0].display_name(), "alice");
    }

    #[test]
    fn test_change_team_rejects_bad_index() {
        let mut state = room();
        assert!(state.change_team(1, 2));
        assert_eq!(state.players[0].team, Team::Poison);
        assert!(!state.change_team(1, 3));
        assert_eq!(state.players[0].team, Team::Poison);
    }

    #[test]
    fn test_chat_is_prefixed() {
        let mut state = room();
        state.join(1, "bob");
        assert!(state.chat(1, "hello"));
        let out = state.take_outbox();
        assert_eq!(out[0].event, GameEvent::Chat("bob: hello".into()));
    }

    #[test]
    fn test_start_command_starts_match() {
        let mut state = room();
        assert!(state.chat(2, START_COMMAND));
        assert_eq!(state.status, MatchStatus::Active);

        // Room-only commands are now ignored.
        assert!(!state.chat(1, START_COMMAND));
        assert!(!state.change_team(1, 1));
        assert!(!state.set_deck(1, &[1, 2, 3, 4]));
        assert!(!state.join(1, "late"));
    }

    #[test]
    fn test_use_card_spends_energy_once() {
        let mut state = room();
        state.set_deck(1, &[1, 1, 1, 1, 1, 1, 1, 1]);
        state.chat(1, START_COMMAND);
        assert_eq!(state.players[0].energy, 5);

        assert!(state.use_card(1, 0, 0));
        assert_eq!(state.players[0].energy, 0);
        assert_eq!(state.spawner.len(), 1);
        assert_eq!(state.spawner[0].delay, 80);

        assert!(!state.use_card(1, 0, 0));
        assert_eq!(state.spawner.len(), 1);
    }

    #[test]
    fn test_use_card_needs_active_match() {
        let mut state = room();
        state.set_deck(1, &[1]);
        assert!(!state.use_card(1, 0, 0));
    }

    #[test]
    fn test_use_card_rejects_bad_slot_and_empty_card() {
        let mut state = room();
        state.set_deck(1, &[1]);
        state.chat(1, START_COMMAND);
        assert!(!state.use_card(1, 4, 0));
        assert!(!state.use_card(1, 1, 0));
        assert!(!state.use_card(99, 0, 0));
    }

    #[test]
    fn test_ping_without_probe_is_ignored() {
        let mut state = room();
        let now = Instant::now();
        assert!(!state.answer_ping(1, now));
        state.players[0].record_probe(now);
        assert!(state.answer_ping(1, now));
    }
}
