//! Prompt-to-player pairing.
//!
//! Given a roster of P players and a per-player quota K, produces
//! ceil(P*K/2) author pairs such that every player authors at least K
//! prompts, at most one player authors K+1 (only when P*K is odd), and no
//! prompt pairs a player with themselves.

use rand::seq::SliceRandom;

use crate::protocol::PlayerId;

/// Assign authors to prompt slots, greedily pairing the players with the
/// most remaining need and breaking ties at random.
pub fn assign_pairs(players: &[PlayerId], prompts_per_player: usize) -> Vec<(PlayerId, PlayerId)> {
    if players.len() < 2 || prompts_per_player == 0 {
        return Vec::new();
    }

    let slot_count = (players.len() * prompts_per_player).div_ceil(2);
    let mut need: Vec<(PlayerId, usize)> =
        players.iter().map(|&p| (p, prompts_per_player)).collect();
    let mut rng = rand::rng();
    let mut pairs = Vec::with_capacity(slot_count);

    for _ in 0..slot_count {
        let max_need = need.iter().map(|&(_, n)| n).max().unwrap_or(0);
        let mut top: Vec<PlayerId> = need
            .iter()
            .filter(|&&(_, n)| n == max_need)
            .map(|&(p, _)| p)
            .collect();
        top.shuffle(&mut rng);

        let player1 = top[0];
        let player2 = if top.len() >= 2 {
            top[1]
        } else {
            // Only one player left at the top tier: pair them with whoever
            // has the most need among the rest. That partner may already be
            // satisfied and simply accepts a bonus assignment.
            let next_need = need
                .iter()
                .filter(|&&(p, _)| p != player1)
                .map(|&(_, n)| n)
                .max()
                .unwrap_or(0);
            let mut tier: Vec<PlayerId> = need
                .iter()
                .filter(|&&(p, n)| p != player1 && n == next_need)
                .map(|&(p, _)| p)
                .collect();
            tier.shuffle(&mut rng);
            tier[0]
        };

        decrement(&mut need, player1);
        decrement(&mut need, player2);
        pairs.push((player1, player2));
    }

    let residual: usize = need.iter().map(|&(_, n)| n).sum();
    if residual > 0 {
        tracing::warn!(
            residual,
            players = players.len(),
            prompts_per_player,
            "Pairing left unmet assignment need"
        );
    }

    pairs
}

fn decrement(need: &mut [(PlayerId, usize)], player: PlayerId) {
    if let Some(entry) = need.iter_mut().find(|(p, _)| *p == player) {
        entry.1 = entry.1.saturating_sub(1);
    }
}
