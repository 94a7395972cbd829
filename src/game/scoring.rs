//! Scoring kernel.
//!
//! Pure functions over recorded answers and votes. Matchup scoring depends
//! only on the two answers and the two vote counters; player identity is
//! used solely by callers to route the resulting totals.

use std::collections::HashMap;

use crate::config::GameRules;
use crate::protocol::validation::is_sentinel_answer;
use crate::protocol::PlayerId;

use super::room::FinaleAnswer;

/// Outcome of a single matchup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchupOutcome {
    pub points1: u32,
    pub points2: u32,
    pub is_jinx: bool,
    /// 1 or 2 when that side took every vote cast
    pub quipwit: Option<u8>,
}

/// Score one matchup from its two answers and vote counters.
///
/// A Jinx (both authors independently wrote the same thing) zeroes the
/// matchup for both sides; sentinel answers are exempt so two silent players
/// do not "jinx". A unanimous vote with at least one ballot cast earns the
/// winning side the QuipWit bonus on top of per-vote points.
pub fn matchup_points(
    answer1: &str,
    answer2: &str,
    votes1: u32,
    votes2: u32,
    rules: &GameRules,
) -> MatchupOutcome {
    let canonical1 = answer1.trim().to_lowercase();
    let canonical2 = answer2.trim().to_lowercase();

    if canonical1 == canonical2 && !is_sentinel_answer(&canonical1) {
        return MatchupOutcome {
            points1: 0,
            points2: 0,
            is_jinx: true,
            quipwit: None,
        };
    }

    let mut points1 = votes1 * rules.points_per_vote;
    let mut points2 = votes2 * rules.points_per_vote;

    // No unanimity bonus for winning with a blank
    let total = votes1 + votes2;
    let quipwit = if total > 0 && votes2 == 0 && !is_sentinel_answer(&canonical1) {
        points1 += rules.quipwit_bonus;
        Some(1)
    } else if total > 0 && votes1 == 0 && !is_sentinel_answer(&canonical2) {
        points2 += rules.quipwit_bonus;
        Some(2)
    } else {
        None
    };

    MatchupOutcome {
        points1,
        points2,
        is_jinx: false,
        quipwit,
    }
}

/// Score the finale in place: per-vote points for everyone, plus the
/// first-place bonus for all answers tied at the top (when anyone voted).
/// Returns each author's earnings for the caller to fold into room totals.
pub fn score_finale(
    answers: &mut [FinaleAnswer],
    votes: &HashMap<PlayerId, PlayerId>,
    rules: &GameRules,
) -> HashMap<PlayerId, u32> {
    let mut tally: HashMap<PlayerId, u32> = HashMap::new();
    for target in votes.values() {
        *tally.entry(*target).or_insert(0) += 1;
    }

    for answer in answers.iter_mut() {
        answer.votes = tally.get(&answer.player).copied().unwrap_or(0);
        answer.points = answer.votes * rules.points_per_vote;
    }

    let max_votes = answers.iter().map(|a| a.votes).max().unwrap_or(0);
    if max_votes > 0 {
        for answer in answers.iter_mut() {
            if answer.votes == max_votes {
                answer.points += rules.last_lash_first_bonus;
                answer.is_winner = true;
            }
        }
    }

    answers.iter().map(|a| (a.player, a.points)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::NO_ANSWER;
    use uuid::Uuid;

    fn rules() -> GameRules {
        GameRules::default()
    }

    fn finale_answer(player: PlayerId, answer: &str) -> FinaleAnswer {
        FinaleAnswer {
            player,
            answer: answer.to_string(),
            warning: None,
            votes: 0,
            points: 0,
            is_winner: false,
        }
    }

    #[test]
    fn test_unanimous_vote_is_a_quipwit() {
        // two voters both choose answer 1
        let outcome = matchup_points("a", "b", 2, 0, &rules());
        assert_eq!(outcome.points1, 300);
        assert_eq!(outcome.points2, 0);
        assert!(!outcome.is_jinx);
        assert_eq!(outcome.quipwit, Some(1));
    }

    #[test]
    fn test_split_vote_has_no_bonus() {
        let outcome = matchup_points("a", "b", 2, 1, &rules());
        assert_eq!(outcome.points1, 200);
        assert_eq!(outcome.points2, 100);
        assert_eq!(outcome.quipwit, None);
    }

    #[test]
    fn test_no_votes_no_quipwit() {
        let outcome = matchup_points("a", "b", 0, 0, &rules());
        assert_eq!((outcome.points1, outcome.points2), (0, 0));
        assert_eq!(outcome.quipwit, None);
    }

    #[test]
    fn test_jinx_is_case_and_whitespace_insensitive() {
        let outcome = matchup_points("Hello World", "  hello world ", 3, 1, &rules());
        assert!(outcome.is_jinx);
        assert_eq!((outcome.points1, outcome.points2), (0, 0));
        assert_eq!(outcome.quipwit, None);
    }

    #[test]
    fn test_matching_sentinels_are_not_a_jinx() {
        let outcome = matchup_points(NO_ANSWER, NO_ANSWER, 2, 0, &rules());
        assert!(!outcome.is_jinx);
        // votes pay out, but a blank never takes the unanimity bonus
        assert_eq!(outcome.points1, 200);
        assert_eq!(outcome.points2, 0);
        assert_eq!(outcome.quipwit, None);
    }

    #[test]
    fn test_sentinel_side_never_takes_the_bonus() {
        let outcome = matchup_points("a real answer", NO_ANSWER, 0, 3, &rules());
        assert_eq!(outcome.quipwit, None);
        assert_eq!(outcome.points2, 300);
        let outcome = matchup_points("a real answer", NO_ANSWER, 3, 0, &rules());
        assert_eq!(outcome.quipwit, Some(1));
        assert_eq!(outcome.points1, 400);
    }

    #[test]
    fn test_unanimous_finale() {
        // four players; three voters all pick the first answer
        let players: Vec<PlayerId> = (0..4).map(|_| Uuid::new_v4()).collect();
        let mut answers: Vec<FinaleAnswer> = players
            .iter()
            .map(|&p| finale_answer(p, "entry"))
            .collect();
        let votes: HashMap<PlayerId, PlayerId> = players[1..]
            .iter()
            .map(|&voter| (voter, players[0]))
            .collect();

        let earned = score_finale(&mut answers, &votes, &rules());
        assert_eq!(earned[&players[0]], 600);
        assert_eq!(earned[&players[1]], 0);
        assert!(answers[0].is_winner);
        assert!(!answers[1].is_winner);
        assert_eq!(answers[0].votes, 3);
    }

    #[test]
    fn test_finale_top_tie_shares_the_bonus() {
        let players: Vec<PlayerId> = (0..4).map(|_| Uuid::new_v4()).collect();
        let mut answers: Vec<FinaleAnswer> = players
            .iter()
            .map(|&p| finale_answer(p, "entry"))
            .collect();
        let mut votes = HashMap::new();
        votes.insert(players[2], players[0]);
        votes.insert(players[3], players[1]);

        let earned = score_finale(&mut answers, &votes, &rules());
        assert_eq!(earned[&players[0]], 400);
        assert_eq!(earned[&players[1]], 400);
        assert_eq!(earned[&players[2]], 0);
        assert!(answers[0].is_winner && answers[1].is_winner);
    }

    #[test]
    fn test_finale_with_no_votes_awards_nothing() {
        let players: Vec<PlayerId> = (0..3).map(|_| Uuid::new_v4()).collect();
        let mut answers: Vec<FinaleAnswer> = players
            .iter()
            .map(|&p| finale_answer(p, "entry"))
            .collect();
        let earned = score_finale(&mut answers, &HashMap::new(), &rules());
        assert!(earned.values().all(|&p| p == 0));
        assert!(answers.iter().all(|a| !a.is_winner));
    }
}
