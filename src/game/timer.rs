//! Per-room countdown state.
//!
//! Each room carries at most one armed timer. The scheduling task itself is
//! spawned by the server layer; this module owns the timer's identity
//! (generation), its deadline, and the state-keyed dispatch table used to
//! reconstruct the pending expiry action after a pause.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::protocol::GameState;

use super::room::Room;

/// What happens when the countdown reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// Regular-round answer window closes; unanswered sides get sentinels
    AnswerWindow,
    /// Beat between the voting-phase card and presenting the first matchup
    MatchupIntro,
    /// Vote window for the current matchup closes
    VoteWindow,
    /// Matchup result leaves the screen; advance to the next matchup
    MatchupResultHold,
    /// Round scoreboard leaves the screen; next round or finale
    RoundScoresHold,
    /// Finale answer window closes
    FinaleAnswerWindow,
    /// Finale vote window closes
    FinaleVoteWindow,
    /// Finale results leave the screen; game over
    FinaleResultsHold,
}

impl TimerTask {
    /// Whether this countdown emits 1 s `TIMER_UPDATE` ticks. Presentation
    /// holds run silently.
    pub fn ticks(self) -> bool {
        matches!(
            self,
            Self::AnswerWindow | Self::VoteWindow | Self::FinaleAnswerWindow | Self::FinaleVoteWindow
        )
    }

    /// Dispatch table from a paused room back to the pending expiry action.
    ///
    /// Resumption deliberately reconstructs the action from room state
    /// instead of capturing a closure at pause time, so the behavior is
    /// deterministic and testable.
    pub fn resume_for(room: &Room) -> Option<Self> {
        match room.state {
            GameState::Lobby | GameState::GameOver => None,
            GameState::Prompt => Some(Self::AnswerWindow),
            GameState::Voting => {
                let prompt = room.prompts.get(room.current_matchup)?;
                if prompt.resolved {
                    Some(Self::MatchupResultHold)
                } else if prompt.presented {
                    Some(Self::VoteWindow)
                } else {
                    Some(Self::MatchupIntro)
                }
            }
            GameState::Scoring => Some(Self::RoundScoresHold),
            GameState::LastLash => {
                let lash = room.last_lash.as_ref()?;
                lash.released.then_some(Self::FinaleAnswerWindow)
            }
            GameState::LastLashVoting => {
                let lash = room.last_lash.as_ref()?;
                if lash.resolved {
                    Some(Self::FinaleResultsHold)
                } else {
                    Some(Self::FinaleVoteWindow)
                }
            }
        }
    }
}

/// An armed countdown. Dropping or cancelling the token stops the
/// scheduling task; the generation makes a stale expiry a no-op.
#[derive(Debug)]
pub struct ArmedTimer {
    pub task: TimerTask,
    pub deadline: Instant,
    /// Absolute expiry time for snapshots
    pub end_epoch: chrono::DateTime<chrono::Utc>,
    pub generation: u64,
    cancel: CancellationToken,
}

impl ArmedTimer {
    pub fn new(task: TimerTask, duration: Duration, generation: u64) -> (Self, CancellationToken) {
        let cancel = CancellationToken::new();
        let timer = Self {
            task,
            deadline: Instant::now() + duration,
            end_epoch: chrono::Utc::now()
                + chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero()),
            generation,
            cancel: cancel.clone(),
        };
        (timer, cancel)
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Remaining whole seconds, rounded up so a freshly armed 90 s timer
    /// pauses at 90, not 89.
    pub fn remaining_secs(&self) -> u64 {
        let remaining = self.remaining();
        let secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_only_for_player_facing_windows() {
        assert!(TimerTask::AnswerWindow.ticks());
        assert!(TimerTask::VoteWindow.ticks());
        assert!(TimerTask::FinaleAnswerWindow.ticks());
        assert!(TimerTask::FinaleVoteWindow.ticks());
        assert!(!TimerTask::MatchupIntro.ticks());
        assert!(!TimerTask::MatchupResultHold.ticks());
        assert!(!TimerTask::RoundScoresHold.ticks());
        assert!(!TimerTask::FinaleResultsHold.ticks());
    }

    #[tokio::test]
    async fn test_remaining_rounds_up() {
        let (timer, _cancel) = ArmedTimer::new(TimerTask::AnswerWindow, Duration::from_secs(90), 1);
        let secs = timer.remaining_secs();
        assert!(secs == 90 || secs == 89, "got {secs}");
    }

    #[tokio::test]
    async fn test_cancel_token_fires() {
        let (timer, cancel) = ArmedTimer::new(TimerTask::VoteWindow, Duration::from_secs(30), 7);
        assert!(!cancel.is_cancelled());
        timer.cancel();
        assert!(cancel.is_cancelled());
    }
}
