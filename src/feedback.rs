//! Verdict feedback animation.
//!
//! A verdict plays a fixed flash sequence on the path, one colour per tick,
//! followed by a settle step that tells the path machine how to end the
//! attempt. The animator owns no timers: the caller polls it with the current
//! time, like the auto-save manager does.
//!
//! Each scheduled step records the session generation it was created under.
//! A step whose generation no longer matches at poll time is dropped, so a
//! sequence started for an old attempt can never act on a new one.

use std::collections::VecDeque;
use std::time::Duration;
use web_time::Instant;

use crate::editor::FeedbackColor;

/// Number of colour frames in a flash sequence.
pub const FLASH_FRAMES: usize = 7;

/// Something the animator asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackStep {
    /// Recolour path edges and endpoint halos.
    Highlight(FeedbackColor),
    /// The sequence is over.
    Settle { valid: bool },
}

#[derive(Debug, Clone)]
struct ScheduledStep {
    due: Instant,
    generation: u64,
    step: FeedbackStep,
}

/// Schedules and replays flash sequences.
#[derive(Debug)]
pub struct FeedbackAnimator {
    tick: Duration,
    queue: VecDeque<ScheduledStep>,
}

impl FeedbackAnimator {
    /// Default time between frames (200 ms).
    pub const DEFAULT_TICK: Duration = Duration::from_millis(200);

    pub fn new(tick: Duration) -> Self {
        Self {
            tick,
            queue: VecDeque::new(),
        }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Frames for a verdict: neutral alternating with success or failure.
    pub fn frames(valid: bool) -> [FeedbackColor; FLASH_FRAMES] {
        let flash = if valid {
            FeedbackColor::Success
        } else {
            FeedbackColor::Failure
        };
        std::array::from_fn(|i| {
            if i % 2 == 0 {
                FeedbackColor::Neutral
            } else {
                flash
            }
        })
    }

    /// Start the sequence for a verdict, replacing anything still pending.
    pub fn start(&mut self, valid: bool, generation: u64, now: Instant) {
        if !self.queue.is_empty() {
            log::debug!("Replacing {} pending feedback steps", self.queue.len());
        }
        self.queue.clear();

        for (i, color) in Self::frames(valid).into_iter().enumerate() {
            self.queue.push_back(ScheduledStep {
                due: now + self.tick * i as u32,
                generation,
                step: FeedbackStep::Highlight(color),
            });
        }
        self.queue.push_back(ScheduledStep {
            due: now + self.tick * FLASH_FRAMES as u32,
            generation,
            step: FeedbackStep::Settle { valid },
        });
        log::debug!(
            "Feedback sequence started (valid={}, generation={})",
            valid,
            generation
        );
    }

    /// Drop every pending step.
    pub fn cancel(&mut self) {
        if !self.queue.is_empty() {
            log::debug!("Cancelled {} pending feedback steps", self.queue.len());
            self.queue.clear();
        }
    }

    /// Whether any step is still pending.
    pub fn is_active(&self) -> bool {
        !self.queue.is_empty()
    }

    /// When the next step fires.
    pub fn next_due(&self) -> Option<Instant> {
        self.queue.front().map(|s| s.due)
    }

    /// Take every step due at `now`, in order. Steps scheduled under another
    /// generation are discarded.
    pub fn poll(&mut self, now: Instant, generation: u64) -> Vec<FeedbackStep> {
        let mut due = Vec::new();
        while let Some(front) = self.queue.front() {
            if front.due > now {
                break;
            }
            let Some(scheduled) = self.queue.pop_front() else {
                break;
            };
            if scheduled.generation == generation {
                due.push(scheduled.step);
            } else {
                log::trace!(
                    "Dropping stale feedback step from generation {}",
                    scheduled.generation
                );
            }
        }
        due
    }
}

impl Default for FeedbackAnimator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TICK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = FeedbackAnimator::DEFAULT_TICK;

    #[test]
    fn test_frames() {
        use FeedbackColor::*;
        assert_eq!(
            FeedbackAnimator::frames(true),
            [Neutral, Success, Neutral, Success, Neutral, Success, Neutral]
        );
        assert_eq!(
            FeedbackAnimator::frames(false),
            [Neutral, Failure, Neutral, Failure, Neutral, Failure, Neutral]
        );
    }

    #[test]
    fn test_steps_fire_one_per_tick() {
        let mut animator = FeedbackAnimator::default();
        let t0 = Instant::now();
        animator.start(false, 1, t0);

        assert_eq!(
            animator.poll(t0, 1),
            vec![FeedbackStep::Highlight(FeedbackColor::Neutral)]
        );
        assert!(animator.poll(t0 + TICK / 2, 1).is_empty());
        assert_eq!(
            animator.poll(t0 + TICK, 1),
            vec![FeedbackStep::Highlight(FeedbackColor::Failure)]
        );

        let rest = animator.poll(t0 + TICK * 7, 1);
        assert_eq!(rest.len(), 6);
        assert_eq!(rest.last(), Some(&FeedbackStep::Settle { valid: false }));
        assert!(!animator.is_active());
    }

    #[test]
    fn test_stale_generation_is_inert() {
        let mut animator = FeedbackAnimator::default();
        let t0 = Instant::now();
        animator.start(true, 3, t0);

        assert!(animator.poll(t0 + TICK * 10, 4).is_empty());
        assert!(!animator.is_active());
    }

    #[test]
    fn test_restart_replaces_pending_steps() {
        let mut animator = FeedbackAnimator::default();
        let t0 = Instant::now();
        animator.start(true, 1, t0);
        animator.poll(t0, 1);

        animator.start(false, 2, t0 + TICK);
        let steps = animator.poll(t0 + TICK * 20, 2);
        assert_eq!(steps.len(), FLASH_FRAMES + 1);
        assert!(!steps.contains(&FeedbackStep::Highlight(FeedbackColor::Success)));
        assert_eq!(steps.last(), Some(&FeedbackStep::Settle { valid: false }));
    }

    #[test]
    fn test_cancel() {
        let mut animator = FeedbackAnimator::default();
        let t0 = Instant::now();
        animator.start(true, 1, t0);
        assert_eq!(animator.next_due(), Some(t0));
        animator.cancel();
        assert!(animator.poll(t0 + TICK * 10, 1).is_empty());
        assert_eq!(animator.next_due(), None);
    }
}
