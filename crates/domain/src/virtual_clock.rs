//! Simulated game clock and timed forensic analyses.
//!
//! Game time runs at `time_speed` times real time and can be paused. While
//! running, the clock satisfies
//!
//! ```text
//! game_time = game_start_time + (now - real_anchor_time) * time_speed
//! ```
//!
//! Pausing freezes `game_time`. Resuming and changing speed move the real
//! anchor (never `game_time`) so game time stays continuous across the
//! transition. An analysis started before a speed change therefore runs at the
//! new speed from the change onwards; its deadline is fixed in game time.
//!
//! The clock never reads the wall clock itself: every operation that depends
//! on real time takes `now` from the caller, who also drives `tick` at a
//! regular cadence. Completion is detected on crossing a deadline, so the
//! precision of completion is bounded by tick cadence times speed.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{AnalysisId, AnalysisKey, AnalysisType, EvidenceId};
use crate::progress::AnalysisResult;

/// Fastest supported clock: one game day per real second.
pub const MAX_TIME_SPEED: f64 = 86_400.0;

// =============================================================================
// Timed analysis
// =============================================================================

/// A forensic analysis that completes after a span of game time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedAnalysis {
    id: AnalysisId,
    evidence_id: EvidenceId,
    analysis_type: AnalysisType,
    start_time: DateTime<Utc>,
    duration_ms: i64,
    is_completed: bool,
    result: Option<AnalysisResult>,
    /// Revealed as `result` on completion.
    pending_result: AnalysisResult,
}

impl TimedAnalysis {
    #[inline]
    pub fn id(&self) -> AnalysisId {
        self.id
    }

    #[inline]
    pub fn evidence_id(&self) -> &EvidenceId {
        &self.evidence_id
    }

    #[inline]
    pub fn analysis_type(&self) -> &AnalysisType {
        &self.analysis_type
    }

    /// Game time at which the analysis was scheduled.
    #[inline]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Game-time duration in milliseconds.
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// `None` until the analysis completes.
    #[inline]
    pub fn result(&self) -> Option<AnalysisResult> {
        self.result
    }

    /// Saturates at the latest representable instant.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.start_time
            .checked_add_signed(Duration::milliseconds(self.duration_ms.max(0)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn key(&self) -> AnalysisKey {
        AnalysisKey::new(&self.analysis_type, &self.evidence_id)
    }

    /// Fraction of the duration elapsed at `game_time`, in `[0, 1]`.
    pub fn progress_at(&self, game_time: DateTime<Utc>) -> f64 {
        if self.is_completed || self.duration_ms <= 0 {
            return 1.0;
        }
        let elapsed = (game_time - self.start_time).num_milliseconds() as f64;
        (elapsed / self.duration_ms as f64).clamp(0.0, 1.0)
    }

    /// The analysis as a player may see it, sealed result left out.
    pub fn view(&self, game_time: DateTime<Utc>) -> AnalysisView {
        AnalysisView {
            id: self.id,
            evidence_id: self.evidence_id.clone(),
            analysis_type: self.analysis_type.clone(),
            start_time: self.start_time,
            deadline: self.deadline(),
            is_completed: self.is_completed,
            result: self.result,
            progress: self.progress_at(game_time),
        }
    }

    fn complete(&mut self) {
        self.is_completed = true;
        self.result = Some(self.pending_result);
    }
}

/// Player-facing state of a timed analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisView {
    pub id: AnalysisId,
    pub evidence_id: EvidenceId,
    pub analysis_type: AnalysisType,
    pub start_time: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub is_completed: bool,
    pub result: Option<AnalysisResult>,
    /// Fraction of the duration elapsed, in `[0, 1]`.
    pub progress: f64,
}

// =============================================================================
// Clock state snapshot
// =============================================================================

/// Serializable image of a clock, pending analyses and their sealed results
/// included. Meant for persistence; players get a [`ClockView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockState {
    pub game_time: DateTime<Utc>,
    pub time_speed: f64,
    pub is_paused: bool,
    pub game_start_time: DateTime<Utc>,
    pub real_anchor_time: DateTime<Utc>,
    pub analyses: Vec<TimedAnalysis>,
}

/// Player-facing clock state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockView {
    pub game_time: DateTime<Utc>,
    pub time_speed: f64,
    pub is_paused: bool,
    pub elapsed_game_ms: i64,
    pub analyses: Vec<AnalysisView>,
}

// =============================================================================
// Virtual clock
// =============================================================================

#[derive(Debug, Clone)]
pub struct VirtualClock {
    game_time: DateTime<Utc>,
    time_speed: f64,
    is_paused: bool,
    game_start_time: DateTime<Utc>,
    real_anchor_time: DateTime<Utc>,
    analyses: Vec<TimedAnalysis>,
    /// Min-heap of (deadline, index into `analyses`) for pending entries.
    deadlines: BinaryHeap<Reverse<(DateTime<Utc>, usize)>>,
}

impl VirtualClock {
    /// A running clock at speed 1 whose game time starts at `game_start`.
    pub fn new(game_start: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            game_time: game_start,
            time_speed: 1.0,
            is_paused: false,
            game_start_time: game_start,
            real_anchor_time: now,
            analyses: Vec::new(),
            deadlines: BinaryHeap::new(),
        }
    }

    pub fn with_speed(
        game_start: DateTime<Utc>,
        speed: f64,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let mut clock = Self::new(game_start, now);
        clock.set_speed(speed, now)?;
        Ok(clock)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn game_time(&self) -> DateTime<Utc> {
        self.game_time
    }

    #[inline]
    pub fn time_speed(&self) -> f64 {
        self.time_speed
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    #[inline]
    pub fn game_start_time(&self) -> DateTime<Utc> {
        self.game_start_time
    }

    #[inline]
    pub fn real_anchor_time(&self) -> DateTime<Utc> {
        self.real_anchor_time
    }

    pub fn elapsed_game_time(&self) -> Duration {
        self.game_time - self.game_start_time
    }

    /// All analyses in scheduling order.
    pub fn analyses(&self) -> &[TimedAnalysis] {
        &self.analyses
    }

    pub fn pending_analyses(&self) -> impl Iterator<Item = &TimedAnalysis> {
        self.analyses.iter().filter(|a| !a.is_completed)
    }

    pub fn find_analysis(&self, id: AnalysisId) -> Option<&TimedAnalysis> {
        self.analyses.iter().find(|a| a.id == id)
    }

    /// Whether an analysis with this composite key is still running.
    pub fn is_pending(&self, key: &AnalysisKey) -> bool {
        self.pending_analyses().any(|a| &a.key() == key)
    }

    // =========================================================================
    // Time control
    // =========================================================================

    /// Recompute game time from the anchor formula. No-op while paused.
    ///
    /// Game time never moves backwards, even if `now` does.
    pub fn tick(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        if !self.is_paused {
            let computed = self
                .game_start_time
                .checked_add_signed(scale(now - self.real_anchor_time, self.time_speed))
                .unwrap_or(self.game_time);
            self.game_time = computed.max(self.game_time);
        }
        self.game_time
    }

    /// Freeze game time at its value for `now`.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.is_paused {
            return;
        }
        self.tick(now);
        self.is_paused = true;
    }

    /// Continue from the frozen game time.
    pub fn resume(&mut self, now: DateTime<Utc>) {
        if !self.is_paused {
            return;
        }
        self.recalibrate(now);
        self.is_paused = false;
    }

    /// Change speed without a jump in game time.
    pub fn set_speed(&mut self, speed: f64, now: DateTime<Utc>) -> Result<(), DomainError> {
        check_speed(speed)?;
        self.tick(now);
        self.time_speed = speed;
        self.recalibrate(now);
        Ok(())
    }

    /// Move the real anchor so the formula reproduces the current game time at `now`.
    fn recalibrate(&mut self, now: DateTime<Utc>) {
        let elapsed_game = self.game_time - self.game_start_time;
        if let Some(anchor) = now.checked_sub_signed(unscale(elapsed_game, self.time_speed)) {
            self.real_anchor_time = anchor;
        }
    }

    // =========================================================================
    // Analyses
    // =========================================================================

    /// Register an analysis starting at the current game time.
    ///
    /// `result` is sealed until the analysis completes. Call `tick` first so
    /// the start is anchored at the present.
    pub fn schedule_analysis(
        &mut self,
        evidence_id: EvidenceId,
        analysis_type: AnalysisType,
        duration: Duration,
        result: AnalysisResult,
    ) -> Result<TimedAnalysis, DomainError> {
        if duration <= Duration::zero() {
            return Err(DomainError::validation("Analysis duration must be positive"));
        }

        let analysis = TimedAnalysis {
            id: AnalysisId::new(),
            evidence_id,
            analysis_type,
            start_time: self.game_time,
            duration_ms: duration.num_milliseconds(),
            is_completed: false,
            result: None,
            pending_result: result,
        };
        self.deadlines
            .push(Reverse((analysis.deadline(), self.analyses.len())));
        self.analyses.push(analysis.clone());
        Ok(analysis)
    }

    /// Complete every pending analysis whose deadline is at or before
    /// `game_time`, returning each of them exactly once.
    pub fn poll_completions(&mut self, game_time: DateTime<Utc>) -> Vec<TimedAnalysis> {
        let mut completed = Vec::new();
        while let Some(Reverse((deadline, index))) = self.deadlines.peek().copied() {
            if deadline > game_time {
                break;
            }
            self.deadlines.pop();
            if let Some(analysis) = self.analyses.get_mut(index) {
                if !analysis.is_completed {
                    analysis.complete();
                    completed.push(analysis.clone());
                }
            }
        }
        completed
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    pub fn view(&self) -> ClockView {
        ClockView {
            game_time: self.game_time,
            time_speed: self.time_speed,
            is_paused: self.is_paused,
            elapsed_game_ms: self.elapsed_game_time().num_milliseconds(),
            analyses: self
                .analyses
                .iter()
                .map(|a| a.view(self.game_time))
                .collect(),
        }
    }

    pub fn snapshot(&self) -> ClockState {
        ClockState {
            game_time: self.game_time,
            time_speed: self.time_speed,
            is_paused: self.is_paused,
            game_start_time: self.game_start_time,
            real_anchor_time: self.real_anchor_time,
            analyses: self.analyses.clone(),
        }
    }

    pub fn restore(state: ClockState) -> Result<Self, DomainError> {
        check_speed(state.time_speed)?;
        let deadlines = state
            .analyses
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.is_completed)
            .map(|(i, a)| Reverse((a.deadline(), i)))
            .collect();

        Ok(Self {
            game_time: state.game_time,
            time_speed: state.time_speed,
            is_paused: state.is_paused,
            game_start_time: state.game_start_time,
            real_anchor_time: state.real_anchor_time,
            analyses: state.analyses,
            deadlines,
        })
    }
}

fn check_speed(speed: f64) -> Result<(), DomainError> {
    if !speed.is_finite() || speed <= 0.0 || speed > MAX_TIME_SPEED {
        return Err(DomainError::validation(format!(
            "Time speed must be a positive number up to {}, got {}",
            MAX_TIME_SPEED, speed
        )));
    }
    Ok(())
}

/// Real duration to game duration.
fn scale(real: Duration, speed: f64) -> Duration {
    from_nanos_f64(to_nanos_f64(real) * speed)
}

/// Game duration to real duration.
fn unscale(game: Duration, speed: f64) -> Duration {
    from_nanos_f64(to_nanos_f64(game) / speed)
}

fn to_nanos_f64(d: Duration) -> f64 {
    match d.num_nanoseconds() {
        Some(ns) => ns as f64,
        None => d.num_milliseconds() as f64 * 1_000_000.0,
    }
}

fn from_nanos_f64(ns: f64) -> Duration {
    let rounded = ns.round();
    if rounded.abs() < i64::MAX as f64 {
        Duration::nanoseconds(rounded as i64)
    } else {
        // Saturates at the bounds of `Duration`.
        Duration::milliseconds(((rounded / 1_000_000.0) as i64).max(-i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::t0;

    fn game_start() -> DateTime<Utc> {
        t0() - Duration::days(30)
    }

    fn ms(n: i64) -> Duration {
        Duration::milliseconds(n)
    }

    #[test]
    fn running_clock_follows_anchor_formula() {
        let mut clock = VirtualClock::new(game_start(), t0());
        assert_eq!(clock.tick(t0() + ms(1500)), game_start() + ms(1500));

        clock.set_speed(60.0, t0() + ms(1500)).unwrap();
        assert_eq!(clock.tick(t0() + ms(2500)), game_start() + ms(1500 + 60_000));
    }

    #[test]
    fn paused_clock_ignores_ticks_and_resumes_without_jump() {
        let mut clock = VirtualClock::new(game_start(), t0());
        clock.tick(t0() + ms(400));
        clock.pause(t0() + ms(1000));
        let frozen = clock.game_time();
        assert_eq!(frozen, game_start() + ms(1000));

        assert_eq!(clock.tick(t0() + ms(60_000)), frozen);

        clock.resume(t0() + ms(60_000));
        assert_eq!(clock.game_time(), frozen);
        assert_eq!(clock.tick(t0() + ms(60_000)), frozen);
        assert_eq!(clock.tick(t0() + ms(61_000)), frozen + ms(1000));
    }

    #[test]
    fn speed_change_keeps_game_time_continuous() {
        let mut clock = VirtualClock::new(game_start(), t0());
        let before = clock.tick(t0() + Duration::minutes(10));

        clock.set_speed(4.0, t0() + Duration::minutes(10)).unwrap();
        assert_eq!(clock.game_time(), before);
        assert_eq!(clock.tick(t0() + Duration::minutes(10)), before);
        assert_eq!(
            clock.tick(t0() + Duration::minutes(11)),
            before + Duration::minutes(4)
        );
    }

    #[test]
    fn speed_change_while_paused_applies_after_resume() {
        let mut clock = VirtualClock::new(game_start(), t0());
        clock.pause(t0() + Duration::minutes(1));
        clock.set_speed(2.0, t0() + Duration::minutes(5)).unwrap();
        assert_eq!(clock.tick(t0() + Duration::minutes(8)), game_start() + Duration::minutes(1));

        clock.resume(t0() + Duration::minutes(10));
        assert_eq!(
            clock.tick(t0() + Duration::minutes(11)),
            game_start() + Duration::minutes(3)
        );
    }

    #[test]
    fn rejects_non_positive_speed() {
        let mut clock = VirtualClock::new(game_start(), t0());
        assert!(clock.set_speed(0.0, t0()).is_err());
        assert!(clock.set_speed(-2.0, t0()).is_err());
        assert!(clock.set_speed(f64::NAN, t0()).is_err());
        assert!(clock.set_speed(1e300, t0()).is_err());
        assert!(clock.set_speed(MAX_TIME_SPEED * 2.0, t0()).is_err());
        assert_eq!(clock.time_speed(), 1.0);

        clock.set_speed(MAX_TIME_SPEED, t0()).unwrap();
        assert_eq!(clock.tick(t0() + ms(1000)), game_start() + Duration::days(1));
    }

    #[test]
    fn ticks_past_the_calendar_leave_game_time_in_place() {
        let mut clock = VirtualClock::with_speed(game_start(), MAX_TIME_SPEED, t0()).unwrap();
        let before = clock.tick(t0() + ms(10));

        assert_eq!(clock.tick(DateTime::<Utc>::MAX_UTC), before);
        assert_eq!(clock.tick(DateTime::<Utc>::MIN_UTC), before);
        clock.pause(DateTime::<Utc>::MAX_UTC);
        clock.resume(DateTime::<Utc>::MIN_UTC);
        assert_eq!(clock.game_time(), before);
    }

    #[test]
    fn unreachable_deadline_never_completes() {
        let mut clock = VirtualClock::new(game_start(), t0());
        clock
            .schedule_analysis(
                EvidenceId::from("a"),
                AnalysisType::from("dna"),
                Duration::minutes(10),
                AnalysisResult::Correct,
            )
            .unwrap();
        let mut state = clock.snapshot();
        state.analyses[0].duration_ms = i64::MAX;

        let mut restored = VirtualClock::restore(state).unwrap();
        assert_eq!(restored.analyses()[0].deadline(), DateTime::<Utc>::MAX_UTC);
        let game_time = restored.tick(t0() + Duration::days(365));
        assert!(restored.poll_completions(game_time).is_empty());
    }

    #[test]
    fn restore_rejects_out_of_range_speed() {
        let mut state = VirtualClock::new(game_start(), t0()).snapshot();
        state.time_speed = 1e300;
        assert!(VirtualClock::restore(state).is_err());
    }

    #[test]
    fn analysis_completes_exactly_once_after_deadline() {
        let mut clock = VirtualClock::with_speed(game_start(), 60.0, t0()).unwrap();
        let analysis = clock
            .schedule_analysis(
                EvidenceId::from("torn_glove"),
                AnalysisType::from("dna"),
                Duration::minutes(60),
                AnalysisResult::Correct,
            )
            .unwrap();
        assert_eq!(analysis.start_time(), game_start());
        assert_eq!(analysis.result(), None);

        // 59 real seconds at 60x is 59 game minutes.
        let game_time = clock.tick(t0() + Duration::seconds(59));
        assert!(clock.poll_completions(game_time).is_empty());

        let mut completions = Vec::new();
        for second in 60..70 {
            let game_time = clock.tick(t0() + Duration::seconds(second));
            completions.extend(clock.poll_completions(game_time));
        }
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].id(), analysis.id());
        assert!(completions[0].is_completed());
        assert_eq!(completions[0].result(), Some(AnalysisResult::Correct));
        assert!(clock.find_analysis(analysis.id()).unwrap().is_completed());
        assert!(!clock.is_pending(&analysis.key()));
    }

    #[test]
    fn completions_come_out_in_deadline_order() {
        let mut clock = VirtualClock::new(game_start(), t0());
        let slow = clock
            .schedule_analysis(
                EvidenceId::from("a"),
                AnalysisType::from("dna"),
                Duration::minutes(30),
                AnalysisResult::Correct,
            )
            .unwrap();
        let fast = clock
            .schedule_analysis(
                EvidenceId::from("b"),
                AnalysisType::from("fingerprint"),
                Duration::minutes(5),
                AnalysisResult::Incorrect,
            )
            .unwrap();

        let game_time = clock.tick(t0() + Duration::hours(1));
        let ids: Vec<_> = clock
            .poll_completions(game_time)
            .iter()
            .map(|a| a.id())
            .collect();
        assert_eq!(ids, vec![fast.id(), slow.id()]);
    }

    #[test]
    fn paused_clock_does_not_complete_analyses() {
        let mut clock = VirtualClock::new(game_start(), t0());
        clock
            .schedule_analysis(
                EvidenceId::from("a"),
                AnalysisType::from("dna"),
                Duration::minutes(1),
                AnalysisResult::Correct,
            )
            .unwrap();
        clock.pause(t0());
        let game_time = clock.tick(t0() + Duration::hours(2));
        assert!(clock.poll_completions(game_time).is_empty());
    }

    #[test]
    fn rejects_zero_duration() {
        let mut clock = VirtualClock::new(game_start(), t0());
        let result = clock.schedule_analysis(
            EvidenceId::from("a"),
            AnalysisType::from("dna"),
            Duration::zero(),
            AnalysisResult::Correct,
        );
        assert!(result.is_err());
    }

    #[test]
    fn progress_fraction_tracks_game_time() {
        let mut clock = VirtualClock::new(game_start(), t0());
        let analysis = clock
            .schedule_analysis(
                EvidenceId::from("a"),
                AnalysisType::from("dna"),
                Duration::minutes(10),
                AnalysisResult::Correct,
            )
            .unwrap();
        assert_eq!(analysis.progress_at(game_start() + Duration::minutes(5)), 0.5);
        assert_eq!(analysis.progress_at(game_start() + Duration::minutes(20)), 1.0);
    }

    #[test]
    fn restored_clock_keeps_pending_analyses() {
        let mut clock = VirtualClock::new(game_start(), t0());
        clock
            .schedule_analysis(
                EvidenceId::from("a"),
                AnalysisType::from("dna"),
                Duration::minutes(10),
                AnalysisResult::Correct,
            )
            .unwrap();
        let json = serde_json::to_string(&clock.snapshot()).unwrap();
        let state: ClockState = serde_json::from_str(&json).unwrap();

        let mut restored = VirtualClock::restore(state).unwrap();
        let game_time = restored.tick(t0() + Duration::minutes(10));
        assert_eq!(restored.poll_completions(game_time).len(), 1);
    }

    #[test]
    fn sealed_result_survives_restore_and_is_revealed_on_completion() {
        let mut clock = VirtualClock::new(game_start(), t0());
        let analysis = clock
            .schedule_analysis(
                EvidenceId::from("display_case"),
                AnalysisType::from("dna"),
                Duration::minutes(10),
                AnalysisResult::Incorrect,
            )
            .unwrap();
        clock.tick(t0() + Duration::minutes(4));

        let json = serde_json::to_string(&clock.snapshot()).unwrap();
        let mut restored = VirtualClock::restore(serde_json::from_str(&json).unwrap()).unwrap();
        assert!(restored.is_pending(&analysis.key()));
        assert_eq!(restored.find_analysis(analysis.id()).unwrap().result(), None);

        let early = restored.tick(t0() + Duration::minutes(9));
        assert!(restored.poll_completions(early).is_empty());
        let game_time = restored.tick(t0() + Duration::minutes(10));
        let completed = restored.poll_completions(game_time);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id(), analysis.id());
        assert_eq!(completed[0].result(), Some(AnalysisResult::Incorrect));
        assert!(restored.poll_completions(game_time).is_empty());
    }

    #[test]
    fn view_hides_the_sealed_result_until_completion() {
        let mut clock = VirtualClock::new(game_start(), t0());
        clock
            .schedule_analysis(
                EvidenceId::from("a"),
                AnalysisType::from("dna"),
                Duration::minutes(10),
                AnalysisResult::Correct,
            )
            .unwrap();
        clock.tick(t0() + Duration::minutes(5));

        let view = clock.view();
        assert_eq!(view.elapsed_game_ms, 5 * 60_000);
        assert_eq!(view.analyses[0].progress, 0.5);
        assert_eq!(view.analyses[0].result, None);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("correct"), "{json}");

        let game_time = clock.tick(t0() + Duration::minutes(10));
        clock.poll_completions(game_time);
        assert_eq!(clock.view().analyses[0].result, Some(AnalysisResult::Correct));
    }
}
