//! Per-connection best-frame tracking.
//!
//! A `Session` is owned by exactly one connection. The registry hands out
//! `Arc<Mutex<Session>>` handles so the read-compare-replace of the best pair
//! always happens under that session's lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::error::{FrameGateError, Result};
use crate::frame::RawFrame;
use crate::pipeline::DetectionResult;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Streaming,
}

/// Which evaluated frames are offered for promotion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionRule {
    /// Only frames the scoring policy accepted.
    #[default]
    AcceptedOnly,
    /// Any frame whose confidence beats the current best.
    AnyImprovement,
}

impl PromotionRule {
    pub fn offers(self, result: &DetectionResult) -> bool {
        match self {
            PromotionRule::AcceptedOnly => result.accepted,
            PromotionRule::AnyImprovement => true,
        }
    }
}

impl std::str::FromStr for PromotionRule {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accepted_only" | "accepted" => Ok(PromotionRule::AcceptedOnly),
            "any_improvement" | "any" => Ok(PromotionRule::AnyImprovement),
            other => Err(format!("unknown promotion rule '{}'", other)),
        }
    }
}

/// The retained frame and the confidence it was stored with. Cloning shares
/// the pixels.
#[derive(Clone, Debug)]
pub struct BestFrame {
    pub confidence: f32,
    pub frame_number: u64,
    pub frame: Arc<RawFrame>,
}

#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    frame_count: u64,
    best: Option<BestFrame>,
    rule: PromotionRule,
    generation: u64,
}

impl Session {
    pub fn new(rule: PromotionRule) -> Self {
        Self {
            rule,
            ..Self::default()
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn rule(&self) -> PromotionRule {
        self.rule
    }

    /// Bumped by every `reset`. A frame evaluated against an older generation
    /// belongs to abandoned state.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Count a frame and keep it if it beats the current best. Ties keep the
    /// earlier frame. Returns whether the frame was promoted.
    pub fn ingest(&mut self, frame: RawFrame, result: &DetectionResult) -> bool {
        self.observe(result);
        if result.confidence <= self.best_confidence() {
            return false;
        }
        log::debug!(
            "promoting frame {} ({:.3} > {:.3})",
            result.frame_number,
            result.confidence,
            self.best_confidence()
        );
        self.best = Some(BestFrame {
            confidence: result.confidence,
            frame_number: result.frame_number,
            frame: Arc::new(frame),
        });
        true
    }

    /// Count a frame without offering it for promotion.
    pub fn observe(&mut self, _result: &DetectionResult) {
        self.state = SessionState::Streaming;
        self.frame_count += 1;
    }

    /// Route a frame through `ingest` or `observe` according to the session's
    /// promotion rule.
    pub fn offer(&mut self, frame: RawFrame, result: &DetectionResult) -> bool {
        if self.rule.offers(result) {
            self.ingest(frame, result)
        } else {
            self.observe(result);
            false
        }
    }

    /// `offer`, but only if no reset happened since `generation` was read.
    /// A stale frame is dropped without being counted.
    pub fn offer_since(
        &mut self,
        generation: u64,
        frame: RawFrame,
        result: &DetectionResult,
    ) -> bool {
        if generation != self.generation {
            log::debug!(
                "dropping frame {} evaluated before a reset",
                result.frame_number
            );
            return false;
        }
        self.offer(frame, result)
    }

    /// Back to Idle. The retained frame is dropped (and zeroized once no
    /// reader still holds it). Frames still in flight from before the reset
    /// are discarded by `offer_since`.
    pub fn reset(&mut self) {
        log::debug!("session reset after {} frames", self.frame_count);
        self.state = SessionState::Idle;
        self.frame_count = 0;
        self.best = None;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn get_best(&self) -> Option<BestFrame> {
        self.best.clone()
    }

    /// 0.0 until a frame has been promoted.
    pub fn best_confidence(&self) -> f32 {
        self.best.as_ref().map_or(0.0, |b| b.confidence)
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Open sessions keyed by connection id. The map lock is held only for lookup
/// and insertion, never while a frame is evaluated.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionHandle>>,
    rule: PromotionRule,
}

impl SessionRegistry {
    pub fn new(rule: PromotionRule) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            rule,
        }
    }

    fn map(&self) -> Result<MutexGuard<'_, HashMap<String, SessionHandle>>> {
        self.sessions
            .lock()
            .map_err(|_| FrameGateError::Poisoned { what: "session registry" })
    }

    /// Open a session. Opening an id that is already open returns the
    /// existing session untouched.
    pub fn open(&self, session_id: &str) -> Result<SessionHandle> {
        let mut map = self.map()?;
        if let Some(existing) = map.get(session_id) {
            return Ok(existing.clone());
        }
        log::info!("session {} opened", session_id);
        let handle = Arc::new(Mutex::new(Session::new(self.rule)));
        map.insert(session_id.to_string(), handle.clone());
        Ok(handle)
    }

    pub fn get(&self, session_id: &str) -> Result<SessionHandle> {
        self.map()?
            .get(session_id)
            .cloned()
            .ok_or_else(|| FrameGateError::unknown_session(session_id))
    }

    /// Close a session and drop its state.
    pub fn close(&self, session_id: &str) -> Result<()> {
        let removed = self.map()?.remove(session_id);
        match removed {
            Some(handle) => {
                lock_session(&handle)?.reset();
                log::info!("session {} closed", session_id);
                Ok(())
            }
            None => Err(FrameGateError::unknown_session(session_id)),
        }
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.map()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.map()?.is_empty())
    }
}

pub(crate) fn lock_session(handle: &SessionHandle) -> Result<MutexGuard<'_, Session>> {
    handle
        .lock()
        .map_err(|_| FrameGateError::Poisoned { what: "session" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelFormat;

    fn frame(fill: u8) -> RawFrame {
        RawFrame::from_pixels(&[fill; 12], 2, 2, PixelFormat::Rgb24).unwrap()
    }

    fn result(frame_number: u64, confidence: f32, accepted: bool) -> DetectionResult {
        DetectionResult {
            frame_number,
            confidence,
            accepted,
            ..DetectionResult::default()
        }
    }

    #[test]
    fn best_confidence_tracks_running_max() {
        let mut session = Session::default();
        let confidences = [0.3, 0.9, 0.5, 0.9, 0.7];
        for (i, c) in confidences.iter().enumerate() {
            session.ingest(frame(i as u8), &result(i as u64, *c, true));
        }
        let best = session.get_best().unwrap();
        assert_eq!(best.confidence, 0.9);
        // ties keep the earlier frame
        assert_eq!(best.frame_number, 1);
        assert_eq!(session.frame_count(), 5);
    }

    #[test]
    fn promoted_frame_matches_stored_confidence() {
        let mut session = Session::default();
        assert!(session.ingest(frame(10), &result(0, 0.4, true)));
        assert!(!session.ingest(frame(20), &result(1, 0.2, true)));
        let best = session.get_best().unwrap();
        assert_eq!(best.confidence, session.best_confidence());
        assert_eq!(best.frame.digest(), frame(10).digest());
    }

    #[test]
    fn zero_confidence_never_promotes() {
        let mut session = Session::default();
        assert!(!session.ingest(frame(0), &result(0, 0.0, true)));
        assert!(session.get_best().is_none());
        assert_eq!(session.state(), SessionState::Streaming);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut session = Session::default();
        session.ingest(frame(1), &result(0, 0.8, true));
        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.frame_count(), 0);
        assert!(session.get_best().is_none());
        assert_eq!(session.best_confidence(), 0.0);

        session.ingest(frame(2), &result(1, 0.1, true));
        assert_eq!(session.best_confidence(), 0.1);
    }

    #[test]
    fn retained_frame_survives_reset_for_existing_readers() {
        let mut session = Session::default();
        session.ingest(frame(7), &result(0, 0.6, true));
        let held = session.get_best().unwrap();
        session.reset();
        assert_eq!(held.frame.width, 2);
        assert_eq!(held.confidence, 0.6);
    }

    #[test]
    fn accepted_only_rule_skips_rejected_frames() {
        let mut session = Session::new(PromotionRule::AcceptedOnly);
        assert!(!session.offer(frame(1), &result(0, 0.6, false)));
        assert!(session.get_best().is_none());
        assert_eq!(session.frame_count(), 1);

        let mut session = Session::new(PromotionRule::AnyImprovement);
        assert!(session.offer(frame(1), &result(0, 0.6, false)));
    }

    #[test]
    fn frames_evaluated_before_reset_are_dropped() {
        let mut session = Session::new(PromotionRule::AnyImprovement);
        let before = session.generation();
        session.ingest(frame(1), &result(0, 0.4, true));
        session.reset();

        assert!(!session.offer_since(before, frame(2), &result(1, 0.9, true)));
        assert!(session.get_best().is_none());
        assert_eq!(session.frame_count(), 0);
        assert_eq!(session.state(), SessionState::Idle);

        let current = session.generation();
        assert!(session.offer_since(current, frame(3), &result(2, 0.5, true)));
        assert_eq!(session.best_confidence(), 0.5);
    }

    #[test]
    fn registry_rejects_unknown_ids() {
        let registry = SessionRegistry::default();
        assert!(matches!(
            registry.get("missing"),
            Err(FrameGateError::UnknownSession { .. })
        ));
        assert!(matches!(
            registry.close("missing"),
            Err(FrameGateError::UnknownSession { .. })
        ));
    }

    #[test]
    fn registry_sessions_are_isolated() {
        let registry = SessionRegistry::default();
        let a = registry.open("a").unwrap();
        let b = registry.open("b").unwrap();
        lock_session(&a).unwrap().ingest(frame(1), &result(0, 0.9, true));
        assert_eq!(lock_session(&b).unwrap().best_confidence(), 0.0);

        let again = registry.open("a").unwrap();
        assert_eq!(lock_session(&again).unwrap().best_confidence(), 0.9);
        assert_eq!(registry.len().unwrap(), 2);

        registry.close("a").unwrap();
        assert!(registry.get("a").is_err());
        assert!(registry.get("b").is_ok());
    }

    #[test]
    fn promotion_rule_parses() {
        assert_eq!("any".parse::<PromotionRule>(), Ok(PromotionRule::AnyImprovement));
        assert_eq!(
            "Accepted_Only".parse::<PromotionRule>(),
            Ok(PromotionRule::AcceptedOnly)
        );
        assert!("sometimes".parse::<PromotionRule>().is_err());
    }
}
