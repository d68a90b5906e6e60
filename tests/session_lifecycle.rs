use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use framegate::detect::RawRectangle;
use framegate::emit::BestFrameReport;
use framegate::pipeline::PipelineConfig;
use framegate::{
    FrameGate, FrameGateError, FramePipeline, PixelFormat, PromotionRule, RawFrame,
    RectangleDetector, ScoringPolicy, ScriptStep, ScriptedDetector, SessionState,
    SyntheticPerson,
};

const W: u32 = 320;
const H: u32 = 240;

fn varied_script() -> Vec<ScriptStep> {
    let base = SyntheticPerson::default();
    vec![
        ScriptStep::empty(),
        SyntheticPerson { height_ratio: 0.3, ..base }.step(W, H),
        base.step(W, H),
        SyntheticPerson { center_x: 0.7, ..base }.step(W, H),
        ScriptStep::Failure("dropped connection".to_string()),
        SyntheticPerson { height_ratio: 0.9, ..base }.step(W, H),
    ]
}

fn gate(policy: ScoringPolicy, rule: PromotionRule) -> FrameGate {
    let detector = Arc::new(Mutex::new(ScriptedDetector::new(varied_script())));
    let pipeline = FramePipeline::builder(PipelineConfig {
        params: policy.params(),
        ..PipelineConfig::default()
    })
    .rectangle_detector(detector.clone())
    .pose_estimator(detector)
    .build()
    .expect("pipeline");
    FrameGate::new(pipeline, rule)
}

fn frame(seed: u8) -> RawFrame {
    let pixels: Vec<u8> = (0..W * H * 3)
        .map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed))
        .collect();
    RawFrame::from_pixels(&pixels, W, H, PixelFormat::Rgb24).expect("frame")
}

#[test]
fn best_confidence_is_running_max() {
    let gate = gate(ScoringPolicy::Lenient, PromotionRule::AnyImprovement);
    gate.open_session("s").expect("open");

    let mut max = 0.0f32;
    for n in 0..12u64 {
        let result = gate.ingest_frame("s", frame(n as u8), n).expect("ingest");
        max = max.max(result.confidence);
        let best = gate.get_best_frame("s").expect("best");
        let best_confidence = best.as_ref().map_or(0.0, |b| b.confidence);
        assert_eq!(best_confidence, max);
    }
    assert_eq!(gate.session_state("s").expect("state"), SessionState::Streaming);
}

#[test]
fn accepted_only_keeps_policy_accepted_frames() {
    let gate = gate(ScoringPolicy::Strict, PromotionRule::AcceptedOnly);
    gate.open_session("s").expect("open");

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for n in 0..6u64 {
        let result = gate.ingest_frame("s", frame(1), n).expect("ingest");
        if result.accepted {
            accepted.push((n, result.confidence));
        } else {
            rejected.push(n);
        }
    }
    assert!(!accepted.is_empty(), "centered person should pass Strict");
    // the empty step and the detector failure
    assert!(rejected.contains(&0));
    assert!(rejected.contains(&4));

    let best = gate
        .get_best_frame("s")
        .expect("best")
        .expect("accepted frame retained");
    let max = accepted.iter().map(|&(_, c)| c).fold(0.0f32, f32::max);
    assert_eq!(best.confidence, max);
    assert!(accepted.contains(&(best.frame_number, best.confidence)));
    assert!(!rejected.contains(&best.frame_number));

    let report = BestFrameReport::new(&best);
    assert_eq!(report.width, W);
    assert_eq!(report.digest.len(), 64);
}

/// Rectangle detector that parks inside `detect_rectangles` until released.
struct GatedDetector {
    rectangles: Vec<RawRectangle>,
    entered: mpsc::Sender<()>,
    release: mpsc::Receiver<()>,
}

impl RectangleDetector for GatedDetector {
    fn name(&self) -> &'static str {
        "gated"
    }

    fn detect_rectangles(
        &mut self,
        _pixels: &[u8],
        _width: u32,
        _height: u32,
    ) -> anyhow::Result<Vec<RawRectangle>> {
        let _ = self.entered.send(());
        self.release.recv()?;
        Ok(self.rectangles.clone())
    }
}

#[test]
fn reset_discards_frame_still_being_evaluated() {
    let person = SyntheticPerson::default();
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let detector = Arc::new(Mutex::new(GatedDetector {
        rectangles: person.rectangles(W, H),
        entered: entered_tx,
        release: release_rx,
    }));
    let pose = Arc::new(Mutex::new(ScriptedDetector::constant(
        Vec::new(),
        Some(person.skeleton(W, H)),
    )));
    let pipeline = FramePipeline::builder(PipelineConfig {
        params: ScoringPolicy::Lenient.params(),
        ..PipelineConfig::default()
    })
    .rectangle_detector(detector)
    .pose_estimator(pose)
    .build()
    .expect("pipeline");
    let gate = Arc::new(FrameGate::new(pipeline, PromotionRule::AnyImprovement));
    gate.open_session("s").expect("open");

    let in_flight = {
        let gate = Arc::clone(&gate);
        thread::spawn(move || gate.ingest_frame("s", frame(5), 7))
    };
    entered_rx.recv().expect("detector entered");
    gate.reset_session("s").expect("reset");
    release_tx.send(()).expect("release");

    let result = in_flight.join().expect("worker").expect("ingest");
    assert!(result.confidence > 0.0);
    assert!(gate.get_best_frame("s").expect("best").is_none());
    assert_eq!(gate.session_state("s").expect("state"), SessionState::Idle);

    // frames submitted after the reset are tracked again
    release_tx.send(()).expect("release");
    gate.ingest_frame("s", frame(6), 8).expect("ingest");
    let best = gate.get_best_frame("s").expect("best").expect("some best");
    assert_eq!(best.frame_number, 8);
}

#[test]
fn sessions_on_separate_threads_stay_isolated() {
    let gate = Arc::new(gate(ScoringPolicy::Lenient, PromotionRule::AnyImprovement));
    gate.open_session("busy").expect("open");
    gate.open_session("idle").expect("open");

    let workers: Vec<_> = (0..4u64)
        .map(|worker| {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                for n in 0..5u64 {
                    gate.ingest_frame("busy", frame(worker as u8), worker * 10 + n)
                        .expect("ingest");
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker");
    }

    assert!(gate.get_best_frame("busy").expect("best").is_some());
    assert!(gate.get_best_frame("idle").expect("best").is_none());
    assert_eq!(gate.session_state("idle").expect("state"), SessionState::Idle);
}

#[test]
fn closed_session_becomes_unknown() {
    let gate = gate(ScoringPolicy::Lenient, PromotionRule::AnyImprovement);
    gate.open_session("s").expect("open");
    gate.ingest_frame("s", frame(3), 0).expect("ingest");
    gate.close_session("s").expect("close");

    assert!(matches!(
        gate.get_best_frame("s"),
        Err(FrameGateError::UnknownSession { .. })
    ));
    assert!(matches!(
        gate.ingest_frame("s", frame(3), 1),
        Err(FrameGateError::UnknownSession { .. })
    ));
}
