//! Capture sessions and live recognition.
//!
//! [`RecordingSession`] turns a stream of frames into a gesture template through an explicit
//! state machine:
//!
//! ```text
//! Idle --Start--> Armed --Tick(countdown elapsed)--> Recording --window full--> AnchorCapture
//!   ^                                                                              |
//!   +------------------------ Tick --------- Saved <----------- Save -------------+
//! ```
//!
//! `Cancel` returns to `Idle` from any state. [`Recognizer`] consumes the same frames and
//! reports matches against a [`TemplateStore`].

use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::config::{EngineConfig, Strategy};
use crate::descriptor::{DescriptorStrategy, PoseDescriptor, PoseVector};
use crate::error::Result;
use crate::gesture::{GestureMatcher, GestureQuery};
use crate::history::LandmarkHistory;
use crate::pose::{AnchorPose, KeyframeSequence, PoseMatcher};
use crate::relevance::select_relevant;
use crate::template::{GestureTemplate, TemplateStore};
use crate::trajectory::TrajectoryPreprocessor;
use crate::types::{Frame, LandmarkId, MatchResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Counting down from `since_ms` before recording begins.
    Armed { since_ms: u64 },
    Recording { frame_count: usize },
    /// The window is full and waits for a name to be saved under.
    AnchorCapture,
    Saved { name: String },
}

#[derive(Debug, Clone, Copy)]
pub enum SessionEvent<'a> {
    Start { now_ms: u64 },
    Tick { now_ms: u64 },
    FrameCaptured(&'a Frame),
    Save { name: Option<&'a str> },
    Cancel,
}

/// Records one gesture window and builds a template from it.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    state: SessionState,
    countdown_ms: u64,
    record_end_anchor: bool,
    visibility_floor: f64,
    config: EngineConfig,
    history: LandmarkHistory,
    preprocessor: TrajectoryPreprocessor,
    descriptor: DescriptorStrategy,
    include: BTreeSet<LandmarkId>,
    exclude: BTreeSet<LandmarkId>,
    first_pose: Option<PoseVector>,
    last_pose: Option<PoseVector>,
}

impl RecordingSession {
    pub fn new(config: &EngineConfig) -> Result<RecordingSession> {
        config.validate()?;
        Ok(RecordingSession {
            state: SessionState::Idle,
            countdown_ms: config.session.countdown_ms,
            record_end_anchor: config.session.record_end_anchor,
            visibility_floor: config.visibility_floor,
            config: config.clone(),
            history: LandmarkHistory::new(&config.topology, config.window_len),
            preprocessor: TrajectoryPreprocessor::from_config(&config.trajectory)?,
            descriptor: config.pose.descriptor,
            include: BTreeSet::new(),
            exclude: BTreeSet::new(),
            first_pose: None,
            last_pose: None,
        })
    }

    /// Landmarks always kept in, or always left out of, the saved template.
    pub fn with_selection(
        mut self,
        include: BTreeSet<LandmarkId>,
        exclude: BTreeSet<LandmarkId>,
    ) -> Self {
        self.include = include;
        self.exclude = exclude;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn history(&self) -> &LandmarkHistory {
        &self.history
    }

    fn reset(&mut self) {
        self.history.clear();
        self.first_pose = None;
        self.last_pose = None;
    }

    /// Advances the state machine. Returns the template built by a `Save` in `AnchorCapture`.
    pub fn handle(&mut self, event: SessionEvent) -> Option<GestureTemplate> {
        let state = std::mem::replace(&mut self.state, SessionState::Idle);
        let (next, template) = match (state, event) {
            (_, SessionEvent::Cancel) => {
                log::debug!("recording cancelled");
                self.reset();
                (SessionState::Idle, None)
            }
            (SessionState::Idle | SessionState::Saved { .. }, SessionEvent::Start { now_ms }) => {
                self.reset();
                (SessionState::Armed { since_ms: now_ms }, None)
            }
            (SessionState::Armed { since_ms }, SessionEvent::Tick { now_ms }) => {
                if now_ms.saturating_sub(since_ms) >= self.countdown_ms {
                    log::info!("recording started");
                    (SessionState::Recording { frame_count: 0 }, None)
                } else {
                    (SessionState::Armed { since_ms }, None)
                }
            }
            (SessionState::Recording { frame_count }, SessionEvent::FrameCaptured(frame)) => {
                self.capture(frame, frame_count)
            }
            (SessionState::AnchorCapture, SessionEvent::Save { name }) => self.save(name),
            (SessionState::Saved { .. }, SessionEvent::Tick { .. }) => (SessionState::Idle, None),
            (state, event) => {
                log::trace!("{:?} ignored in {:?}", event, state);
                (state, None)
            }
        };
        self.state = next;
        template
    }

    fn capture(
        &mut self,
        frame: &Frame,
        frame_count: usize,
    ) -> (SessionState, Option<GestureTemplate>) {
        self.history.push_frame(frame, self.visibility_floor, self.config.dimension);
        let pose = self.descriptor.describe(frame);
        if frame_count == 0 {
            self.first_pose = Some(pose.clone());
        }
        self.last_pose = Some(pose);
        let frame_count = frame_count + 1;
        if self.history.is_full() {
            log::info!("recorded {} frames, waiting for save", frame_count);
            (SessionState::AnchorCapture, None)
        } else {
            (SessionState::Recording { frame_count }, None)
        }
    }

    fn save(&mut self, name: Option<&str>) -> (SessionState, Option<GestureTemplate>) {
        let name = name.unwrap_or("gesture").to_string();
        let selection = select_relevant(
            &self.history,
            self.config.dimension,
            &self.config.relevance,
            &self.include,
            &self.exclude,
        );
        if selection.is_empty() {
            log::warn!("no landmark moved enough to describe {}, nothing saved", name);
            self.reset();
            return (SessionState::Idle, None);
        }
        log::debug!("{} uses landmarks {:?}", name, selection);
        let last = if self.record_end_anchor {
            self.last_pose.take().map(AnchorPose::Dense)
        } else {
            None
        };
        let template =
            GestureTemplate::from_history(&name, &self.history, &selection, &self.preprocessor)
                .with_anchors(self.first_pose.take().map(AnchorPose::Dense), last);
        self.reset();
        (SessionState::Saved { name }, Some(template))
    }

    /// Saves under `name` (or the store's next free name) and persists the template.
    pub fn save_into(
        &mut self,
        store: &mut TemplateStore,
        name: Option<&str>,
    ) -> Result<Option<PathBuf>> {
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| store.next_gesture_name());
        match self.handle(SessionEvent::Save { name: Some(&name) }) {
            Some(template) => Ok(Some(store.save_gesture(template)?)),
            None => Ok(None),
        }
    }
}

/// Wall-clock counter running on its own thread.
///
/// The thread is the only writer of the millisecond counter; readers poll it without locking.
#[derive(Debug)]
pub struct CountdownTimer {
    elapsed_ms: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CountdownTimer {
    pub fn start(resolution: Duration) -> CountdownTimer {
        let elapsed_ms = Arc::new(AtomicU64::new(0));
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let elapsed_ms = elapsed_ms.clone();
            let stop = stop.clone();
            std::thread::spawn(move || {
                let origin = Instant::now();
                while !stop.load(Ordering::Acquire) {
                    elapsed_ms.store(origin.elapsed().as_millis() as u64, Ordering::Release);
                    std::thread::sleep(resolution);
                }
            })
        };
        CountdownTimer {
            elapsed_ms,
            stop,
            handle: Some(handle),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms.load(Ordering::Acquire)
    }

    /// Handle to the counter for a reader on another thread.
    pub fn counter(&self) -> Arc<AtomicU64> {
        self.elapsed_ms.clone()
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("countdown thread panicked");
            }
        }
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Per-stream matcher state; one per live capture or batch sample.
#[derive(Debug)]
pub struct Recognizer<'a> {
    store: &'a TemplateStore,
    strategy: Strategy,
    visibility_floor: f64,
    dimension: crate::types::Dimension,
    history: LandmarkHistory,
    poses: VecDeque<PoseVector>,
    descriptor: DescriptorStrategy,
    pose_matcher: PoseMatcher,
    gesture_matcher: GestureMatcher,
    sequences: Vec<(String, KeyframeSequence)>,
    recent: Option<MatchResult>,
    decay: u32,
    decay_frames: u32,
}

impl<'a> Recognizer<'a> {
    pub fn new(config: &EngineConfig, store: &'a TemplateStore) -> Result<Recognizer<'a>> {
        config.validate()?;
        let pose_matcher = PoseMatcher::from_config(&config.pose);
        let preprocessor = TrajectoryPreprocessor::from_config(&config.trajectory)?;
        Ok(Recognizer {
            store,
            strategy: config.strategy,
            visibility_floor: config.visibility_floor,
            dimension: config.dimension,
            history: LandmarkHistory::new(&config.topology, config.window_len),
            poses: VecDeque::with_capacity(config.window_len),
            descriptor: config.pose.descriptor,
            pose_matcher,
            gesture_matcher: GestureMatcher::new(
                config.gesture.clone(),
                preprocessor,
                pose_matcher,
            ),
            sequences: Vec::new(),
            recent: None,
            decay: 0,
            decay_frames: config.gesture.decay_frames,
        })
    }

    /// Tracks a keyframe sequence alongside the configured strategy.
    pub fn with_sequence(mut self, name: impl Into<String>, sequence: KeyframeSequence) -> Self {
        self.sequences.push((name.into(), sequence));
        self
    }

    pub fn history(&self) -> &LandmarkHistory {
        &self.history
    }

    /// Last match, kept for `decay_frames` frames after it was reported.
    pub fn recent_match(&self) -> Option<&MatchResult> {
        self.recent.as_ref()
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.poses.clear();
        self.sequences.iter_mut().for_each(|(_, s)| s.reset());
        self.recent = None;
        self.decay = 0;
    }

    /// Processes one estimator frame; `None` means no subject was detected.
    pub fn process_frame(&mut self, frame: Option<&Frame>) -> Option<MatchResult> {
        if self.decay > 0 {
            self.decay -= 1;
            if self.decay == 0 {
                self.recent = None;
            }
        }
        let Some(frame) = frame else {
            log::trace!("no landmarks in this frame");
            return None;
        };
        self.history
            .push_frame(frame, self.visibility_floor, self.dimension);
        let pose = self.descriptor.describe(frame);

        let mut result = match self.strategy {
            Strategy::Deviation => self.pose_matcher.best_match(&pose, self.store.poses()),
            Strategy::CyclicPermutation => self
                .pose_matcher
                .best_cyclic_match(&pose, self.store.poses()),
            Strategy::Dtw => None,
        };
        for (name, sequence) in self.sequences.iter_mut() {
            if sequence.observe(&self.pose_matcher, &pose) && result.is_none() {
                result = Some(MatchResult::new(name.clone(), 0.0));
            }
        }

        if self.poses.len() == self.history.capacity() {
            self.poses.pop_front();
        }
        self.poses.push_back(pose);
        if self.strategy == Strategy::Dtw && result.is_none() {
            result = self.match_window();
        }

        if let Some(m) = &result {
            log::info!("matched {} ({:.4})", m.template_name, m.score);
            self.recent = Some(m.clone());
            self.decay = self.decay_frames;
        }
        result
    }

    fn match_window(&mut self) -> Option<MatchResult> {
        if !self.history.is_full() {
            return None;
        }
        let query = GestureQuery {
            history: &self.history,
            pose_at_start: self.poses.front(),
            pose_at_end: self.poses.back(),
        };
        let result = self.gesture_matcher.best_match(self.store.gestures(), &query)?;
        if self.gesture_matcher.clears_history(&result.template_name) {
            self.history.clear();
            self.poses.clear();
        }
        Some(result)
    }
}
