//! Staged, viewport-driven image loading for poster cards.
//!
//! Each card walks through a fixed list of image stages. While a card is in
//! view, the next stage is requested after a delay that grows with the number
//! of stages already requested. Leaving the view cancels the pending timer
//! and every in-flight request of the card; canceled stages are rolled back
//! and requested again on the next entry.
//!
//! Time is supplied by the caller, so the scheduler is a plain state machine.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::host::{FetchError, ImageHandle};
use crate::model::ItemId;

/// Index of a card in its presentation.
pub type CardId = usize;

/// Default delays before the first, second and later stages.
pub const DEFAULT_STAGE_DELAYS: [Duration; 3] = [
    Duration::from_millis(1500),
    Duration::from_millis(2500),
    Duration::from_millis(4000),
];

/// Identifies one issued request. The sequence number differs between a
/// canceled request and the retry of the same stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub card: CardId,
    pub stage: usize,
    pub seq: u64,
}

/// Shared cancellation flag handed to the fetching task.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageState {
    Pending,
    InFlight(RequestKey),
    Done,
    /// Failed; requestable again after the card re-enters the view.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Idle,
    Loading,
    Loaded,
    Exhausted,
}

/// An image fetch the host has to perform.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub key: RequestKey,
    pub item_id: ItemId,
    pub stage_type: u32,
    pub cancel: CancelHandle,
}

/// Per-card stage bookkeeping.
#[derive(Debug, Clone)]
pub struct StagedLoader {
    item_id: ItemId,
    stage_types: Vec<u32>,
    stages: Vec<StageState>,
    pending_loads: HashMap<RequestKey, CancelHandle>,
    images: Vec<Option<ImageHandle>>,
}

impl StagedLoader {
    pub fn new(item_id: impl Into<ItemId>, stage_types: &[u32]) -> Self {
        Self {
            item_id: item_id.into(),
            stage_types: stage_types.to_vec(),
            stages: vec![StageState::Pending; stage_types.len()],
            pending_loads: HashMap::new(),
            images: vec![None; stage_types.len()],
        }
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn stages(&self) -> &[StageState] {
        &self.stages
    }

    /// Number of stages requested and not rolled back.
    pub fn image_type_index(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| matches!(s, StageState::InFlight(_) | StageState::Done))
            .count()
    }

    pub fn pending_loads(&self) -> usize {
        self.pending_loads.len()
    }

    /// Next stage that may be requested.
    pub fn next_stage(&self) -> Option<usize> {
        self.stages.iter().position(|s| *s == StageState::Pending)
    }

    pub fn state(&self) -> CardState {
        if !self.stages.is_empty() && self.stages.iter().all(|s| *s == StageState::Done) {
            CardState::Exhausted
        } else if self.stages.iter().any(|s| matches!(s, StageState::InFlight(_))) {
            CardState::Loading
        } else if self.stages.iter().any(|s| *s == StageState::Done) {
            CardState::Loaded
        } else {
            CardState::Idle
        }
    }

    /// Highest completed stage's image.
    pub fn best_image(&self) -> Option<&ImageHandle> {
        self.images.iter().rev().flatten().next()
    }

    fn issue(&mut self, stage: usize, key: RequestKey) -> ImageRequest {
        let cancel = CancelHandle::new();
        self.stages[stage] = StageState::InFlight(key);
        self.pending_loads.insert(key, cancel.clone());
        ImageRequest {
            key,
            item_id: self.item_id.clone(),
            stage_type: self.stage_types[stage],
            cancel,
        }
    }

    /// Signal every in-flight request and roll its stage back.
    fn cancel_all(&mut self) -> usize {
        let canceled = self.pending_loads.len();
        for (key, cancel) in self.pending_loads.drain() {
            cancel.cancel();
            if self.stages.get(key.stage) == Some(&StageState::InFlight(key)) {
                self.stages[key.stage] = StageState::Pending;
            }
        }
        canceled
    }

    fn retry_failed(&mut self) {
        for stage in &mut self.stages {
            if *stage == StageState::Failed {
                *stage = StageState::Pending;
            }
        }
    }
}

/// Outcome of feeding a completion back into the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Loaded { card: CardId, state: CardState },
    /// Resource error; the stage is retryable after re-entry.
    Failed { card: CardId, message: String },
    /// Canceled request settled; already rolled back.
    Canceled { card: CardId },
    /// No pending load with this key (canceled earlier or unknown).
    Stale,
}

#[derive(Debug, Clone)]
pub struct PosterScheduler {
    delays: Vec<Duration>,
    timers: HashMap<CardId, Instant>,
    in_view: HashSet<CardId>,
    next_seq: u64,
}

impl Default for PosterScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_STAGE_DELAYS.to_vec())
    }
}

impl PosterScheduler {
    pub fn new(delays: Vec<Duration>) -> Self {
        let delays = if delays.is_empty() {
            DEFAULT_STAGE_DELAYS.to_vec()
        } else {
            delays
        };
        Self {
            delays,
            timers: HashMap::new(),
            in_view: HashSet::new(),
            next_seq: 0,
        }
    }

    /// Delay before requesting with `requested` stages already out.
    pub fn delay_for(&self, requested: usize) -> Duration {
        self.delays[requested.min(self.delays.len() - 1)]
    }

    pub fn is_in_view(&self, card: CardId) -> bool {
        self.in_view.contains(&card)
    }

    pub fn has_timer(&self, card: CardId) -> bool {
        self.timers.contains_key(&card)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().min().copied()
    }

    /// The card became visible.
    pub fn enter_view(&mut self, card: CardId, loader: &mut StagedLoader, now: Instant) {
        self.in_view.insert(card);
        loader.retry_failed();
        self.schedule(card, loader, now);
    }

    /// The card left the view: drop its timer and cancel in-flight requests.
    /// Returns the number of requests canceled.
    pub fn leave_view(&mut self, card: CardId, loader: &mut StagedLoader) -> usize {
        self.in_view.remove(&card);
        self.timers.remove(&card);
        let canceled = loader.cancel_all();
        if canceled > 0 {
            tracing::debug!(card, canceled, "image loads stopped");
        }
        canceled
    }

    fn schedule(&mut self, card: CardId, loader: &StagedLoader, now: Instant) {
        if self.timers.contains_key(&card) || loader.next_stage().is_none() {
            return;
        }
        let due = now + self.delay_for(loader.image_type_index());
        self.timers.insert(card, due);
    }

    /// Remove and return the cards whose timers are due, earliest first.
    pub fn due(&mut self, now: Instant) -> Vec<CardId> {
        let mut due: Vec<(Instant, CardId)> = self
            .timers
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(card, at)| (*at, *card))
            .collect();
        due.sort();
        for (_, card) in &due {
            self.timers.remove(card);
        }
        due.into_iter().map(|(_, card)| card).collect()
    }

    /// Issue the next stage of a card whose timer fired, then schedule the
    /// following stage if any remain.
    pub fn fire(&mut self, card: CardId, loader: &mut StagedLoader, now: Instant) -> Option<ImageRequest> {
        if !self.in_view.contains(&card) {
            return None;
        }
        let stage = loader.next_stage()?;
        let key = RequestKey {
            card,
            stage,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        let request = loader.issue(stage, key);
        tracing::debug!(card, stage, stage_type = request.stage_type, "image stage requested");
        self.schedule(card, loader, now);
        Some(request)
    }

    /// Feed a settled request back.
    pub fn complete(
        &mut self,
        loader: &mut StagedLoader,
        key: RequestKey,
        result: std::result::Result<ImageHandle, FetchError>,
    ) -> Completion {
        let Some(cancel) = loader.pending_loads.remove(&key) else {
            return Completion::Stale;
        };
        let card = key.card;
        if cancel.is_canceled() {
            loader.stages[key.stage] = StageState::Pending;
            return Completion::Canceled { card };
        }
        match result {
            Ok(image) => {
                loader.stages[key.stage] = StageState::Done;
                loader.images[key.stage] = Some(image);
                Completion::Loaded {
                    card,
                    state: loader.state(),
                }
            }
            Err(FetchError::Stopped) => {
                loader.stages[key.stage] = StageState::Pending;
                Completion::Canceled { card }
            }
            Err(FetchError::Failed(message)) => {
                loader.stages[key.stage] = StageState::Failed;
                Completion::Failed { card, message }
            }
        }
    }

    /// Forget all timers and visibility.
    pub fn reset(&mut self) {
        self.timers.clear();
        self.in_view.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: CardId = 0;

    fn image(stage_type: u32) -> ImageHandle {
        ImageHandle {
            item: "movie".into(),
            stage_type,
            location: None,
            byte_len: 1,
        }
    }

    fn setup() -> (PosterScheduler, StagedLoader, Instant) {
        (
            PosterScheduler::default(),
            StagedLoader::new("movie", &[1, 3]),
            Instant::now(),
        )
    }

    #[test]
    fn first_stage_waits_for_first_delay() {
        let (mut sched, mut loader, t0) = setup();
        sched.enter_view(CARD, &mut loader, t0);
        assert!(sched.due(t0 + Duration::from_millis(1499)).is_empty());
        assert_eq!(sched.due(t0 + Duration::from_millis(1500)), vec![CARD]);
    }

    #[test]
    fn stages_request_in_order_with_growing_delay() {
        let (mut sched, mut loader, t0) = setup();
        sched.enter_view(CARD, &mut loader, t0);

        let t1 = t0 + Duration::from_millis(1500);
        sched.due(t1);
        let first = sched.fire(CARD, &mut loader, t1).unwrap();
        assert_eq!(first.stage_type, 1);
        assert_eq!(loader.image_type_index(), 1);
        assert_eq!(loader.state(), CardState::Loading);

        assert!(sched.due(t1 + Duration::from_millis(2499)).is_empty());
        let t2 = t1 + Duration::from_millis(2500);
        assert_eq!(sched.due(t2), vec![CARD]);
        let second = sched.fire(CARD, &mut loader, t2).unwrap();
        assert_eq!(second.stage_type, 3);
        assert!(!sched.has_timer(CARD));
    }

    #[test]
    fn exhausted_after_two_completions() {
        let (mut sched, mut loader, t0) = setup();
        sched.enter_view(CARD, &mut loader, t0);
        let t1 = t0 + Duration::from_secs(2);
        sched.due(t1);
        let a = sched.fire(CARD, &mut loader, t1).unwrap();
        let t2 = t1 + Duration::from_secs(3);
        sched.due(t2);
        let b = sched.fire(CARD, &mut loader, t2).unwrap();

        assert_eq!(
            sched.complete(&mut loader, a.key, Ok(image(1))),
            Completion::Loaded { card: CARD, state: CardState::Loading }
        );
        assert_eq!(
            sched.complete(&mut loader, b.key, Ok(image(3))),
            Completion::Loaded { card: CARD, state: CardState::Exhausted }
        );
        assert_eq!(loader.best_image().unwrap().stage_type, 3);

        sched.leave_view(CARD, &mut loader);
        sched.enter_view(CARD, &mut loader, t2);
        assert!(!sched.has_timer(CARD));
        assert!(sched.fire(CARD, &mut loader, t2 + Duration::from_secs(60)).is_none());
    }

    #[test]
    fn leaving_view_cancels_timer() {
        let (mut sched, mut loader, t0) = setup();
        sched.enter_view(CARD, &mut loader, t0);
        sched.leave_view(CARD, &mut loader);
        assert!(sched.due(t0 + Duration::from_secs(10)).is_empty());
        assert_eq!(loader.state(), CardState::Idle);
    }

    #[test]
    fn cancellation_rolls_back_stage() {
        let (mut sched, mut loader, t0) = setup();
        sched.enter_view(CARD, &mut loader, t0);
        let t1 = t0 + Duration::from_millis(1500);
        sched.due(t1);
        let req = sched.fire(CARD, &mut loader, t1).unwrap();

        assert_eq!(sched.leave_view(CARD, &mut loader), 1);
        assert!(req.cancel.is_canceled());
        assert_eq!(loader.image_type_index(), 0);
        assert_eq!(loader.pending_loads(), 0);

        // The canceled fetch settling later is ignored.
        assert_eq!(sched.complete(&mut loader, req.key, Ok(image(1))), Completion::Stale);

        sched.enter_view(CARD, &mut loader, t1);
        let t2 = t1 + Duration::from_millis(1500);
        assert_eq!(sched.due(t2), vec![CARD]);
        let retry = sched.fire(CARD, &mut loader, t2).unwrap();
        assert_eq!(retry.key.stage, 0);
        assert_ne!(retry.key.seq, req.key.seq);
    }

    #[test]
    fn repeated_enter_does_not_stack_timers() {
        let (mut sched, mut loader, t0) = setup();
        sched.enter_view(CARD, &mut loader, t0);
        sched.enter_view(CARD, &mut loader, t0 + Duration::from_millis(1000));
        assert_eq!(sched.due(t0 + Duration::from_millis(1500)), vec![CARD]);
        assert!(sched.due(t0 + Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn failure_is_retryable_after_reentry() {
        let (mut sched, mut loader, t0) = setup();
        sched.enter_view(CARD, &mut loader, t0);
        let t1 = t0 + Duration::from_millis(1500);
        sched.due(t1);
        let req = sched.fire(CARD, &mut loader, t1).unwrap();

        let outcome = sched.complete(&mut loader, req.key, Err(FetchError::Failed("boom".into())));
        assert_eq!(outcome, Completion::Failed { card: CARD, message: "boom".into() });
        assert_eq!(loader.stages()[0], StageState::Failed);

        // The second stage is still scheduled; the failed one waits for re-entry.
        let t2 = t1 + Duration::from_millis(2500);
        sched.due(t2);
        let next = sched.fire(CARD, &mut loader, t2).unwrap();
        assert_eq!(next.key.stage, 1);

        sched.leave_view(CARD, &mut loader);
        sched.enter_view(CARD, &mut loader, t2);
        assert_eq!(loader.next_stage(), Some(0));
        assert!(sched.has_timer(CARD));
    }

    #[test]
    fn stopped_result_rolls_back() {
        let (mut sched, mut loader, t0) = setup();
        sched.enter_view(CARD, &mut loader, t0);
        let t1 = t0 + Duration::from_millis(1500);
        sched.due(t1);
        let req = sched.fire(CARD, &mut loader, t1).unwrap();
        assert_eq!(
            sched.complete(&mut loader, req.key, Err(FetchError::Stopped)),
            Completion::Canceled { card: CARD }
        );
        assert_eq!(loader.next_stage(), Some(0));
    }

    #[test]
    fn last_delay_repeats() {
        let sched = PosterScheduler::default();
        assert_eq!(sched.delay_for(0), Duration::from_millis(1500));
        assert_eq!(sched.delay_for(2), Duration::from_millis(4000));
        assert_eq!(sched.delay_for(7), Duration::from_millis(4000));
    }
}
