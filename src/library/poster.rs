//! Poster grid presentation: one card per item, one card per show.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Result, ViewError};
use crate::host::{ErrorSink, FetchError, ImageHandle};
use crate::library::episodes::group_seasons;
use crate::library::presentation::{Activation, Presentation, PresentationCore};
use crate::library::scheduler::{
    CardId, Completion, ImageRequest, PosterScheduler, RequestKey, StagedLoader, DEFAULT_STAGE_DELAYS,
};
use crate::library::surface::NodeId;
use crate::library::viewport::{Transition, ViewportTracker};
use crate::model::{Item, ItemId};

/// Delay before the backdrop of a highlighted episode is requested.
pub const DEFAULT_BACKDROP_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_BACKDROP_TYPE: u32 = 2;

/// Card id carried by backdrop requests. Never a grid index.
pub const BACKDROP_CARD: CardId = CardId::MAX;

/// Stage timing and image types used by poster cards.
#[derive(Debug, Clone, PartialEq)]
pub struct PosterConfig {
    pub stage_delays: Vec<Duration>,
    pub stage_types: Vec<u32>,
    pub series_stage_types: Vec<u32>,
    pub backdrop_delay: Duration,
    pub backdrop_type: u32,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            stage_delays: DEFAULT_STAGE_DELAYS.to_vec(),
            stage_types: vec![1, 3],
            series_stage_types: vec![0],
            backdrop_delay: DEFAULT_BACKDROP_DELAY,
            backdrop_type: DEFAULT_BACKDROP_TYPE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PosterCard {
    pub node: NodeId,
    /// The item the artwork is fetched for. For a series, its first episode.
    pub item: Arc<Item>,
    pub title: String,
    pub badge: Option<String>,
    /// Every episode of the show, in snapshot order. `None` for plain cards.
    pub siblings: Option<Vec<Arc<Item>>>,
    pub loader: StagedLoader,
}

impl PosterCard {
    pub fn is_series(&self) -> bool {
        self.siblings.is_some()
    }
}

pub struct PosterPresentation {
    core: PresentationCore,
    config: PosterConfig,
    cards: Vec<PosterCard>,
    by_node: HashMap<NodeId, CardId>,
    series: HashMap<String, CardId>,
    scheduler: PosterScheduler,
    viewport: ViewportTracker,
    /// Single-stage loader for the episode highlighted in a season listing.
    backdrop: Option<StagedLoader>,
    backdrops: PosterScheduler,
}

impl PosterPresentation {
    pub fn new(errors: Arc<dyn ErrorSink>, config: PosterConfig) -> Self {
        Self {
            core: PresentationCore::new(errors),
            scheduler: PosterScheduler::new(config.stage_delays.clone()),
            backdrops: PosterScheduler::new(vec![config.backdrop_delay]),
            backdrop: None,
            config,
            cards: Vec::new(),
            by_node: HashMap::new(),
            series: HashMap::new(),
            viewport: ViewportTracker::new(),
        }
    }

    pub fn cards(&self) -> &[PosterCard] {
        &self.cards
    }

    pub fn card_for(&self, node: NodeId) -> Option<&PosterCard> {
        self.by_node.get(&node).map(|&card| &self.cards[card])
    }

    pub fn scheduler(&self) -> &PosterScheduler {
        &self.scheduler
    }

    /// Top-level cards in canvas order.
    pub fn grid(&self) -> Vec<&PosterCard> {
        self.core
            .surface
            .roots()
            .iter()
            .filter_map(|node| self.card_for(*node))
            .collect()
    }

    fn push_card(&mut self, card: PosterCard) -> CardId {
        let id = self.cards.len();
        self.by_node.insert(card.node, id);
        self.cards.push(card);
        id
    }

    /// Report the nodes currently on screen.
    pub fn update_viewport(&mut self, visible: impl IntoIterator<Item = NodeId>, now: Instant) {
        for transition in self.viewport.update(visible) {
            match transition {
                Transition::Entered(node) => self.set_visible(node, true, now),
                Transition::Left(node) => self.set_visible(node, false, now),
            }
        }
    }

    /// Visibility notification for a single card node.
    pub fn set_visible(&mut self, node: NodeId, visible: bool, now: Instant) {
        let Some(&card) = self.by_node.get(&node) else {
            return;
        };
        let loader = &mut self.cards[card].loader;
        if visible {
            self.scheduler.enter_view(card, loader, now);
        } else {
            self.scheduler.leave_view(card, loader);
        }
    }

    /// Highlight an episode of a season listing, or none.
    ///
    /// The episode's backdrop is requested once the backdrop delay passes.
    /// Moving the highlight cancels the pending timer and any in-flight
    /// backdrop request.
    pub fn hover_episode(&mut self, item: Option<&Arc<Item>>, now: Instant) {
        if let (Some(current), Some(item)) = (&self.backdrop, item) {
            if current.item_id() == &item.id {
                return;
            }
        }
        if let Some(mut previous) = self.backdrop.take() {
            self.backdrops.leave_view(BACKDROP_CARD, &mut previous);
        }
        if let Some(item) = item {
            let mut loader = StagedLoader::new(item.id.clone(), &[self.config.backdrop_type]);
            self.backdrops.enter_view(BACKDROP_CARD, &mut loader, now);
            self.backdrop = Some(loader);
        }
    }

    /// Loader of the highlighted episode's backdrop.
    pub fn backdrop(&self) -> Option<&StagedLoader> {
        self.backdrop.as_ref()
    }

    /// Run the selection callback for an episode picked from a series card.
    pub fn activate_episode(&mut self, item: &Arc<Item>) -> Activation {
        tracing::debug!(id = %item.id, "episode activated");
        self.core.activate_item(item)
    }

    /// Fire due timers and return the fetches to start.
    pub fn poll(&mut self, now: Instant) -> Vec<ImageRequest> {
        let mut requests = Vec::new();
        for card in self.scheduler.due(now) {
            let Some(target) = self.cards.get_mut(card) else {
                continue;
            };
            if let Some(request) = self.scheduler.fire(card, &mut target.loader, now) {
                requests.push(request);
            }
        }
        for card in self.backdrops.due(now) {
            let Some(loader) = self.backdrop.as_mut() else {
                continue;
            };
            if let Some(request) = self.backdrops.fire(card, loader, now) {
                requests.push(request);
            }
        }
        requests
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        [self.scheduler.next_deadline(), self.backdrops.next_deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    /// Feed a settled fetch back. Failures are reported to the error sink.
    pub fn complete(
        &mut self,
        key: RequestKey,
        result: std::result::Result<ImageHandle, FetchError>,
    ) -> Completion {
        let (outcome, item_id) = if key.card == BACKDROP_CARD {
            let Some(loader) = self.backdrop.as_mut() else {
                return Completion::Stale;
            };
            let outcome = self.backdrops.complete(loader, key, result);
            (outcome, loader.item_id().clone())
        } else {
            let Some(card) = self.cards.get_mut(key.card) else {
                return Completion::Stale;
            };
            let outcome = self.scheduler.complete(&mut card.loader, key, result);
            (outcome, card.item.id.clone())
        };
        if let Completion::Failed { message, .. } = &outcome {
            let err = ViewError::ImageFetch(format!("{}: {}", item_id, message));
            self.core.report(&err);
        }
        outcome
    }
}

impl Presentation for PosterPresentation {
    fn core(&self) -> &PresentationCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PresentationCore {
        &mut self.core
    }

    fn add_item_node(&mut self, id: &ItemId, item: &Arc<Item>) -> Result<Option<NodeId>> {
        if let Some(show) = item.show() {
            if let Some(&card) = self.series.get(show) {
                if let Some(siblings) = self.cards[card].siblings.as_mut() {
                    siblings.push(item.clone());
                }
                return Ok(None);
            }
            let node = self.core.surface.create_leaf(item.clone(), show);
            let card = self.push_card(PosterCard {
                node,
                item: item.clone(),
                title: show.to_string(),
                badge: None,
                siblings: Some(vec![item.clone()]),
                loader: StagedLoader::new(id.clone(), &self.config.series_stage_types),
            });
            self.series.insert(show.to_string(), card);
            return Ok(Some(node));
        }

        let badge = item.media_type().map(str::to_string);
        let node = self
            .core
            .surface
            .create_leaf(item.clone(), item.display_name.clone());
        self.core.surface.node_mut(node).tag = badge.clone();
        self.push_card(PosterCard {
            node,
            item: item.clone(),
            title: item.display_name.clone(),
            badge,
            siblings: None,
            loader: StagedLoader::new(id.clone(), &self.config.stage_types),
        });
        Ok(Some(node))
    }

    fn activate(&mut self, node: NodeId) -> Activation {
        let Some(card) = self.card_for(node) else {
            return Activation::None;
        };
        if let Some(siblings) = &card.siblings {
            return Activation::Series {
                show: card.title.clone(),
                seasons: group_seasons(siblings),
            };
        }
        self.core.activate_leaf(node)
    }

    fn reset(&mut self) {
        for (id, card) in self.cards.iter_mut().enumerate() {
            self.scheduler.leave_view(id, &mut card.loader);
        }
        self.cards.clear();
        self.by_node.clear();
        self.series.clear();
        self.scheduler.reset();
        self.viewport.reset();
        if let Some(mut loader) = self.backdrop.take() {
            self.backdrops.leave_view(BACKDROP_CARD, &mut loader);
        }
        self.backdrops.reset();
    }
}
