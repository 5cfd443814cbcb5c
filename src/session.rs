//! Interactive session: the single owner of mutable selection state.
//!
//! A [`Session`] ties the core together for one image at a time. It owns the
//! base image, the current region collection, the selection, and the latest
//! composite frame. Every mutation that changes what should be on screen
//! re-composites immediately, so [`Session::frame`] is always current.
//!
//! Background work (model-based production, blinking) runs on its own
//! threads and only reaches the session through channels that the caller
//! drains with [`Session::poll`] and [`Session::poll_blink_frames`].

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::blink::{BlinkMessage, BlinkSynchronizer, SyncError, SyncState, TimelineEvent};
use crate::compositor::{CompositeFrame, CompositeOptions, render};
use crate::config::AppConfig;
use crate::data::RasterImage;
use crate::export::{self, ExportError, ExportSummary};
use crate::model::{Region, RegionCollection};
use crate::producer::{
    ProductionError, ProductionOutcome, ProductionWorker, RegionProducer, ThresholdProducer,
};
use crate::selection::SelectionSet;

/// Interactive state for one loaded image.
pub struct Session {
    image: Arc<RasterImage>,
    collection: Arc<RegionCollection>,
    selection: SelectionSet,
    options: CompositeOptions,
    frame: CompositeFrame,
    threshold: u8,
    color_seed: u64,
    /// Spawned on the first background request
    worker: Option<ProductionWorker>,
    blink: BlinkSynchronizer,
}

impl Session {
    /// Load `image` and produce its regions with the threshold producer.
    pub fn new(image: RasterImage, config: &AppConfig) -> Result<Self, ProductionError> {
        let producer = ThresholdProducer::new(config.segmentation.threshold)
            .with_color_seed(config.segmentation.color_seed);
        Self::with_producer(image, &producer, config)
    }

    /// Load `image` and produce its regions with `producer`, synchronously.
    pub fn with_producer(
        image: RasterImage,
        producer: &dyn RegionProducer,
        config: &AppConfig,
    ) -> Result<Self, ProductionError> {
        let collection = Arc::new(producer.produce(&image)?);
        let image = Arc::new(image);
        let options = config.composite_options();
        let frame = render(&image, &collection, &[], &options);

        log::info!(
            "Session opened on {}x{} image with {} region(s) from {}",
            image.width(),
            image.height(),
            collection.len(),
            producer.id()
        );
        Ok(Self {
            image,
            selection: SelectionSet::new(Arc::clone(&collection)),
            collection,
            options,
            frame,
            threshold: config.segmentation.threshold,
            color_seed: config.segmentation.color_seed,
            worker: None,
            blink: BlinkSynchronizer::new(config.poll_interval()),
        })
    }

    pub fn image(&self) -> &Arc<RasterImage> {
        &self.image
    }

    pub fn collection(&self) -> &Arc<RegionCollection> {
        &self.collection
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn options(&self) -> &CompositeOptions {
        &self.options
    }

    /// The active threshold for the threshold producer.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// The most recent composite.
    pub fn frame(&self) -> &CompositeFrame {
        &self.frame
    }

    /// Change the overlay weight and re-composite.
    pub fn set_alpha(&mut self, alpha: f32) {
        self.options = CompositeOptions::with_alpha(alpha);
        self.recomposite();
    }

    /// Replace the image and produce regions with the current threshold.
    pub fn load_image(&mut self, image: RasterImage) -> Result<(), ProductionError> {
        let producer = self.threshold_producer();
        self.load_image_with(image, &producer)
    }

    /// Replace the image and produce regions with `producer`.
    ///
    /// On failure the previous image, regions and selection are kept.
    pub fn load_image_with(
        &mut self,
        image: RasterImage,
        producer: &dyn RegionProducer,
    ) -> Result<(), ProductionError> {
        let collection = producer.produce(&image)?;
        log::info!(
            "Loaded {}x{} image with {} region(s) from {}",
            image.width(),
            image.height(),
            collection.len(),
            producer.id()
        );
        self.apply(Arc::new(image), Arc::new(collection));
        Ok(())
    }

    /// Re-run the threshold producer on the current image.
    pub fn set_threshold(&mut self, threshold: u8) -> Result<(), ProductionError> {
        let producer = ThresholdProducer::new(threshold).with_color_seed(self.color_seed);
        let collection = producer.produce(&self.image)?;
        self.threshold = threshold;
        log::debug!(
            "Threshold {} produced {} region(s)",
            threshold,
            collection.len()
        );
        let image = Arc::clone(&self.image);
        self.apply(image, Arc::new(collection));
        Ok(())
    }

    /// Produce regions for `image` on the background worker.
    ///
    /// The current image and regions stay in place until [`Session::poll`]
    /// applies the result. A newer request supersedes older ones.
    pub fn request_production(
        &mut self,
        image: RasterImage,
        producer: Arc<dyn RegionProducer>,
    ) -> Result<u64, ProductionError> {
        let worker = match self.worker.as_mut() {
            Some(worker) => worker,
            None => self.worker.insert(ProductionWorker::spawn()?),
        };
        worker.request(Arc::new(image), producer)
    }

    /// Whether a background request is still outstanding.
    pub fn production_pending(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| worker.pending_count() > 0)
    }

    /// Apply finished background results.
    ///
    /// Returns `Ok(true)` if the collection was replaced. Results from
    /// superseded requests are dropped. A failure of the latest request is
    /// returned as an error and leaves the session unchanged.
    pub fn poll(&mut self) -> Result<bool, ProductionError> {
        let mut replaced = false;
        while let Some(outcome) = self.worker.as_mut().and_then(|w| w.take_one_result()) {
            replaced |= self.handle_outcome(outcome)?;
        }
        Ok(replaced)
    }

    /// Block until the latest background request finishes or `timeout`
    /// elapses.
    pub fn wait_for_production(&mut self, timeout: Duration) -> Result<bool, ProductionError> {
        let deadline = web_time::Instant::now() + timeout;
        loop {
            let Some(worker) = self.worker.as_mut() else {
                return Ok(false);
            };
            if worker.pending_count() == 0 {
                return Ok(false);
            }
            let remaining = deadline.saturating_duration_since(web_time::Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            let latest = worker.latest_generation();
            let Some(outcome) = worker.wait_one_result(remaining) else {
                return Ok(false);
            };
            let is_latest = outcome.generation() == latest;
            let replaced = self.handle_outcome(outcome)?;
            if is_latest {
                return Ok(replaced);
            }
        }
    }

    fn handle_outcome(&mut self, outcome: ProductionOutcome) -> Result<bool, ProductionError> {
        let latest = self
            .worker
            .as_ref()
            .map_or(0, |worker| worker.latest_generation());
        if outcome.generation() != latest {
            log::debug!(
                "Dropping superseded production result {} (latest is {})",
                outcome.generation(),
                latest
            );
            return Ok(false);
        }

        match outcome {
            ProductionOutcome::Produced {
                image, collection, ..
            } => {
                log::info!(
                    "Background production finished with {} region(s)",
                    collection.len()
                );
                self.apply(image, collection);
                Ok(true)
            }
            ProductionOutcome::Failed { error, .. } => {
                log::warn!("Background production failed: {}", error);
                Err(error)
            }
        }
    }

    /// Swap in a new image and collection in one step; the selection is
    /// discarded.
    ///
    /// A running blink is bound to the old selection, so it is stopped and
    /// its undelivered frames are dropped.
    fn apply(&mut self, image: Arc<RasterImage>, collection: Arc<RegionCollection>) {
        if self.blink.is_running() {
            self.blink.stop();
            let stale = self.blink.drain().len();
            log::info!(
                "Regions replaced; stopped blink run and dropped {} pending message(s)",
                stale
            );
        }
        self.image = image;
        self.selection = SelectionSet::new(Arc::clone(&collection));
        self.collection = collection;
        self.recomposite();
    }

    /// Select the region under `(x, y)`, if any, and re-composite.
    pub fn toggle_at(&mut self, x: i64, y: i64) -> Option<Arc<Region>> {
        let added = self.selection.toggle_at(x, y)?;
        log::debug!(
            "Selected region {} at ({}, {}); {} selected",
            added.id(),
            x,
            y,
            self.selection.len()
        );
        self.recomposite();
        Some(added)
    }

    /// Empty the selection and re-composite.
    pub fn clear(&mut self) {
        self.selection.clear();
        self.recomposite();
    }

    /// Start over on the same regions: clears the selection without
    /// re-running production.
    pub fn renew(&mut self) {
        log::debug!("Renewing selection");
        self.clear();
    }

    /// Immutable copy of the current selection.
    pub fn selected(&self) -> Vec<Arc<Region>> {
        self.selection.snapshot()
    }

    fn recomposite(&mut self) {
        let selected = self.selection.snapshot();
        self.frame = render(&self.image, &self.collection, &selected, &self.options);
    }

    fn threshold_producer(&self) -> ThresholdProducer {
        ThresholdProducer::new(self.threshold).with_color_seed(self.color_seed)
    }

    /// Write the selection union as a PNG mask.
    pub fn export_png(&self, path: &Path) -> Result<ExportSummary, ExportError> {
        export::export_png(&self.selection.snapshot(), path)
    }

    /// Write the selection as SVG polygons.
    pub fn export_svg(&self, path: &Path) -> Result<ExportSummary, ExportError> {
        export::export_svg(&self.selection.snapshot(), path)
    }

    /// Start blinking the current selection on `events`.
    pub fn start_blink(&mut self, events: Receiver<TimelineEvent>) -> Result<(), SyncError> {
        self.blink.start(
            Arc::clone(&self.image),
            Arc::clone(&self.collection),
            self.selection.snapshot(),
            self.options,
            events,
        )
    }

    /// Cancel the running blink, if any.
    pub fn stop_blink(&mut self) {
        self.blink.stop();
    }

    pub fn blink_state(&self) -> SyncState {
        self.blink.state()
    }

    /// Take every blink message posted so far. Non-blocking.
    pub fn poll_blink_frames(&mut self) -> Vec<BlinkMessage> {
        self.blink.drain()
    }

    /// Wait up to `timeout` for the next blink message.
    pub fn wait_blink_message(&self, timeout: Duration) -> Option<BlinkMessage> {
        self.blink.recv_timeout(timeout)
    }
}
