//! Split orchestrator: runs one engine invocation per planned segment,
//! strictly in order, with status, progress, and cancellation.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use vs_av::{trim_args, MediaEngine, ProgressSender};
use vs_core::events::{Event, EventBus, EventPayload};
use vs_core::{Container, Error, Result, RunId};

use crate::artifact::Artifact;
use crate::planner::{self, SegmentPlan};
use crate::request::{SourceVideo, SplitRequest};
use crate::run::SplitRun;
use crate::status::StatusSnapshot;

/// Drives a [`MediaEngine`] through a split.
///
/// The engine is shared and single-job, so only one run may be active at a
/// time; a second [`split`](Self::split) while one is underway fails with
/// [`Error::RunInProgress`] and leaves the active run alone. Requests made
/// before the engine finished loading are rejected with
/// [`Error::EngineNotReady`] rather than queued; await
/// [`load_engine`](Self::load_engine) first.
pub struct SplitOrchestrator {
    engine: Arc<dyn MediaEngine>,
    container: Container,
    source: RwLock<Option<Arc<SourceVideo>>>,
    run: Arc<RwLock<SplitRun>>,
    events: Arc<EventBus>,
    active: tokio::sync::Mutex<()>,
    cancellation: Mutex<CancellationToken>,
}

impl SplitOrchestrator {
    /// Create an orchestrator over `engine`, producing mp4 segments.
    pub fn new(engine: Arc<dyn MediaEngine>) -> Self {
        Self {
            engine,
            container: Container::default(),
            source: RwLock::new(None),
            run: Arc::new(RwLock::new(SplitRun::default())),
            events: Arc::new(EventBus::default()),
            active: tokio::sync::Mutex::new(()),
            cancellation: Mutex::new(CancellationToken::new()),
        }
    }

    /// Builder: set the output container.
    pub fn with_container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    /// Wait for the engine's one-time load.
    pub async fn load_engine(&self) -> Result<()> {
        self.engine.load().await?;
        tracing::info!("{} engine ready", self.engine.name());
        Ok(())
    }

    /// Select the video to split, replacing any previous one.
    pub fn select_source(&self, source: SourceVideo) {
        tracing::info!(
            "source selected: {} ({}s, {} bytes)",
            source.name(),
            source.duration_seconds(),
            source.data().len()
        );
        *self.source.write() = Some(Arc::new(source));
    }

    /// Forget the selected source.
    pub fn clear_source(&self) {
        *self.source.write() = None;
    }

    pub fn source(&self) -> Option<Arc<SourceVideo>> {
        self.source.read().clone()
    }

    /// Current status for polling observers.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot::from(&*self.run.read())
    }

    /// Segments of the last completed run, in order. Empty otherwise.
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.run.read().artifacts().to_vec()
    }

    /// Subscribe to run events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Ask the active run to stop before its next invocation. No effect when
    /// nothing is running.
    pub fn cancel(&self) {
        if self.run.read().status().is_active() {
            tracing::info!("split cancellation requested");
            self.cancellation.lock().cancel();
        }
    }

    /// Split the selected source into `request.slice_seconds()` clips.
    ///
    /// Returns the produced segments in plan order. On failure the run ends
    /// in `Error` with no visible artifacts and the error is returned; an
    /// invocation failure is reported as [`Error::SegmentFailed`] with the
    /// index of the failing segment.
    ///
    /// # Errors
    ///
    /// Checked before anything is touched, in this order:
    /// [`Error::RunInProgress`], [`Error::NoSourceLoaded`],
    /// [`Error::InvalidSliceLength`], [`Error::EngineNotReady`].
    pub async fn split(&self, request: &SplitRequest) -> Result<Vec<Artifact>> {
        let _active = self.active.try_lock().map_err(|_| Error::RunInProgress)?;

        let source = self.source().ok_or(Error::NoSourceLoaded)?;
        let slice = i64::try_from(request.slice_seconds())
            .map_err(|_| Error::InvalidSliceLength(format!("{} is too large", request.slice_seconds())))?;
        let plan = planner::plan(source.duration_seconds(), slice)?;

        if !self.engine.is_ready() {
            return Err(Error::EngineNotReady);
        }

        let run_id = RunId::new();
        let token = CancellationToken::new();
        *self.cancellation.lock() = token.clone();

        self.run.write().begin(run_id, plan.len())?;
        self.events.broadcast(EventPayload::RunStarted { run_id });
        tracing::info!(
            "split {run_id}: {} -> {} segment(s) of {}s",
            source.name(),
            plan.len(),
            plan.slice_seconds()
        );

        let staged = source.staged_name();
        let result = self.drive(run_id, &source, &staged, &plan, &token).await;
        if !plan.is_empty() {
            self.discard(&staged).await;
        }

        match result {
            Ok(artifacts) => {
                self.run.write().complete()?;
                self.events.broadcast(EventPayload::RunCompleted {
                    run_id,
                    artifacts: artifacts.iter().map(|a| a.name.clone()).collect(),
                });
                tracing::info!("split {run_id}: complete ({} segment(s))", artifacts.len());
                Ok(artifacts)
            }
            Err(Error::Cancelled) => {
                self.run.write().cancel()?;
                self.events.broadcast(EventPayload::RunCancelled { run_id });
                tracing::info!("split {run_id}: cancelled");
                Err(Error::Cancelled)
            }
            Err(e) => {
                let message = e.to_string();
                self.run.write().fail(message.clone())?;
                self.events.broadcast(EventPayload::RunFailed {
                    run_id,
                    error: message,
                });
                tracing::error!("split {run_id}: {e}");
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        run_id: RunId,
        source: &SourceVideo,
        staged: &str,
        plan: &SegmentPlan,
        token: &CancellationToken,
    ) -> Result<Vec<Artifact>> {
        // Nothing to cut from an empty source; skip staging it.
        if !plan.is_empty() {
            self.engine.write_input(staged, source.data().clone()).await?;
        }

        self.run.write().mark_processing()?;
        self.events.broadcast(EventPayload::RunProcessing {
            run_id,
            total_segments: plan.len(),
        });

        let mut artifacts = Vec::with_capacity(plan.len());
        for segment in plan {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let name = segment.output_name(self.container);
            self.run.write().start_segment();
            self.events.broadcast(EventPayload::SegmentStarted {
                run_id,
                index: segment.index,
                name: name.clone(),
            });
            tracing::info!(
                "segment {}/{}: {} [{}s, +{}s]",
                segment.number(),
                plan.len(),
                name,
                segment.start_second,
                segment.actual_length(plan.total_duration_seconds())
            );

            let args = trim_args(staged, segment.start_second, segment.length_second, &name);
            let progress = self.progress_sender(run_id, segment.index);

            if let Err(e) = self.engine.exec(&args, &progress).await {
                self.discard(&name).await;
                return Err(Error::segment(segment.index, e));
            }
            let data = match self.engine.read_output(&name).await {
                Ok(data) => data,
                Err(e) => {
                    self.discard(&name).await;
                    return Err(Error::segment(segment.index, e));
                }
            };
            self.discard(&name).await;

            let artifact = Artifact::new(segment.index, name, self.container, data);
            self.run.write().push_artifact(artifact.clone())?;
            self.events.broadcast(EventPayload::SegmentCompleted {
                run_id,
                index: artifact.index,
                name: artifact.name.clone(),
                size: artifact.size(),
            });
            artifacts.push(artifact);
        }

        Ok(artifacts)
    }

    /// Progress callback for one invocation: updates the run and publishes
    /// whole-percent changes.
    fn progress_sender(&self, run_id: RunId, index: usize) -> ProgressSender {
        let run = Arc::clone(&self.run);
        let events = Arc::clone(&self.events);
        ProgressSender::new(move |fraction| {
            let percent = (fraction * 100.0).round() as u8;
            if run.write().set_progress(percent) {
                events.broadcast(EventPayload::SegmentProgress {
                    run_id,
                    index,
                    percent,
                });
            }
        })
    }

    async fn discard(&self, name: &str) {
        if let Err(e) = self.engine.delete_file(name).await {
            tracing::warn!("failed to delete {name} from engine: {e}");
        }
    }
}
