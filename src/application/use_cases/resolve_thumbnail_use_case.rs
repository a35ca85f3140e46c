//! Resolve use case: raw media reference in, image or placeholder out.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::application::services::{DriveOutcome, FetchController, build_chain};
use crate::domain::entities::{
    CandidateChain, ImageSource, QualityLevel, ResolvedImage, ThumbnailView,
};
use crate::domain::errors::TransitionError;
use crate::domain::resolution::{ExhaustReason, ResolutionAttempt, ResolutionState};

/// Terminal result delivered to the caller's callback.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// An image was bound.
    Resolved(ResolvedImage),
    /// No image; `attempt` can be handed to [`ThumbnailResolver::retry`].
    Exhausted {
        /// Why resolution failed.
        reason: ExhaustReason,
        /// The finished attempt.
        attempt: ResolutionAttempt,
    },
}

impl Resolution {
    fn from_attempt(attempt: ResolutionAttempt) -> Self {
        let reason = match attempt.state() {
            ResolutionState::Succeeded(resolved) => return Self::Resolved(resolved.clone()),
            ResolutionState::Exhausted(reason) => *reason,
            _ => ExhaustReason::ChainExhausted,
        };
        Self::Exhausted { reason, attempt }
    }

    /// What the display slot should show.
    #[must_use]
    pub fn view(&self) -> ThumbnailView {
        match self {
            Self::Resolved(resolved) => ThumbnailView::Image(resolved.image.clone()),
            Self::Exhausted { .. } => ThumbnailView::Failed,
        }
    }

    /// Returns the bound image, if any.
    #[must_use]
    pub const fn image(&self) -> Option<&ResolvedImage> {
        match self {
            Self::Resolved(resolved) => Some(resolved),
            Self::Exhausted { .. } => None,
        }
    }
}

/// Immediate answer of [`ThumbnailResolver::resolve`].
#[derive(Debug)]
pub enum Resolve {
    /// Memory cache hit on the first candidate; the callback is not invoked.
    Ready(ResolvedImage),
    /// Resolution continues in the background; the callback fires once at a
    /// terminal state unless the handle is cancelled first.
    Pending(ResolutionHandle),
}

impl Resolve {
    /// What the display slot should show right now.
    #[must_use]
    pub fn view(&self) -> ThumbnailView {
        match self {
            Self::Ready(resolved) => ThumbnailView::Image(resolved.image.clone()),
            Self::Pending(_) => ThumbnailView::Loading,
        }
    }
}

/// Handle to a background resolution.
#[derive(Debug)]
pub struct ResolutionHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ResolutionHandle {
    /// Supersedes the request. Fetches already in flight finish and are
    /// cached, but no further candidates are tried and the callback is dropped.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true once the background task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits for the background task to end.
    pub async fn join(self) {
        if let Some(task) = self.task {
            let _ = task.await;
        }
    }
}

/// The entry point presentation code depends on.
///
/// Background work runs on the runtime captured at construction, or on the
/// caller's runtime when none was captured.
#[derive(Debug, Clone)]
pub struct ThumbnailResolver {
    controller: Arc<FetchController>,
    runtime: Option<Handle>,
}

impl ThumbnailResolver {
    /// Creates a resolver over a controller, capturing the current runtime if any.
    #[must_use]
    pub fn new(controller: Arc<FetchController>) -> Self {
        Self {
            controller,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Creates a resolver that schedules background work on `runtime`.
    #[must_use]
    pub const fn with_runtime(controller: Arc<FetchController>, runtime: Handle) -> Self {
        Self {
            controller,
            runtime: Some(runtime),
        }
    }

    /// The underlying controller.
    #[must_use]
    pub const fn controller(&self) -> &Arc<FetchController> {
        &self.controller
    }

    /// Candidate chain that would be walked for `raw`.
    #[must_use]
    pub fn chain(&self, raw: &str, quality: QualityLevel) -> CandidateChain {
        build_chain(raw, quality)
    }

    /// Memory cache lookup of the first candidate, without touching I/O.
    #[must_use]
    pub fn cached(&self, raw: &str, quality: QualityLevel) -> Option<ResolvedImage> {
        self.memory_hit(&build_chain(raw, quality))
    }

    fn memory_hit(&self, chain: &CandidateChain) -> Option<ResolvedImage> {
        let first = chain.first()?;
        let image = self.controller.memory_cache().get(first.url())?;
        trace!(url = %first.url(), "Resolved synchronously from memory");
        Some(ResolvedImage::new(first.url(), image, ImageSource::MemoryCache))
    }

    /// Resolves `raw`, returning synchronously on a memory hit and otherwise
    /// driving the candidate chain in the background.
    ///
    /// Without a runtime to drive it, the callback receives `Exhausted` at once.
    pub fn resolve<F>(&self, raw: &str, quality: QualityLevel, on_result: F) -> Resolve
    where
        F: FnOnce(Resolution) + Send + 'static,
    {
        let chain = build_chain(raw, quality);
        if let Some(resolved) = self.memory_hit(&chain) {
            return Resolve::Ready(resolved);
        }

        debug!(reference = %raw.trim(), candidates = chain.len(), "Resolving thumbnail");
        Resolve::Pending(self.spawn(ResolutionAttempt::new(chain), on_result))
    }

    /// Manual retry of an exhausted attempt, restarting at its first candidate.
    ///
    /// # Errors
    /// Returns error if the attempt did not exhaust its chain or was already retried.
    pub fn retry<F>(
        &self,
        mut attempt: ResolutionAttempt,
        on_result: F,
    ) -> Result<ResolutionHandle, TransitionError>
    where
        F: FnOnce(Resolution) + Send + 'static,
    {
        attempt.retry()?;
        debug!(candidates = attempt.chain().len(), "Manual retry");
        Ok(self.spawn(attempt, on_result))
    }

    /// Resolves `raw` on the current task and waits for the terminal state.
    pub async fn resolve_now(&self, raw: &str, quality: QualityLevel) -> Resolution {
        if let Some(resolved) = self.cached(raw, quality) {
            return Resolution::Resolved(resolved);
        }
        let mut attempt = ResolutionAttempt::new(build_chain(raw, quality));
        self.controller
            .drive(&mut attempt, &CancellationToken::new())
            .await;
        Resolution::from_attempt(attempt)
    }

    fn spawn<F>(&self, mut attempt: ResolutionAttempt, on_result: F) -> ResolutionHandle
    where
        F: FnOnce(Resolution) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let Some(runtime) = self
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
        else {
            warn!("No async runtime available, giving up on thumbnail");
            let reason = match attempt.state() {
                ResolutionState::Exhausted(reason) => *reason,
                _ => ExhaustReason::ChainExhausted,
            };
            on_result(Resolution::Exhausted { reason, attempt });
            return ResolutionHandle { cancel, task: None };
        };

        let controller = Arc::clone(&self.controller);
        let token = cancel.clone();
        let task = runtime.spawn(async move {
            match controller.drive(&mut attempt, &token).await {
                DriveOutcome::Finished => on_result(Resolution::from_attempt(attempt)),
                DriveOutcome::Superseded => {
                    debug!(attempts = attempt.attempts(), "Resolution superseded");
                }
            }
        });

        ResolutionHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// One display position. Showing a new reference supersedes the previous one.
#[derive(Debug)]
pub struct ThumbnailSlot {
    resolver: ThumbnailResolver,
    current: Option<ResolutionHandle>,
    reference: Option<String>,
}

impl ThumbnailSlot {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new(resolver: ThumbnailResolver) -> Self {
        Self {
            resolver,
            current: None,
            reference: None,
        }
    }

    /// Reference currently shown.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Shows `raw`, cancelling whatever the slot was resolving before.
    pub fn show<F>(&mut self, raw: &str, quality: QualityLevel, on_result: F) -> ThumbnailView
    where
        F: FnOnce(Resolution) + Send + 'static,
    {
        self.supersede();
        self.reference = Some(raw.trim().to_string());
        match self.resolver.resolve(raw, quality, on_result) {
            Resolve::Ready(resolved) => ThumbnailView::Image(resolved.image),
            Resolve::Pending(handle) => {
                self.current = Some(handle);
                ThumbnailView::Loading
            }
        }
    }

    /// Empties the slot, cancelling any pending resolution.
    pub fn clear(&mut self) {
        self.supersede();
        self.reference = None;
    }

    fn supersede(&mut self) {
        if let Some(handle) = self.current.take()
            && !handle.is_finished()
        {
            handle.cancel();
        }
    }
}

impl Drop for ThumbnailSlot {
    fn drop(&mut self) {
        self.supersede();
    }
}
