//! Provider instances backing the renderer.
//!
//! Each provider owns one [`Store`]. The renderer never talks to a store
//! directly; it reads a snapshot through [`LifecycleSource`] and
//! [`OverlaySource`] once per render pass.
//!
//! Handlers handed to the render tree (`on_frame_loaded`, `on_dismiss`) only
//! enqueue an action. The host drains the queue with `process_events`, so a
//! handler fired by a retired instance lands in a closed channel and is
//! discarded.

use crate::callback::Callback;
use crate::config::FrameConfig;
use crate::error::FrameError;
use crate::lifecycle::{FrameEnvironment, IFrameAction, IFrameReducer, IFrameState, LifecycleState};
use crate::message::FrameMessage;
use crate::modal::{ModalAction, ModalReducer, ModalState, OverlayState};
use crate::request::{EmbedIdentity, EmbedRequest};
use std::future::Future;
use tokio::sync::mpsc;
use unit_frame_core::environment::{Clock, Viewport};
use unit_frame_runtime::Store;

/// Read access to lifecycle state for one render pass.
pub trait LifecycleSource {
    /// Current lifecycle snapshot.
    fn lifecycle_state(&self) -> impl Future<Output = LifecycleState> + Send;
}

/// Read access to overlay state for one render pass.
pub trait OverlaySource {
    /// Current overlay snapshot.
    fn overlay_state(&self) -> impl Future<Output = OverlayState> + Send;
}

type LifecycleStore<C, V> =
    Store<IFrameState, IFrameAction, FrameEnvironment<C, V>, IFrameReducer<C, V>>;

type ModalStore = Store<ModalState, ModalAction, (), ModalReducer>;

/// Queue of actions produced by handlers in the render tree.
struct HandlerQueue<A> {
    sender: mpsc::UnboundedSender<A>,
    receiver: mpsc::UnboundedReceiver<A>,
}

impl<A: Clone + Send + Sync + 'static> HandlerQueue<A> {
    fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    /// A handler that enqueues `action` every time it is called.
    fn handler(&self, action: A, name: &'static str) -> Callback {
        let sender = self.sender.clone();
        Callback::new(move || {
            if sender.send(action.clone()).is_err() {
                tracing::debug!(handler = name, "Handler fired on a retired provider");
            }
        })
    }

    fn drain(&mut self) -> Vec<A> {
        let mut actions = Vec::new();
        while let Ok(action) = self.receiver.try_recv() {
            actions.push(action);
        }
        actions
    }
}

/// One mount of the lifecycle provider.
///
/// Dropping the instance closes its store; anything still in flight for it
/// is rejected from then on.
struct FrameInstance<C, V>
where
    C: Clock + Clone + 'static,
    V: Viewport + 'static,
{
    store: LifecycleStore<C, V>,
    identity: EmbedIdentity,
    on_frame_loaded: Callback,
    queue: HandlerQueue<IFrameAction>,
}

impl<C, V> FrameInstance<C, V>
where
    C: Clock + Clone + 'static,
    V: Viewport + 'static,
{
    async fn mount(
        request: &EmbedRequest,
        config: &FrameConfig,
        env: FrameEnvironment<C, V>,
    ) -> Result<Self, FrameError> {
        let reducer = IFrameReducer::new().with_load_timeout(config.load_timeout());
        let store = Store::new(IFrameState::new(request, config.initial_height), reducer, env);
        let queue = HandlerQueue::new();
        let on_frame_loaded = queue.handler(IFrameAction::NativeLoad, "on_frame_loaded");

        // The timeout effect stays pending until it fires, so the handle is
        // not awaited here.
        store.send(IFrameAction::Mounted).await?;

        Ok(Self {
            store,
            identity: request.identity(),
            on_frame_loaded,
            queue,
        })
    }
}

impl<C, V> Drop for FrameInstance<C, V>
where
    C: Clock + Clone + 'static,
    V: Viewport + 'static,
{
    fn drop(&mut self) {
        self.store.close();
    }
}

/// Lifecycle provider for one embedded frame.
///
/// # Example
///
/// ```ignore
/// let mut behavior = IFrameBehavior::mount(&request, &config, env).await?;
/// behavior.handle_raw_message(r#"{"type":"plugin.resize","payload":{"height":480}}"#).await?;
/// assert!(behavior.lifecycle_state().await.has_loaded);
/// ```
pub struct IFrameBehavior<C, V>
where
    C: Clock + Clone + 'static,
    V: Viewport + 'static,
{
    config: FrameConfig,
    env: FrameEnvironment<C, V>,
    instance: FrameInstance<C, V>,
}

impl<C, V> IFrameBehavior<C, V>
where
    C: Clock + Clone + 'static,
    V: Viewport + 'static,
{
    /// Mount a provider for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Store`] if the freshly created store rejects the
    /// mount action.
    #[tracing::instrument(skip_all, fields(source_url = %request.source_url, correlation_id = %request.correlation_id))]
    pub async fn mount(
        request: &EmbedRequest,
        config: &FrameConfig,
        env: FrameEnvironment<C, V>,
    ) -> Result<Self, FrameError> {
        let instance = FrameInstance::mount(request, config, env.clone()).await?;
        Ok(Self {
            config: config.clone(),
            env,
            instance,
        })
    }

    /// Bring the provider in line with the latest request.
    ///
    /// A change of any identifying field discards the current state and
    /// mounts a fresh one. Returns whether a remount happened.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Store`] if the new store rejects the mount action.
    pub async fn sync(&mut self, request: &EmbedRequest) -> Result<bool, FrameError> {
        let identity = request.identity();
        if identity == self.instance.identity {
            return Ok(false);
        }

        tracing::info!(
            from = %self.instance.identity.source_url,
            to = %identity.source_url,
            correlation_id = %identity.correlation_id,
            "Embed identity changed, remounting"
        );
        let fresh = FrameInstance::mount(request, &self.config, self.env.clone()).await?;
        drop(std::mem::replace(&mut self.instance, fresh));
        Ok(true)
    }

    /// Apply a lifecycle message. Overlay and foreign messages are ignored.
    ///
    /// Returns once the effects the message started have finished.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Store`] if the store is closed.
    pub async fn handle_message(&self, message: &FrameMessage) -> Result<(), FrameError> {
        if let Some(action) = IFrameAction::from_message(message) {
            self.instance.store.send(action).await?.wait().await;
        }
        Ok(())
    }

    /// Parse and apply a raw cross-frame message.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MalformedMessage`] for a malformed message of a
    /// known type, or [`FrameError::Store`] if the store is closed.
    pub async fn handle_raw_message(&self, raw: &str) -> Result<(), FrameError> {
        let message = FrameMessage::parse(raw).inspect_err(|error| {
            tracing::warn!(%error, "Discarding malformed frame message");
        })?;
        self.handle_message(&message).await
    }

    /// Apply the actions queued by handlers in the render tree.
    ///
    /// Returns how many actions were applied.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Store`] if the store is closed.
    pub async fn process_events(&mut self) -> Result<usize, FrameError> {
        let actions = self.instance.queue.drain();
        let count = actions.len();
        for action in actions {
            self.instance.store.send(action).await?.wait().await;
        }
        Ok(count)
    }

    /// Handler for the primary frame's native load event.
    #[must_use]
    pub fn on_frame_loaded(&self) -> Callback {
        self.instance.on_frame_loaded.clone()
    }

    /// Identity of the current mount.
    #[must_use]
    pub const fn identity(&self) -> &EmbedIdentity {
        &self.instance.identity
    }

    /// Full state of the current mount.
    pub async fn state(&self) -> IFrameState {
        self.instance.store.state(IFrameState::clone).await
    }

    /// Tear the provider down, waiting for in-flight effects.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Store`] if effects are still running after the
    /// configured grace period. A pending load timeout is dropped, not waited
    /// for.
    pub async fn retire(self) -> Result<(), FrameError> {
        let timeout = self.config.shutdown_timeout();
        self.instance.store.shutdown(timeout).await?;
        Ok(())
    }
}

impl<C, V> LifecycleSource for IFrameBehavior<C, V>
where
    C: Clock + Clone + 'static,
    V: Viewport + 'static,
{
    async fn lifecycle_state(&self) -> LifecycleState {
        let on_frame_loaded = &self.instance.on_frame_loaded;
        self.instance
            .store
            .state(|state| state.snapshot(on_frame_loaded))
            .await
    }
}

/// Modal content provider.
pub struct ModalIFrameData {
    store: ModalStore,
    on_dismiss: Callback,
    queue: HandlerQueue<ModalAction>,
}

impl ModalIFrameData {
    /// Create a provider with the overlay closed.
    #[must_use]
    pub fn new() -> Self {
        let queue = HandlerQueue::new();
        let on_dismiss = queue.handler(ModalAction::Dismissed, "on_dismiss");
        Self {
            store: Store::new(ModalState::default(), ModalReducer, ()),
            on_dismiss,
            queue,
        }
    }

    /// Apply an overlay message. Returns whether the message was one.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Store`] if the store is closed.
    pub async fn handle_message(&self, message: &FrameMessage) -> Result<bool, FrameError> {
        match message {
            FrameMessage::Modal(request) => {
                self.store
                    .send(ModalAction::Requested(request.clone()))
                    .await?
                    .wait()
                    .await;
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    /// Parse and apply a raw cross-frame message.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MalformedMessage`] for a malformed message of a
    /// known type, or [`FrameError::Store`] if the store is closed.
    pub async fn handle_raw_message(&self, raw: &str) -> Result<bool, FrameError> {
        let message = FrameMessage::parse(raw).inspect_err(|error| {
            tracing::warn!(%error, "Discarding malformed frame message");
        })?;
        self.handle_message(&message).await
    }

    /// Close the overlay.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Store`] if the store is closed.
    pub async fn dismiss(&self) -> Result<(), FrameError> {
        self.store.send(ModalAction::Dismissed).await?.wait().await;
        Ok(())
    }

    /// Apply the dismissals queued by the overlay's dismiss control.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Store`] if the store is closed.
    pub async fn process_events(&mut self) -> Result<usize, FrameError> {
        let actions = self.queue.drain();
        let count = actions.len();
        for action in actions {
            self.store.send(action).await?.wait().await;
        }
        Ok(count)
    }

    /// Handler bound to the overlay's dismiss control.
    #[must_use]
    pub fn on_dismiss(&self) -> Callback {
        self.on_dismiss.clone()
    }
}

impl Default for ModalIFrameData {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ModalIFrameData {
    fn drop(&mut self) {
        self.store.close();
    }
}

impl OverlaySource for ModalIFrameData {
    async fn overlay_state(&self) -> OverlayState {
        let on_dismiss = &self.on_dismiss;
        self.store.state(|state| state.snapshot(on_dismiss)).await
    }
}

/// Route a raw cross-frame message to whichever provider handles it.
///
/// # Errors
///
/// Returns [`FrameError::MalformedMessage`] for a malformed message of a
/// known type, or [`FrameError::Store`] if a provider's store is closed.
pub async fn dispatch<C, V>(
    behavior: &IFrameBehavior<C, V>,
    modal: &ModalIFrameData,
    raw: &str,
) -> Result<(), FrameError>
where
    C: Clock + Clone + 'static,
    V: Viewport + 'static,
{
    let message = FrameMessage::parse(raw).inspect_err(|error| {
        tracing::warn!(%error, "Discarding malformed frame message");
    })?;

    if message.is_lifecycle() {
        behavior.handle_message(&message).await
    } else {
        modal.handle_message(&message).await.map(|_| ())
    }
}
