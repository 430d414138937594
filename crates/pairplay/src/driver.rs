//! Async driver: pumps user intents and transport events through one
//! [`Coordinator`] and carries out the actions it returns.
//!
//! The driver is an actor. A [`DriverHandle`] sends requests over an mpsc
//! channel and reads [`SessionView`] snapshots from a watch channel; the
//! [`Driver`] task owns the coordinator and the transport.
//!
//! ```text
//! DriverHandle ──Request──→ Driver::run ──Action──→ PeerTransport
//!      ↑                      │    ↑                     │
//!      └──── SessionView ─────┘    └──TransportEvent─────┘
//! ```
//!
//! Transport negotiation runs concurrently with request handling, so
//! `leave` is served even while an offer or answer is still being
//! produced; leaving drops the negotiation in flight.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use pairplay_protocol::serialize;
use pairplay_session::{Intent, SessionError};
use pairplay_transport::{PeerTransport, TransportError, TransportEvent};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use crate::{Action, Coordinator, CoordinatorConfig, PairplayError, SessionView};

/// Capacity of the request channel.
const REQUEST_BUFFER: usize = 32;

/// A user intent, as sent to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Create,
    Join(String),
    SubmitAnswer(String),
    Leave,
    PlayMove(usize),
    RequestRematch,
    AcceptRematch,
    DeclineRematch,
    ResetGame,
    UpdateName(String),
}

struct Request {
    command: Command,
    reply: oneshot::Sender<Result<(), SessionError>>,
}

/// Outcome of a negotiation step that was running in the background.
enum Negotiation {
    Offer(Result<String, TransportError>),
    Answer(Result<String, TransportError>),
    Completed(Result<(), TransportError>),
}

type PendingNegotiation = Pin<Box<dyn Future<Output = Negotiation> + Send>>;

// ---------------------------------------------------------------------------
// DriverHandle
// ---------------------------------------------------------------------------

/// Cheap, cloneable front end to a running [`Driver`].
#[derive(Clone)]
pub struct DriverHandle {
    requests: mpsc::Sender<Request>,
    view: watch::Receiver<SessionView>,
}

impl DriverHandle {
    pub async fn create(&self) -> Result<(), PairplayError> {
        self.request(Command::Create).await
    }

    pub async fn join(&self, code: &str) -> Result<(), PairplayError> {
        self.request(Command::Join(code.to_string())).await
    }

    pub async fn submit_answer(&self, code: &str) -> Result<(), PairplayError> {
        self.request(Command::SubmitAnswer(code.to_string())).await
    }

    pub async fn leave(&self) -> Result<(), PairplayError> {
        self.request(Command::Leave).await
    }

    pub async fn play_move(&self, cell: usize) -> Result<(), PairplayError> {
        self.request(Command::PlayMove(cell)).await
    }

    pub async fn request_rematch(&self) -> Result<(), PairplayError> {
        self.request(Command::RequestRematch).await
    }

    pub async fn accept_rematch(&self) -> Result<(), PairplayError> {
        self.request(Command::AcceptRematch).await
    }

    pub async fn decline_rematch(&self) -> Result<(), PairplayError> {
        self.request(Command::DeclineRematch).await
    }

    pub async fn reset_game(&self) -> Result<(), PairplayError> {
        self.request(Command::ResetGame).await
    }

    pub async fn update_name(&self, name: &str) -> Result<(), PairplayError> {
        self.request(Command::UpdateName(name.to_string())).await
    }

    /// Returns the code to hand to the peer, once the transport has
    /// produced it.
    pub fn copy_code(&self) -> Result<String, PairplayError> {
        let view = self.view.borrow();
        if !view.phase.allows(Intent::CopyCode) {
            return Err(SessionError::IntentNotAllowed {
                intent: Intent::CopyCode,
                phase: view.phase,
            }
            .into());
        }
        view.session_code
            .clone()
            .ok_or(PairplayError::Session(SessionError::NoSession))
    }

    /// The latest published snapshot.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// A receiver that is notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Waits until a published snapshot satisfies `predicate`, and
    /// returns it.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SessionView) -> bool,
    ) -> Result<SessionView, PairplayError> {
        let mut view = self.view.clone();
        let found = view
            .wait_for(predicate)
            .await
            .map_err(|_| PairplayError::DriverStopped)?;
        Ok((*found).clone())
    }

    async fn request(&self, command: Command) -> Result<(), PairplayError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Request { command, reply })
            .await
            .map_err(|_| PairplayError::DriverStopped)?;
        response.await.map_err(|_| PairplayError::DriverStopped)??;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Owns a coordinator and the transport of its current session.
///
/// Each session gets a fresh transport from the factory, since a
/// transport carries exactly one negotiation.
pub struct Driver<T, F> {
    coordinator: Coordinator,
    new_transport: F,
    transport: Option<Arc<T>>,
    pending: Option<PendingNegotiation>,
    handshake_deadline: Option<Instant>,
    requests: mpsc::Receiver<Request>,
    view: watch::Sender<SessionView>,
}

/// Creates a driver and the handle that controls it.
///
/// `new_transport` is called once per hosted or joined session.
///
/// ```rust,no_run
/// use pairplay::prelude::*;
///
/// # async fn demo() {
/// let network = MemoryNetwork::new();
/// let (handle, driver) = pairplay::driver(CoordinatorConfig::new(), move || network.transport());
/// tokio::spawn(driver.run());
/// handle.create().await.unwrap();
/// # }
/// ```
pub fn driver<T, F>(config: CoordinatorConfig, new_transport: F) -> (DriverHandle, Driver<T, F>)
where
    T: PeerTransport,
    F: FnMut() -> T + Send + 'static,
{
    let coordinator = Coordinator::new(config);
    let (requests_tx, requests_rx) = mpsc::channel(REQUEST_BUFFER);
    let (view_tx, view_rx) = watch::channel(coordinator.view());
    let handle = DriverHandle {
        requests: requests_tx,
        view: view_rx,
    };
    let driver = Driver {
        coordinator,
        new_transport,
        transport: None,
        pending: None,
        handshake_deadline: None,
        requests: requests_rx,
        view: view_tx,
    };
    (handle, driver)
}

impl<T, F> Driver<T, F>
where
    T: PeerTransport,
    F: FnMut() -> T + Send + 'static,
{
    /// Runs until every [`DriverHandle`] has been dropped, then leaves any
    /// session still open.
    pub async fn run(mut self) {
        tracing::debug!("session driver started");
        loop {
            let transport = self.transport.clone();
            tokio::select! {
                request = self.requests.recv() => {
                    let Some(Request { command, reply }) = request else {
                        break;
                    };
                    let result = match self.apply(command) {
                        Ok(actions) => {
                            self.execute(actions).await;
                            Ok(())
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "request refused");
                            Err(e)
                        }
                    };
                    // Reply only once the outcome is visible in the view.
                    self.publish();
                    let _ = reply.send(result);
                }
                outcome = negotiation(&mut self.pending) => {
                    self.pending = None;
                    let actions = match outcome {
                        Negotiation::Offer(Ok(offer)) => self.coordinator.on_offer_ready(&offer),
                        Negotiation::Answer(Ok(answer)) => self.coordinator.on_answer_ready(&answer),
                        Negotiation::Completed(Ok(())) => Vec::new(),
                        Negotiation::Offer(Err(e))
                        | Negotiation::Answer(Err(e))
                        | Negotiation::Completed(Err(e)) => {
                            self.coordinator.on_transport_failed(&e.to_string())
                        }
                    };
                    self.execute(actions).await;
                }
                event = next_event(transport.as_deref()) => {
                    let actions = match event {
                        Some(TransportEvent::Message(text)) => self.coordinator.on_message(&text),
                        Some(TransportEvent::StateChanged(state)) => {
                            tracing::debug!(%state, "channel state changed");
                            self.coordinator.on_channel_state(state)
                        }
                        None => {
                            self.transport = None;
                            self.coordinator.on_transport_failed("transport stopped")
                        }
                    };
                    self.execute(actions).await;
                }
                () = sleep_until(self.handshake_deadline) => {
                    self.handshake_deadline = None;
                    let actions = self.coordinator.on_handshake_timeout();
                    self.execute(actions).await;
                }
            }
            self.publish();
        }

        if let Ok(actions) = self.coordinator.leave() {
            self.execute(actions).await;
        }
        tracing::debug!("session driver stopped");
    }

    fn apply(&mut self, command: Command) -> Result<Vec<Action>, SessionError> {
        let coordinator = &mut self.coordinator;
        match command {
            Command::Create => coordinator.create(),
            Command::Join(code) => coordinator.join(&code),
            Command::SubmitAnswer(code) => coordinator.submit_answer(&code),
            Command::Leave => coordinator.leave(),
            Command::PlayMove(cell) => coordinator.play_move(cell),
            Command::RequestRematch => coordinator.request_rematch(),
            Command::AcceptRematch => coordinator.accept_rematch(),
            Command::DeclineRematch => coordinator.decline_rematch(),
            Command::ResetGame => coordinator.reset_game(),
            Command::UpdateName(name) => coordinator.update_name(&name),
        }
    }

    async fn execute(&mut self, actions: Vec<Action>) {
        let mut queue = VecDeque::from(actions);
        while let Some(action) = queue.pop_front() {
            match action {
                Action::InitiateConnection => {
                    let transport = self.fresh_transport();
                    self.pending = Some(Box::pin(async move {
                        Negotiation::Offer(transport.initiate().await)
                    }));
                }
                Action::AcceptConnection { offer } => {
                    let transport = self.fresh_transport();
                    self.pending = Some(Box::pin(async move {
                        Negotiation::Answer(transport.accept(&offer).await)
                    }));
                }
                Action::CompleteConnection { answer } => match self.transport.clone() {
                    Some(transport) => {
                        self.pending = Some(Box::pin(async move {
                            Negotiation::Completed(transport.complete(&answer).await)
                        }));
                    }
                    None => {
                        queue.extend(self.coordinator.on_transport_failed("no transport to complete"));
                    }
                },
                Action::Send(message) => {
                    let Some(transport) = &self.transport else {
                        tracing::debug!(kind = %message.kind(), "no transport, message dropped");
                        continue;
                    };
                    let text = match serialize(&message) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to encode outbound message");
                            continue;
                        }
                    };
                    tracing::trace!(%text, "sending");
                    if let Err(e) = transport.send(&text).await {
                        tracing::warn!(kind = %message.kind(), error = %e, "send failed");
                    }
                }
                Action::CloseTransport => {
                    self.pending = None;
                    if let Some(transport) = self.transport.take() {
                        if let Err(e) = transport.close().await {
                            tracing::debug!(error = %e, "close failed");
                        }
                    }
                }
            }
        }
        self.rearm_handshake_timer();
    }

    /// Replaces the transport with a new one from the factory.
    fn fresh_transport(&mut self) -> Arc<T> {
        self.pending = None;
        let transport = Arc::new((self.new_transport)());
        self.transport = Some(Arc::clone(&transport));
        transport
    }

    fn rearm_handshake_timer(&mut self) {
        if !self.coordinator.awaiting_handshake() {
            self.handshake_deadline = None;
        } else if self.handshake_deadline.is_none() {
            let timeout = self.coordinator.config().handshake_timeout;
            self.handshake_deadline = Some(Instant::now() + timeout);
        }
    }

    fn publish(&self) {
        let view = self.coordinator.view();
        self.view.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
    }
}

async fn negotiation(pending: &mut Option<PendingNegotiation>) -> Negotiation {
    match pending {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}

async fn next_event<T: PeerTransport>(transport: Option<&T>) -> Option<TransportEvent> {
    match transport {
        Some(transport) => transport.next_event().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
