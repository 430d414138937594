//! In-process transport: two peers in one process linked by channels.
//!
//! Offers and answers are real opaque strings, so the same signaling code
//! path (encode → copy → decode) is exercised as with a network transport.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{ChannelState, PeerTransport, TransportError, TransportEvent};

const OFFER_PREFIX: &str = "memory-offer:";
const ANSWER_PREFIX: &str = "memory-answer:";

/// An offer waiting for a guest to answer it.
struct PendingOffer {
    host: UnboundedSender<TransportEvent>,
    opened: Arc<AtomicBool>,
    guest: Option<(String, UnboundedSender<TransportEvent>)>,
}

/// The rendezvous point shared by every [`MemoryTransport`] it creates.
///
/// Cloning is cheap; clones share the same table of outstanding offers.
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    offers: Arc<Mutex<HashMap<String, PendingOffer>>>,
}

impl MemoryNetwork {
    /// Creates an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport attached to this network.
    pub fn transport(&self) -> MemoryTransport {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        MemoryTransport {
            network: self.clone(),
            events_tx,
            events_rx: Mutex::new(events_rx),
            link: Mutex::new(Link::Idle),
        }
    }
}

enum Link {
    Idle,
    Offered {
        token: String,
    },
    Linked {
        peer: UnboundedSender<TransportEvent>,
        opened: Arc<AtomicBool>,
    },
    Closed,
}

/// One side of an in-process link.
pub struct MemoryTransport {
    network: MemoryNetwork,
    events_tx: UnboundedSender<TransportEvent>,
    events_rx: Mutex<UnboundedReceiver<TransportEvent>>,
    link: Mutex<Link>,
}

impl MemoryTransport {
    /// Simulates an abnormal loss of the channel, observed by both peers as
    /// [`ChannelState::Failed`].
    pub async fn sever(&self) {
        let mut link = self.link.lock().await;
        if let Link::Linked { peer, .. } = &*link {
            let _ = peer.send(TransportEvent::StateChanged(ChannelState::Failed));
            self.emit(ChannelState::Failed);
            tracing::debug!("memory link severed");
        }
        *link = Link::Closed;
    }

    fn emit(&self, state: ChannelState) {
        let _ = self.events_tx.send(TransportEvent::StateChanged(state));
    }
}

impl PeerTransport for MemoryTransport {
    async fn initiate(&self) -> Result<String, TransportError> {
        let mut link = self.link.lock().await;
        if !matches!(*link, Link::Idle) {
            return Err(TransportError::OutOfOrder("initiate on a used transport"));
        }

        let token = random_token();
        self.network.offers.lock().await.insert(
            token.clone(),
            PendingOffer {
                host: self.events_tx.clone(),
                opened: Arc::new(AtomicBool::new(false)),
                guest: None,
            },
        );
        *link = Link::Offered {
            token: token.clone(),
        };
        self.emit(ChannelState::Connecting);

        tracing::debug!(%token, "memory offer created");
        Ok(format!("{OFFER_PREFIX}{token}"))
    }

    async fn accept(&self, offer: &str) -> Result<String, TransportError> {
        let mut link = self.link.lock().await;
        if !matches!(*link, Link::Idle) {
            return Err(TransportError::OutOfOrder("accept on a used transport"));
        }

        let token = offer.strip_prefix(OFFER_PREFIX).ok_or_else(|| {
            TransportError::InvalidDescription("not a memory offer".into())
        })?;

        let mut offers = self.network.offers.lock().await;
        let pending = offers.get_mut(token).ok_or_else(|| {
            TransportError::InvalidDescription(format!("unknown offer {token}"))
        })?;
        if pending.guest.is_some() {
            return Err(TransportError::InvalidDescription(
                "offer already answered".into(),
            ));
        }

        let answer_token = random_token();
        pending.guest = Some((answer_token.clone(), self.events_tx.clone()));
        *link = Link::Linked {
            peer: pending.host.clone(),
            opened: Arc::clone(&pending.opened),
        };
        self.emit(ChannelState::Connecting);

        tracing::debug!(offer = %token, "memory offer answered");
        Ok(format!("{ANSWER_PREFIX}{token}:{answer_token}"))
    }

    async fn complete(&self, answer: &str) -> Result<(), TransportError> {
        let mut link = self.link.lock().await;
        let token = match &*link {
            Link::Offered { token } => token.clone(),
            _ => return Err(TransportError::OutOfOrder("complete without an offer")),
        };

        let (offer_token, answer_token) = answer
            .strip_prefix(ANSWER_PREFIX)
            .and_then(|rest| rest.split_once(':'))
            .ok_or_else(|| {
                TransportError::InvalidDescription("not a memory answer".into())
            })?;
        if offer_token != token {
            return Err(TransportError::InvalidDescription(
                "answer belongs to another offer".into(),
            ));
        }

        let mut offers = self.network.offers.lock().await;
        let guest = match offers.get(&token).and_then(|p| p.guest.as_ref()) {
            Some((expected, guest)) if expected == answer_token => guest.clone(),
            _ => {
                return Err(TransportError::InvalidDescription(
                    "answer does not match this offer".into(),
                ));
            }
        };
        let pending = offers.remove(&token).ok_or(TransportError::OutOfOrder(
            "offer withdrawn during completion",
        ))?;

        pending.opened.store(true, Ordering::Release);
        let _ = guest.send(TransportEvent::StateChanged(ChannelState::Open));
        self.emit(ChannelState::Open);
        *link = Link::Linked {
            peer: guest,
            opened: pending.opened,
        };

        tracing::debug!(%token, "memory link open");
        Ok(())
    }

    async fn send(&self, text: &str) -> Result<(), TransportError> {
        let link = self.link.lock().await;
        match &*link {
            Link::Linked { peer, opened } if opened.load(Ordering::Acquire) => peer
                .send(TransportEvent::Message(text.to_string()))
                .map_err(|_| TransportError::ConnectionClosed("peer dropped".into())),
            _ => Err(TransportError::NotOpen),
        }
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        self.events_rx.lock().await.recv().await
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut link = self.link.lock().await;
        match std::mem::replace(&mut *link, Link::Closed) {
            Link::Linked { peer, .. } => {
                let _ = peer.send(TransportEvent::StateChanged(ChannelState::Closed));
                self.emit(ChannelState::Closed);
            }
            Link::Offered { token } => {
                self.network.offers.lock().await.remove(&token);
            }
            Link::Idle | Link::Closed => {}
        }
        Ok(())
    }
}

/// Generates a random 16-character hex token.
fn random_token() -> String {
    let bytes: [u8; 8] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
