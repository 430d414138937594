//! Direct WebSocket transport using `tokio-tungstenite`.
//!
//! The host listens on a socket and offers `ws://<addr>#<host-nonce>`.
//! The guest connects, sends `<host-nonce>:<guest-nonce>` as its first
//! frame and answers with `<guest-nonce>`. When the host applies that
//! answer it checks the nonce and replies with a `ready` frame; both sides
//! report [`ChannelState::Open`] only then.

use std::pin::Pin;

use futures_util::stream::SplitStream;
use futures_util::{Sink, SinkExt, StreamExt};
use rand::Rng;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex, oneshot};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::{ChannelState, PeerTransport, TransportError, TransportEvent};

const READY_FRAME: &str = "ready";

type WsSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;
type HostStream = WebSocketStream<TcpStream>;

enum Link {
    Idle,
    Listening {
        guest: oneshot::Receiver<(HostStream, String)>,
    },
    Open {
        sink: WsSink,
    },
    Closed,
}

/// A WebSocket-based [`PeerTransport`] for peers that can reach each other
/// directly.
pub struct WebSocketTransport {
    bind_addr: String,
    events_tx: UnboundedSender<TransportEvent>,
    events_rx: Mutex<UnboundedReceiver<TransportEvent>>,
    link: Mutex<Link>,
}

impl WebSocketTransport {
    /// Creates a transport that listens on `bind_addr` when it initiates.
    ///
    /// Use port 0 to let the OS pick a free port; the chosen address is
    /// carried in the offer.
    pub fn new(bind_addr: &str) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            bind_addr: bind_addr.to_string(),
            events_tx,
            events_rx: Mutex::new(events_rx),
            link: Mutex::new(Link::Idle),
        }
    }

    fn emit(&self, state: ChannelState) {
        let _ = self.events_tx.send(TransportEvent::StateChanged(state));
    }
}

impl PeerTransport for WebSocketTransport {
    async fn initiate(&self) -> Result<String, TransportError> {
        let mut link = self.link.lock().await;
        if !matches!(*link, Link::Idle) {
            return Err(TransportError::OutOfOrder("initiate on a used transport"));
        }

        let listener = TcpListener::bind(&self.bind_addr)
            .await
            .map_err(TransportError::ConnectFailed)?;
        let addr = listener.local_addr().map_err(TransportError::ConnectFailed)?;
        let nonce = random_nonce();

        let (guest_tx, guest_rx) = oneshot::channel();
        tokio::spawn(wait_for_guest(listener, nonce.clone(), guest_tx));

        *link = Link::Listening { guest: guest_rx };
        self.emit(ChannelState::Connecting);

        tracing::info!(%addr, "WebSocket transport listening for guest");
        Ok(format!("ws://{addr}#{nonce}"))
    }

    async fn accept(&self, offer: &str) -> Result<String, TransportError> {
        let mut link = self.link.lock().await;
        if !matches!(*link, Link::Idle) {
            return Err(TransportError::OutOfOrder("accept on a used transport"));
        }

        let (url, host_nonce) = offer
            .trim()
            .split_once('#')
            .filter(|(url, nonce)| url.starts_with("ws://") && !nonce.is_empty())
            .ok_or_else(|| {
                TransportError::InvalidDescription("not a WebSocket offer".into())
            })?;

        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| {
                TransportError::ConnectFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;
        let (mut sink, stream) = ws.split();

        let guest_nonce = random_nonce();
        sink.send(Message::text(format!("{host_nonce}:{guest_nonce}")))
            .await
            .map_err(send_failed)?;

        self.emit(ChannelState::Connecting);
        tokio::spawn(forward_frames(stream, self.events_tx.clone(), true));
        *link = Link::Open {
            sink: Box::pin(sink),
        };

        tracing::info!(%url, "connected to host, awaiting ready");
        Ok(guest_nonce)
    }

    async fn complete(&self, answer: &str) -> Result<(), TransportError> {
        let mut link = self.link.lock().await;
        let guest = match std::mem::replace(&mut *link, Link::Closed) {
            Link::Listening { guest } => guest,
            other => {
                *link = other;
                return Err(TransportError::OutOfOrder("complete without an offer"));
            }
        };

        let (ws, guest_nonce) = guest.await.map_err(|_| {
            TransportError::ConnectionClosed("listener stopped before a guest arrived".into())
        })?;
        if guest_nonce != answer.trim() {
            self.emit(ChannelState::Failed);
            return Err(TransportError::InvalidDescription(
                "answer does not match the connected guest".into(),
            ));
        }

        let (mut sink, stream) = ws.split();
        sink.send(Message::text(READY_FRAME.to_string()))
            .await
            .map_err(send_failed)?;

        self.emit(ChannelState::Open);
        tokio::spawn(forward_frames(stream, self.events_tx.clone(), false));
        *link = Link::Open {
            sink: Box::pin(sink),
        };

        tracing::info!("WebSocket channel open");
        Ok(())
    }

    async fn send(&self, text: &str) -> Result<(), TransportError> {
        let mut link = self.link.lock().await;
        match &mut *link {
            Link::Open { sink } => sink
                .send(Message::text(text.to_string()))
                .await
                .map_err(send_failed),
            _ => Err(TransportError::NotOpen),
        }
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        self.events_rx.lock().await.recv().await
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut link = self.link.lock().await;
        if let Link::Open { mut sink } = std::mem::replace(&mut *link, Link::Closed) {
            sink.close().await.map_err(send_failed)?;
            self.emit(ChannelState::Closed);
        }
        Ok(())
    }
}

/// Accepts connections until one presents the host nonce, then hands it
/// over together with the guest's nonce.
async fn wait_for_guest(
    listener: TcpListener,
    host_nonce: String,
    guest_tx: oneshot::Sender<(HostStream, String)>,
) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                return;
            }
        };
        let mut ws = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                tracing::debug!(%addr, error = %e, "WebSocket upgrade failed");
                continue;
            }
        };

        let guest_nonce = match ws.next().await {
            Some(Ok(Message::Text(text))) => text
                .as_str()
                .split_once(':')
                .filter(|(nonce, _)| *nonce == host_nonce)
                .map(|(_, guest)| guest.to_string()),
            _ => None,
        };

        match guest_nonce {
            Some(guest_nonce) => {
                tracing::debug!(%addr, "guest presented the offer nonce");
                let _ = guest_tx.send((ws, guest_nonce));
                return;
            }
            None => {
                tracing::debug!(%addr, "rejecting connection without the offer nonce");
                let _ = ws.close(None).await;
            }
        }
    }
}

/// Forwards text frames as [`TransportEvent::Message`] until the stream ends.
///
/// With `await_ready`, the first frame must be the host's ready frame and
/// it is reported as [`ChannelState::Open`] instead of a message.
async fn forward_frames<S>(
    mut stream: SplitStream<WebSocketStream<S>>,
    events: UnboundedSender<TransportEvent>,
    mut await_ready: bool,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let final_state = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let event = if await_ready {
                    if text.as_str() != READY_FRAME {
                        tracing::debug!("host did not confirm the channel");
                        break ChannelState::Failed;
                    }
                    await_ready = false;
                    TransportEvent::StateChanged(ChannelState::Open)
                } else {
                    TransportEvent::Message(text.as_str().to_owned())
                };
                if events.send(event).is_err() {
                    return;
                }
            }
            Some(Ok(Message::Close(_))) | None => break ChannelState::Closed,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                tracing::debug!(error = %e, "WebSocket receive failed");
                break ChannelState::Failed;
            }
        }
    };
    let _ = events.send(TransportEvent::StateChanged(final_state));
}

fn send_failed(e: WsError) -> TransportError {
    TransportError::SendFailed(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        e,
    ))
}

fn random_nonce() -> String {
    let bytes: [u8; 12] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
