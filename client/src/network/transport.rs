use std::io::ErrorKind;
use std::net::TcpStream;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bevy::log::{debug, info, warn};
use crossbeam_channel::{Receiver, TryRecvError};
use tictactoe::{ClientEvent, ServerEvent};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::ServerEventRouter;

/// How long a read may block before outgoing intents get a chance.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Runs one connection on its own thread until either end goes away.
///
/// Dropping the sending half of `outgoing` closes the socket.
pub fn spawn(
    session: u64,
    url: String,
    router: ServerEventRouter,
    outgoing: Receiver<ClientEvent>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("tictactoe-socket-{session}"))
        .spawn(move || {
            let error = match tungstenite::connect(url.as_str()) {
                Ok((mut socket, _)) => {
                    info!("Connected to {url}");
                    router.connected(session, &url);
                    pump(&mut socket, &router, &outgoing).err()
                }
                Err(err) => Some(format!("Could not reach {url}: {err}")),
            };
            router.disconnected(session, error);
        })
}

/// Interleaves outgoing intents with incoming frames.
fn pump(
    socket: &mut Socket,
    router: &ServerEventRouter,
    outgoing: &Receiver<ClientEvent>,
) -> Result<(), String> {
    if let MaybeTlsStream::Plain(stream) = socket.get_ref() {
        stream
            .set_read_timeout(Some(POLL_INTERVAL))
            .map_err(|err| err.to_string())?;
    }

    loop {
        if !send_outgoing(socket, outgoing)? {
            return hang_up(socket);
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                let event =
                    ServerEvent::decode(text.as_str()).map_err(|err| format!("Bad frame: {err}"))?;
                debug!("<- {}", event.name());
                // The app may have given up on this socket while the read was pending.
                if !send_outgoing(socket, outgoing)? {
                    return hang_up(socket);
                }
                if !router.route(event) {
                    return Ok(());
                }
            }
            Ok(Message::Close(frame)) => {
                debug!("Server closed the socket: {frame:?}");
                return Ok(());
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(err))
                if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                return Ok(());
            }
            Err(err) => {
                warn!("Socket error: {err}");
                return Err(err.to_string());
            }
        }
    }
}

/// Writes every queued intent. `false` once the app dropped its sender.
fn send_outgoing(socket: &mut Socket, outgoing: &Receiver<ClientEvent>) -> Result<bool, String> {
    loop {
        match outgoing.try_recv() {
            Ok(event) => {
                let frame = event.encode().map_err(|err| err.to_string())?;
                socket
                    .send(Message::text(frame))
                    .map_err(|err| err.to_string())?;
            }
            Err(TryRecvError::Empty) => return Ok(true),
            Err(TryRecvError::Disconnected) => return Ok(false),
        }
    }
}

fn hang_up(socket: &mut Socket) -> Result<(), String> {
    debug!("Connection dropped by the app, closing the socket");
    match socket.close(None).and_then(|()| socket.flush()) {
        Ok(())
        | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    use bevy::prelude::App;

    /// Accepts one socket and reports the frames it saw until the peer closed.
    fn serve_once(listener: TcpListener) -> JoinHandle<Vec<Message>> {
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut socket = tungstenite::accept(stream).unwrap();
            let mut seen = Vec::new();
            while let Ok(frame) = socket.read() {
                let closing = frame.is_close();
                seen.push(frame);
                if closing {
                    break;
                }
            }
            seen
        })
    }

    #[test]
    fn dropping_the_sender_closes_the_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = serve_once(listener);

        let mut app = App::new();
        let router = ServerEventRouter::register(&mut app);
        let (mut socket, _) = tungstenite::connect(format!("ws://{addr}")).unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(ClientEvent::place(4)).unwrap();
        drop(tx);

        assert_eq!(pump(&mut socket, &router, &rx), Ok(()));

        let seen = server.join().unwrap();
        assert_eq!(seen.len(), 2, "expected the intent then a close, got {seen:?}");
        let Message::Text(text) = &seen[0] else {
            panic!("expected a text frame, got {:?}", seen[0]);
        };
        assert_eq!(ClientEvent::decode(text.as_str()).unwrap(), ClientEvent::place(4));
        assert!(seen[1].is_close());
    }
}
