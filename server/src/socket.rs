use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::response::Response;
use log::{info, warn};
use tictactoe::{ClientEvent, PlacePayload, ServerEvent};
use tokio::sync::mpsc;

use crate::authority::{AuthorityHandle, Command};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(authority): State<AuthorityHandle>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, authority))
}

/// Pumps one socket until either side goes away.
pub async fn handle_socket(mut socket: WebSocket, authority: AuthorityHandle) {
    let id = authority.next_connection_id();
    let (outbox, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    if !authority.send(Command::Connect { id, outbox }) {
        warn!("{id} refused, game authority is gone");
        return;
    }
    info!("{id} connected");

    loop {
        tokio::select! {
            // Outbound: frames queued by the authority, in emission order.
            outbound = rx.recv() => {
                let Some(event) = outbound else {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                match event.encode() {
                    Ok(json) => {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("{id} could not encode `{}`: {err}", event.name()),
                }
                if let ServerEvent::Close(close) = event {
                    let frame = CloseFrame {
                        code: close_code::NORMAL,
                        reason: close.reason.into(),
                    };
                    let _ = socket.send(Message::Close(Some(frame))).await;
                    break;
                }
            }
            // Inbound: placement requests.
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => match ClientEvent::decode(text.as_str()) {
                        Ok(ClientEvent::Place(PlacePayload { index })) => {
                            authority.send(Command::Place { id, index });
                        }
                        Err(err) => warn!("{id} sent an unusable frame: {err}"),
                    },
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                }
            }
        }
    }

    authority.send(Command::Disconnect { id });
    info!("{id} disconnected");
}
