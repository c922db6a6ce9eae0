/// Declares `ServerEventRouter`, holding one channel per server event.
///
/// Each payload is surfaced to Bevy as `Net<Payload>`, plus the `OnConnect`
/// and `OnDisconnect` lifecycle events.
macro_rules! net_events {
    ($( $variant:ident => $payload:ty ),* $(,)?) => {
        paste::paste! {
            #[derive(Clone)]
            pub struct ServerEventRouter {
                connect: crossbeam_channel::Sender<OnConnect>,
                disconnect: crossbeam_channel::Sender<OnDisconnect>,
                $( [<$variant:snake>]: crossbeam_channel::Sender<$payload>, )*
            }

            impl ServerEventRouter {
                /// Registers every event with `app` and returns the sending halves.
                pub fn register(app: &mut bevy::prelude::App) -> Self {
                    let (connect, disconnect) = net_lifecycle_events!(app);
                    $(
                        let ([<$variant:snake>], rx) = crossbeam_channel::unbounded::<$payload>();
                        net_register_event!(app, $payload, rx);
                    )*
                    Self {
                        connect,
                        disconnect,
                        $( [<$variant:snake>], )*
                    }
                }

                /// Queues a decoded event for its system. `false` once the app is gone.
                pub fn route(&self, event: tictactoe::ServerEvent) -> bool {
                    match event {
                        $(
                            tictactoe::ServerEvent::$variant(payload) => {
                                self.[<$variant:snake>].send(payload).is_ok()
                            }
                        )*
                    }
                }

                pub fn connected(&self, session: u64, url: &str) -> bool {
                    let url = url.to_owned();
                    self.connect.send(OnConnect { session, url }).is_ok()
                }

                pub fn disconnected(&self, session: u64, error: Option<String>) -> bool {
                    self.disconnect.send(OnDisconnect::new(session, error)).is_ok()
                }
            }
        }
    };
}

/// Register the events for the lifecycle callbacks: OnConnect, OnDisconnect
macro_rules! net_lifecycle_events {
    ($app:ident) => {{
        let (conn_tx, conn_rx) = crossbeam_channel::unbounded::<OnConnect>();
        let (disconn_tx, disconn_rx) = crossbeam_channel::unbounded::<OnDisconnect>();

        net_register_event!($app, (OnConnect, conn_rx), (OnDisconnect, disconn_rx));

        (conn_tx, disconn_tx)
    }};
}

// Register the payloads wrapped by a Net
macro_rules! net_register_event {
    ($app:ident, $evt_ty:ty, $rx:ident) => {
        ($app).add_event::<Net<$evt_ty>>();
        ($app).add_systems(bevy::prelude::PreUpdate, process_network_queue::<$evt_ty>);
        ($app).insert_resource(EventQueue::<$evt_ty>($rx));
    };

    ($app:ident, $( ($evt_ty:ty , $rx:ident) ),* ) => {
        $(
            net_register_event!($app, $evt_ty, $rx);
        )*
    };
}
