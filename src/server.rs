use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, instrument};

use crate::config::Config;
use crate::connection::Connection;
use crate::store::{MemoryStore, Store};
use crate::Error;

pub async fn run(config: Config) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind((config.bind, config.port)).await?;
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

    serve(listener, store, config).await
}

/// Accepts connections on `listener` until accepting fails, serving each one on its own task.
pub async fn serve(listener: TcpListener, store: Arc<dyn Store>, config: Config) -> Result<(), Error> {
    info!("RESP server listening on {}", listener.local_addr()?);

    let config = Arc::new(config);

    loop {
        let (socket, client_address) = listener.accept().await?;
        let store = store.clone();
        let config = config.clone();
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, store, &config).await {
                error!(e);
            }
        });
    }
}

#[instrument(
    name = "connection",
    skip(stream, store, config),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    store: Arc<dyn Store>,
    config: &Config,
) -> Result<(), Error> {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY: {}", e);
    }

    let (reader, writer) = stream.into_split();
    let conn = Connection::new(reader, writer, store, config);

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    conn.run().await
}
