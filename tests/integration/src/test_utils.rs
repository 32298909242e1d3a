//! Test utilities for running an in-process encryption server

use pwex_core::ServerConfig;
use pwex_crypto::grpc_server::proto::message_service_client::MessageServiceClient;
use pwex_crypto::{EncryptionPort, EncryptionService, OsRandomSource, ServerError};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tonic::transport::Channel;

/// A running server bound to an ephemeral local port
pub struct TestServer {
    pub addr: SocketAddr,
    pub url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    /// Start a server backed by the OS randomness source
    pub async fn start() -> Self {
        Self::start_with(Arc::new(EncryptionService::new(OsRandomSource::new()))).await
    }

    /// Start a server backed by the given service
    pub async fn start_with(service: Arc<dyn EncryptionPort>) -> Self {
        init_tracing();

        let listener = pwex_crypto::bind("127.0.0.1:0".parse().unwrap())
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let config = ServerConfig {
                listen_addr: addr,
                ..ServerConfig::default()
            };
            pwex_crypto::serve_with_listener(listener, &config, service, async {
                let _ = rx.await;
            })
            .await
        });

        Self {
            addr,
            url: format!("http://{}", addr),
            shutdown: Some(tx),
            handle,
        }
    }

    /// Connect a generated client to this server
    pub async fn client(&self) -> MessageServiceClient<Channel> {
        MessageServiceClient::connect(self.url.clone())
            .await
            .expect("Failed to connect to server")
    }

    /// Signal shutdown and wait for the server task to finish
    pub async fn stop(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.expect("Server task panicked")
    }
}

/// Read the error kind attached to a failed call
pub fn error_kind(status: &tonic::Status) -> String {
    status
        .metadata()
        .get(pwex_crypto::ERROR_KIND_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
