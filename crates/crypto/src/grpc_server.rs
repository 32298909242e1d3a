//! gRPC front end for the encryption service.
//!
//! Serves `encryption.MessageService` plus the reflection service. Wire
//! objects are translated to domain values and each call runs on the blocking
//! pool; the call's cancellation token fires when the call future is dropped
//! (client disconnect or server deadline), so the remaining batch is skipped.
//!
//! Failures keep their kind on the wire: the status message is the kind's
//! fixed text and the kind name travels in the `x-error-kind` metadata entry.

use crate::error::{CryptoError, CryptoResult, ErrorKind};
use crate::service::EncryptionPort;
use crate::types::{DecryptRequest, EncryptRequest, RandomKeyRequest};
use pwex_core::ServerConfig;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::metadata::MetadataValue;
use tonic::{transport::Server, Code, Request, Response, Status};

pub mod proto {
    tonic::include_proto!("encryption");

    /// Encoded descriptor set published through reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("encryption_descriptor");
}

use proto::message_service_server::{MessageService, MessageServiceServer};
use proto::*;

/// Metadata key carrying the error kind of a failed call.
pub const ERROR_KIND_HEADER: &str = "x-error-kind";

/// Fully qualified name of the service.
pub const SERVICE_NAME: &str = "encryption.MessageService";

/// Errors raised while standing up or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to listen on {addr}: {source}")]
    ListenFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("reflection service setup failed: {0}")]
    Reflection(#[from] tonic_reflection::server::Error),

    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

/// gRPC status code for each error kind.
pub fn status_code(kind: ErrorKind) -> Code {
    match kind {
        ErrorKind::InvalidKeyLength
        | ErrorKind::InvalidCiphertext
        | ErrorKind::Base64DecodingFailed
        | ErrorKind::DecryptionFailed => Code::InvalidArgument,
        ErrorKind::InsufficientRandomness => Code::Unavailable,
        ErrorKind::Cancelled => Code::Cancelled,
        ErrorKind::CipherCreationFailed
        | ErrorKind::GcmCreationFailed
        | ErrorKind::EncryptionFailed => Code::Internal,
    }
}

impl From<CryptoError> for Status {
    fn from(err: CryptoError) -> Self {
        let kind = err.kind();
        let mut status = Status::new(status_code(kind), kind.message());
        status
            .metadata_mut()
            .insert(ERROR_KIND_HEADER, MetadataValue::from_static(kind.as_str()));
        status
    }
}

/// MessageService gRPC implementation
pub struct MessageServiceImpl {
    service: Arc<dyn EncryptionPort>,
}

impl MessageServiceImpl {
    pub fn new(service: Arc<dyn EncryptionPort>) -> Self {
        Self { service }
    }

    /// Run `op` on the blocking pool inside a per-call span.
    ///
    /// Dropping the returned future cancels the token handed to `op`.
    async fn run_blocking<T, F>(&self, method: &'static str, batch: usize, op: F) -> Result<T, Status>
    where
        T: Send + 'static,
        F: FnOnce(&dyn EncryptionPort, &CancellationToken) -> CryptoResult<T> + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let call_id = service.generate_id();
        let span = tracing::info_span!("rpc", method, %call_id, batch);

        let cancel = CancellationToken::new();
        let _cancel_on_drop = cancel.clone().drop_guard();

        let result = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            tracing::debug!("Received request");
            op(service.as_ref(), &cancel).map_err(|e| {
                tracing::error!(kind = %e.kind(), error = %e, "Request failed");
                e
            })
        })
        .await
        .map_err(|e| {
            tracing::error!(method, error = %e, "Worker task failed");
            Status::internal("worker task failed")
        })?;

        result.map_err(Status::from)
    }
}

#[tonic::async_trait]
impl MessageService for MessageServiceImpl {
    async fn encrypt_message(
        &self,
        request: Request<EncryptedMessageRequest>,
    ) -> Result<Response<EncryptedMessageResponse>, Status> {
        let req = request.into_inner();
        let batch = req.plain_text.len();
        let domain_request = EncryptRequest::new(req.plain_text, req.key);

        let response = self
            .run_blocking("EncryptMessage", batch, move |service, cancel| {
                service.encrypt(domain_request, cancel)
            })
            .await?;

        Ok(Response::new(EncryptedMessageResponse {
            ciphertext: response.ciphertext,
        }))
    }

    async fn decrypt_message(
        &self,
        request: Request<DecryptedMessageRequest>,
    ) -> Result<Response<DecryptedMessageResponse>, Status> {
        let req = request.into_inner();
        let batch = req.ciphertext.len();
        let domain_request = DecryptRequest::new(req.ciphertext, req.key);

        let response = self
            .run_blocking("DecryptMessage", batch, move |service, cancel| {
                service.decrypt(domain_request, cancel)
            })
            .await?;

        Ok(Response::new(DecryptedMessageResponse {
            plaintext: response.plaintext,
        }))
    }

    async fn generate_random_string(
        &self,
        request: Request<Randomrequest>,
    ) -> Result<Response<Randomresponse>, Status> {
        let length = request.into_inner().random_length;

        let response = self
            .run_blocking("GenerateRandomString", 1, move |service, _cancel| {
                service.generate_random_key(RandomKeyRequest { length })
            })
            .await?;

        Ok(Response::new(Randomresponse {
            encryptionbytes: response.key.as_bytes().to_vec(),
            encryption_string: response.key_string,
        }))
    }
}

/// Bind the TCP listener for the server.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr).await.map_err(|source| {
        tracing::error!(%addr, error = %source, "Failed to listen on address");
        ServerError::ListenFailed { addr, source }
    })
}

/// Serve on an already-bound listener until `shutdown` resolves.
///
/// The listener is dropped, and the socket released, when this returns.
pub async fn serve_with_listener<F>(
    listener: TcpListener,
    config: &ServerConfig,
    service: Arc<dyn EncryptionPort>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()>,
{
    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(proto::FILE_DESCRIPTOR_SET)
        .build()?;

    let mut builder = Server::builder();
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(limit) = config.concurrency_limit_per_connection {
        builder = builder.concurrency_limit_per_connection(limit);
    }

    match listener.local_addr() {
        Ok(addr) => tracing::info!(%addr, "Encryption gRPC server listening"),
        Err(e) => tracing::warn!(error = %e, "Listener address unavailable"),
    }

    builder
        .add_service(MessageServiceServer::new(MessageServiceImpl::new(service)))
        .add_service(reflection)
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;

    tracing::info!("Encryption gRPC server stopped");
    Ok(())
}

/// Start the encryption gRPC server on `config.listen_addr`.
pub async fn serve<F>(
    config: &ServerConfig,
    service: Arc<dyn EncryptionPort>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()>,
{
    let listener = bind(config.listen_addr).await?;
    serve_with_listener(listener, config, service, shutdown).await
}
