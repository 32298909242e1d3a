//! Wire-level tests for `encryption.MessageService`
//!
//! Covers the reference scenarios end to end plus error kind propagation.

use crate::test_utils::*;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use pwex_crypto::grpc_server::proto::*;
use pwex_crypto::{EncryptionService, SeededRandomSource};
use rand::RngCore;
use std::sync::Arc;
use tonic::{Code, Request};

fn encrypt_request(plain_text: &[&str], key: &[u8]) -> Request<EncryptedMessageRequest> {
    Request::new(EncryptedMessageRequest {
        plain_text: plain_text.iter().map(|p| p.to_string()).collect(),
        key: key.to_vec(),
    })
}

fn decrypt_request(ciphertext: Vec<String>, key: &[u8]) -> Request<DecryptedMessageRequest> {
    Request::new(DecryptedMessageRequest {
        ciphertext,
        key: key.to_vec(),
    })
}

#[tokio::test]
async fn test_single_message_round_trip() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    let key = [0u8; 32];

    let encrypted = client
        .encrypt_message(encrypt_request(&["hello"], &key))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(encrypted.ciphertext.len(), 1);
    assert_eq!(URL_SAFE.decode(&encrypted.ciphertext[0]).unwrap().len(), 33);

    let decrypted = client
        .decrypt_message(decrypt_request(encrypted.ciphertext, &key))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(decrypted.plaintext, vec!["aGVsbG8=".to_string()]);
}

#[tokio::test]
async fn test_empty_batch() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    let key = [7u8; 32];

    let encrypted = client
        .encrypt_message(encrypt_request(&[], &key))
        .await
        .unwrap()
        .into_inner();
    assert!(encrypted.ciphertext.is_empty());

    let decrypted = client
        .decrypt_message(decrypt_request(vec![], &key))
        .await
        .unwrap()
        .into_inner();
    assert!(decrypted.plaintext.is_empty());
}

#[tokio::test]
async fn test_wrong_key_length() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let status = client
        .encrypt_message(encrypt_request(&["x"], &[0u8; 16]))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "invalid key length");
    assert_eq!(error_kind(&status), "InvalidKeyLength");
}

#[tokio::test]
async fn test_malformed_base64() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let status = client
        .decrypt_message(decrypt_request(vec!["!!!not-base64!!!".to_string()], &[0u8; 32]))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(error_kind(&status), "Base64DecodingFailed");
}

#[tokio::test]
async fn test_short_ciphertext() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let mut short = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut short);

    let status = client
        .decrypt_message(decrypt_request(vec![URL_SAFE.encode(short)], &[0u8; 32]))
        .await
        .unwrap_err();

    assert_eq!(error_kind(&status), "InvalidCiphertext");
}

#[tokio::test]
async fn test_generate_random_string() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let response = client
        .generate_random_string(Request::new(Randomrequest { random_length: 32 }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.encryptionbytes.len(), 32);
    assert_eq!(response.encryption_string.len(), 44);
    assert!(response.encryption_string.ends_with('='));
    assert_eq!(
        URL_SAFE.decode(&response.encryption_string).unwrap(),
        response.encryptionbytes
    );
}

#[tokio::test]
async fn test_generate_random_string_invalid_length() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let status = client
        .generate_random_string(Request::new(Randomrequest { random_length: 16 }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(error_kind(&status), "InvalidKeyLength");
}

#[tokio::test]
async fn test_wrong_key_and_tampering_are_indistinguishable() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    let key = [1u8; 32];

    let encrypted = client
        .encrypt_message(encrypt_request(&["secret"], &key))
        .await
        .unwrap()
        .into_inner();

    let wrong_key = client
        .decrypt_message(decrypt_request(encrypted.ciphertext.clone(), &[2u8; 32]))
        .await
        .unwrap_err();

    let mut raw = URL_SAFE.decode(&encrypted.ciphertext[0]).unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0x01;
    let tampered = client
        .decrypt_message(decrypt_request(vec![URL_SAFE.encode(&raw)], &key))
        .await
        .unwrap_err();

    assert_eq!(wrong_key.code(), tampered.code());
    assert_eq!(wrong_key.message(), tampered.message());
    assert_eq!(error_kind(&wrong_key), "DecryptionFailed");
    assert_eq!(error_kind(&tampered), "DecryptionFailed");
}

#[tokio::test]
async fn test_batch_order_and_atomicity() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    let key = [3u8; 32];
    let inputs = ["one", "two", "three", "four"];

    let encrypted = client
        .encrypt_message(encrypt_request(&inputs, &key))
        .await
        .unwrap()
        .into_inner();

    let decrypted = client
        .decrypt_message(decrypt_request(encrypted.ciphertext.clone(), &key))
        .await
        .unwrap()
        .into_inner();
    let expected: Vec<String> = inputs.iter().map(|p| URL_SAFE.encode(p)).collect();
    assert_eq!(decrypted.plaintext, expected);

    let mut poisoned = encrypted.ciphertext;
    poisoned[1] = URL_SAFE.encode([0u8; 4]);
    let status = client
        .decrypt_message(decrypt_request(poisoned, &key))
        .await
        .unwrap_err();
    assert_eq!(error_kind(&status), "InvalidCiphertext");
}

#[tokio::test]
async fn test_seeded_servers_agree() {
    let a = TestServer::start_with(Arc::new(EncryptionService::new(SeededRandomSource::new(99)))).await;
    let b = TestServer::start_with(Arc::new(EncryptionService::new(SeededRandomSource::new(99)))).await;
    let key = [4u8; 32];

    // first call on each server consumes the same nonce stream
    let from_a = a
        .client()
        .await
        .encrypt_message(encrypt_request(&["deterministic"], &key))
        .await
        .unwrap()
        .into_inner();
    let from_b = b
        .client()
        .await
        .encrypt_message(encrypt_request(&["deterministic"], &key))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(from_a.ciphertext, from_b.ciphertext);
}

#[tokio::test]
async fn test_concurrent_calls() {
    let server = TestServer::start().await;
    let key = [5u8; 32];

    let mut tasks = Vec::new();
    for i in 0..16 {
        let mut client = server.client().await;
        tasks.push(tokio::spawn(async move {
            let message = format!("message-{i}");
            let encrypted = client
                .encrypt_message(encrypt_request(&[message.as_str()], &key))
                .await
                .unwrap()
                .into_inner();
            let decrypted = client
                .decrypt_message(decrypt_request(encrypted.ciphertext, &key))
                .await
                .unwrap()
                .into_inner();
            (message, decrypted.plaintext)
        }));
    }

    for task in tasks {
        let (message, plaintext) = task.await.unwrap();
        assert_eq!(plaintext, vec![URL_SAFE.encode(message)]);
    }
}
