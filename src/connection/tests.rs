//! Tests for the credential-keyed connection cache.

use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;

use crate::connection::{
    ConnectionCache, CredentialError, CredentialProvider, TokenFileCredentials,
};
use crate::request::ServiceCredentials;
use crate::test_support::{api_error, ScriptedComputeApi, ScriptedCredentials};

fn credentials(service_account: &str) -> ServiceCredentials {
    ServiceCredentials::new(service_account, "/tmp/unused-token")
}

#[tokio::test]
async fn same_identity_returns_the_same_handle_and_builds_once() {
    let provider = ScriptedCredentials::new(ScriptedComputeApi::new());
    let cache = ConnectionCache::new(provider.clone());
    let identity = credentials("fleet@p1.iam.gserviceaccount.com");

    let first = cache
        .connection(&identity, "p1")
        .await
        .unwrap_or_else(|err| panic!("first lookup should succeed: {err}"));
    let second = cache
        .connection(&identity, "p1")
        .await
        .unwrap_or_else(|err| panic!("second lookup should succeed: {err}"));

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(provider.connects(), 1);
}

#[tokio::test]
async fn distinct_identities_get_distinct_handles() {
    let provider = ScriptedCredentials::new(ScriptedComputeApi::new());
    let cache = ConnectionCache::new(provider.clone());

    let first = cache
        .connection(&credentials("a@p1.iam.gserviceaccount.com"), "p1")
        .await
        .unwrap_or_else(|err| panic!("lookup for a should succeed: {err}"));
    let second = cache
        .connection(&credentials("b@p1.iam.gserviceaccount.com"), "p1")
        .await
        .unwrap_or_else(|err| panic!("lookup for b should succeed: {err}"));

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(provider.connects(), 2);
}

#[tokio::test]
async fn concurrent_lookups_of_one_identity_converge_on_one_handle() {
    let provider = ScriptedCredentials::new(ScriptedComputeApi::new());
    let cache = Arc::new(ConnectionCache::new(provider));
    let identity = credentials("fleet@p1.iam.gserviceaccount.com");

    let (first, second, third) = tokio::join!(
        cache.connection(&identity, "p1"),
        cache.connection(&identity, "p1"),
        cache.connection(&identity, "p1"),
    );
    let first_handle = first.unwrap_or_else(|err| panic!("lookup should succeed: {err}"));
    let second_handle = second.unwrap_or_else(|err| panic!("lookup should succeed: {err}"));
    let third_handle = third.unwrap_or_else(|err| panic!("lookup should succeed: {err}"));

    assert!(Arc::ptr_eq(&first_handle, &second_handle));
    assert!(Arc::ptr_eq(&second_handle, &third_handle));
}

#[tokio::test]
async fn validation_failure_surfaces_invalid_without_evicting() {
    let api = ScriptedComputeApi::new();
    let provider = ScriptedCredentials::new(api.clone());
    let cache = ConnectionCache::new(provider.clone());
    let identity = credentials("fleet@p1.iam.gserviceaccount.com");

    api.fail_validation(api_error("projects.get"));
    let failure = cache.connection(&identity, "p1").await;
    assert!(matches!(failure, Err(CredentialError::Invalid { .. })));

    // The entry survives the failed validation: the retry reuses it
    // instead of rebuilding.
    api.pass_validation();
    let retry = cache.connection(&identity, "p1").await;
    assert!(retry.is_ok());
    assert_eq!(provider.connects(), 1);
}

#[tokio::test]
async fn build_failure_passes_through() {
    let provider = ScriptedCredentials::new(ScriptedComputeApi::new());
    provider.fail_connect(CredentialError::Build {
        service_account: "fleet@p1.iam.gserviceaccount.com".to_owned(),
        message: "bad key material".to_owned(),
    });
    let cache = ConnectionCache::new(provider);

    let result = cache
        .connection(&credentials("fleet@p1.iam.gserviceaccount.com"), "p1")
        .await;
    assert!(matches!(result, Err(CredentialError::Build { .. })));
}

#[test]
fn token_file_credentials_reads_the_token() {
    let mut file = tempfile::NamedTempFile::new()
        .unwrap_or_else(|err| panic!("temp file should create: {err}"));
    writeln!(file, "ya29.test-token")
        .unwrap_or_else(|err| panic!("temp file should accept writes: {err}"));
    let path = Utf8PathBuf::from_path_buf(file.path().to_path_buf())
        .unwrap_or_else(|path| panic!("temp path should be utf-8: {}", path.display()));

    let provider = TokenFileCredentials::new();
    let result = provider.connect(&ServiceCredentials::new("fleet@p1", path));
    assert!(result.is_ok());
}

#[test]
fn token_file_credentials_rejects_an_empty_file() {
    let file = tempfile::NamedTempFile::new()
        .unwrap_or_else(|err| panic!("temp file should create: {err}"));
    let path = Utf8PathBuf::from_path_buf(file.path().to_path_buf())
        .unwrap_or_else(|path| panic!("temp path should be utf-8: {}", path.display()));

    let provider = TokenFileCredentials::new();
    let result = provider.connect(&ServiceCredentials::new("fleet@p1", path));
    assert!(matches!(result, Err(CredentialError::Build { .. })));
}

#[test]
fn token_file_credentials_reports_a_missing_file() {
    let provider = TokenFileCredentials::new();
    let result = provider.connect(&ServiceCredentials::new(
        "fleet@p1",
        "/nonexistent/key-file.token",
    ));
    assert!(matches!(result, Err(CredentialError::KeyFile { .. })));
}
