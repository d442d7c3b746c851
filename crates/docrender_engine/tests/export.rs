use std::fs;

use docrender_engine::{export_artifact, EngineSettings, ExportError, ReqwestCompileService};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn export_writes_artifact_under_title() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/build/ab12/document.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.5".to_vec()))
        .mount(&server)
        .await;
    let service = ReqwestCompileService::new(EngineSettings {
        base_url: server.uri(),
        ..EngineSettings::default()
    })
    .unwrap();
    let out = TempDir::new().unwrap();

    let written = export_artifact(
        &service,
        "/build/ab12/document.pdf?t=1700000000000",
        Some("Eigenvalues: notes"),
        out.path(),
    )
    .await
    .expect("export");

    assert_eq!(written, out.path().join("Eigenvalues_ notes.pdf"));
    assert_eq!(fs::read(&written).unwrap(), b"%PDF-1.5");
}

#[tokio::test]
async fn export_of_missing_artifact_fails_without_writing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let service = ReqwestCompileService::new(EngineSettings {
        base_url: server.uri(),
        ..EngineSettings::default()
    })
    .unwrap();
    let out = TempDir::new().unwrap();

    let err = export_artifact(&service, "/build/gone/document.pdf", None, out.path())
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Download(_)));
    assert!(!out.path().join("untitled.pdf").exists());
}
