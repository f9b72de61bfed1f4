use httpmock::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use ukps_domains::{
    DataSource, HttpTransport, LoaderConfig, LocalStorage, LookupOptions, RegistryLoader,
    UkpsDomains, UkpsError, WildcardStrategy,
};

fn registry(version: &str, notes: &str) -> serde_json::Value {
    serde_json::json!({
        "version": version,
        "domains": [
            {"domain_pattern": "example.gov.uk", "identifiers": {}, "notes": notes, "organisation_id": "example-org", "organisation_type_id": "central_gov", "source": "manual"},
            {"domain_pattern": "*.example.gov.uk", "identifiers": {}, "notes": "wildcard", "organisation_id": null, "organisation_type_id": "central_gov", "source": "manual"}
        ]
    })
}

fn organisations(title: &str) -> serde_json::Value {
    serde_json::json!([
        {"id": "example-org", "title": title, "details": {"slug": "example-org"}}
    ])
}

fn write_local(dir: &Path, version: &str) {
    std::fs::write(
        dir.join("user_domains.json"),
        registry(version, "local").to_string(),
    )
    .unwrap();
    std::fs::write(
        dir.join("govuk_organisations.json"),
        organisations("Local Org").to_string(),
    )
    .unwrap();
}

fn config(server: &MockServer, local_directory: PathBuf) -> LoaderConfig {
    LoaderConfig {
        remote_url_prefix: server.url("/data/"),
        local_directory,
        ..LoaderConfig::default()
    }
}

#[tokio::test]
async fn test_remote_load_with_real_http() {
    let temp_dir = TempDir::new().unwrap();
    write_local(temp_dir.path(), "1.0.0");

    let server = MockServer::start();
    let registry_mock = server.mock(|when, then| {
        when.method(GET).path("/data/user_domains.json");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(registry("2.0.0", "remote"));
    });
    let organisations_mock = server.mock(|when, then| {
        when.method(GET).path("/data/govuk_organisations.json");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(organisations("Remote Org"));
    });

    let domains = UkpsDomains::connect(config(&server, temp_dir.path().to_path_buf()))
        .await
        .unwrap();

    registry_mock.assert();
    organisations_mock.assert();
    assert_eq!(domains.data_source(), Some(DataSource::Remote));

    let found = domains.resolve("EXAMPLE.gov.uk.").unwrap().unwrap();
    assert_eq!(found.entry.notes, "remote");
    assert_eq!(found.organisation.unwrap()["title"], "Remote Org");

    let found = domains.resolve_email("someone@team.example.gov.uk").unwrap().unwrap();
    assert_eq!(found.entry.domain_pattern, "*.example.gov.uk");
    assert!(found.organisation.is_none());
}

#[tokio::test]
async fn test_one_missing_remote_document_falls_back_to_local() {
    let temp_dir = TempDir::new().unwrap();
    write_local(temp_dir.path(), "1.0.0");

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/data/user_domains.json");
        then.status(200).json_body(registry("2.0.0", "remote"));
    });
    let organisations_mock = server.mock(|when, then| {
        when.method(GET).path("/data/govuk_organisations.json");
        then.status(500);
    });

    let domains = UkpsDomains::connect(config(&server, temp_dir.path().to_path_buf()))
        .await
        .unwrap();

    organisations_mock.assert();
    assert_eq!(domains.data_source(), Some(DataSource::Local));

    // nothing from the remote registry leaks into the local snapshot
    let snapshot = domains.snapshot().unwrap();
    assert_eq!(snapshot.version(), "1.0.0");
    let found = domains.resolve("example.gov.uk").unwrap().unwrap();
    assert_eq!(found.entry.notes, "local");
    assert_eq!(found.organisation.unwrap()["title"], "Local Org");
}

#[tokio::test]
async fn test_remote_timeout_falls_back_to_local() {
    let temp_dir = TempDir::new().unwrap();
    write_local(temp_dir.path(), "1.0.0");

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/data/user_domains.json");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(registry("2.0.0", "remote"));
    });

    let config = LoaderConfig {
        remote_timeout_secs: 1,
        ..config(&server, temp_dir.path().to_path_buf())
    };
    let loader = RegistryLoader::from_config(config).unwrap();

    let snapshot = loader.load().await.unwrap();
    assert_eq!(snapshot.source(), DataSource::Local);
}

#[tokio::test]
async fn test_both_sources_unavailable() {
    let temp_dir = TempDir::new().unwrap();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET);
        then.status(404);
    });

    let result = UkpsDomains::connect(config(&server, temp_dir.path().to_path_buf())).await;

    match result {
        Err(e @ UkpsError::DataUnavailable { .. }) => {
            assert!(e.to_string().contains("404"));
        }
        Err(other) => panic!("expected DataUnavailable, got {}", other),
        Ok(_) => panic!("expected DataUnavailable, got a loaded registry"),
    }
}

#[tokio::test]
async fn test_local_only_load_makes_no_requests() {
    let temp_dir = TempDir::new().unwrap();
    write_local(temp_dir.path(), "1.0.0");

    let server = MockServer::start();
    let any_request = server.mock(|when, then| {
        when.method(GET);
        then.status(200);
    });

    let config = LoaderConfig {
        allow_remote: false,
        ..config(&server, temp_dir.path().to_path_buf())
    };
    let domains = UkpsDomains::new(RegistryLoader::new(
        HttpTransport::new(config.remote_timeout()).unwrap(),
        LocalStorage::new(temp_dir.path()),
        config,
    ));

    assert_eq!(domains.refresh().await.unwrap(), DataSource::Local);
    any_request.assert_hits(0);
}

#[tokio::test]
async fn test_bundled_data_literal_patterns_resolve_to_themselves() {
    let data_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    let config = LoaderConfig {
        allow_remote: false,
        local_directory: data_dir,
        ..LoaderConfig::default()
    };

    let domains = UkpsDomains::connect(config).await.unwrap();
    let snapshot = domains.snapshot().unwrap();
    assert!(!snapshot.is_empty());

    for entry in snapshot.entries().iter().filter(|e| !e.is_wildcard()) {
        let found = domains.resolve(&entry.domain_pattern).unwrap().unwrap();
        assert_eq!(&found.entry, entry);
        assert!(domains.is_known_domain(&entry.domain_pattern).unwrap());
    }

    let found = domains.resolve("cabinetoffice.gov.uk").unwrap().unwrap();
    assert_eq!(found.organisation.unwrap()["title"], "Cabinet Office");

    // *.gov.uk and *.nhs.uk are both in the bundled data
    assert!(domains.is_known_email("someone@digital.cabinet-office.gov.uk").unwrap());
    assert!(domains.is_known_domain("trust.nhs.uk").unwrap());
    assert!(!domains.is_known_domain("example.com").unwrap());

    let found = domains
        .resolve_with(
            "leeds.gov.uk",
            LookupOptions::without_enrichment(WildcardStrategy::MostSpecific),
        )
        .unwrap()
        .unwrap();
    assert_eq!(found.entry.source, "localgov.co.uk");
}
