//! Pull pipeline tests against a mock registry.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use cask_common::CaskError;
use cask_image::{ImageReference, Manifest, Puller, RegistryClient, RegistryConfig};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn layer(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1_700_000_000);
        header.set_uid(0);
        header.set_gid(0);
        header.set_cksum();
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .unwrap();
    }
    let tar = builder.into_inner().unwrap();
    let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    gz.write_all(&tar).unwrap();
    gz.finish().unwrap()
}

fn client_for(server: &MockServer) -> RegistryClient {
    let config = RegistryConfig::default()
        .with_registry_url(server.uri())
        .with_auth_url(format!("{}/token", server.uri()));
    RegistryClient::new(config).unwrap()
}

async fn mount_token(server: &MockServer, scope: &str) {
    Mock::given(method("GET"))
        .and(path("/token"))
        .and(query_param("service", "registry.docker.io"))
        .and(query_param("scope", scope))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t0k"})))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_manifest(server: &MockServer, repo: &str, digests: &[&str]) {
    let layers: Vec<_> = digests
        .iter()
        .map(|d| {
            json!({
                "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
                "digest": d,
                "size": 1
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/v2/{repo}/manifests/latest")))
        .and(header("authorization", "Bearer t0k"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"schemaVersion": 2, "layers": layers})),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_blob(server: &MockServer, repo: &str, digest: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("/v2/{repo}/blobs/{digest}")))
        .and(header("authorization", "Bearer t0k"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(1)
        .mount(server)
        .await;
}

fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    fn walk(base: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            let path = entry.path();
            let rel = path.strip_prefix(base).unwrap().display().to_string();
            if entry.file_type().unwrap().is_dir() {
                out.insert(format!("{rel}/"), Vec::new());
                walk(base, &path, out);
            } else {
                out.insert(rel, std::fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

async fn pull_into(client: &RegistryClient, image: &str, root: &Path) -> cask_image::PullReport {
    let reference = ImageReference::parse(image);
    let token = client.fetch_token(&reference).await.unwrap();
    let manifest = client.fetch_manifest(&reference, &token).await.unwrap();
    Puller::new(client, &reference, &token)
        .assemble(&manifest, root)
        .await
        .unwrap()
}

#[test_log::test(tokio::test)]
async fn pulls_every_layer_in_manifest_order() {
    let server = MockServer::start().await;
    mount_token(&server, "repository:library/alpine:pull,push").await;
    mount_manifest(
        &server,
        "library/alpine",
        &["sha256:aaa", "sha256:bbb", "sha256:ccc"],
    )
    .await;
    let base = layer(&[("etc/motd", "base"), ("bin/a", "a")]);
    mount_blob(&server, "library/alpine", "sha256:aaa", base).await;
    let middle = layer(&[("etc/motd", "middle")]);
    mount_blob(&server, "library/alpine", "sha256:bbb", middle).await;
    let top = layer(&[("bin/c", "c")]);
    mount_blob(&server, "library/alpine", "sha256:ccc", top).await;

    let root = tempfile::tempdir().unwrap();
    let report = pull_into(&client_for(&server), "alpine", root.path()).await;

    assert_eq!(report.applied, ["sha256:aaa", "sha256:bbb", "sha256:ccc"]);

    let requests = server.received_requests().await.unwrap();
    let blob_paths: Vec<_> = requests
        .iter()
        .map(|r| r.url.path().to_string())
        .filter(|p| p.contains("/blobs/"))
        .collect();
    assert_eq!(
        blob_paths,
        [
            "/v2/library/alpine/blobs/sha256:aaa",
            "/v2/library/alpine/blobs/sha256:bbb",
            "/v2/library/alpine/blobs/sha256:ccc",
        ]
    );

    let tree = snapshot(root.path());
    assert_eq!(tree["etc/motd"], b"middle");
    assert_eq!(tree["bin/a"], b"a");
    assert_eq!(tree["bin/c"], b"c");
    assert!(tree.keys().all(|k| !k.starts_with("sha256:")));
}

#[tokio::test]
async fn assembling_twice_yields_identical_trees() {
    let server = MockServer::start().await;
    let blobs = [
        ("sha256:one", layer(&[("usr/lib/x", "1"), ("etc/hosts", "a")])),
        ("sha256:two", layer(&[("etc/hosts", "b")])),
    ];
    for (digest, body) in &blobs {
        Mock::given(method("GET"))
            .and(path(format!("/v2/myuser/app/blobs/{digest}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .expect(2)
            .mount(&server)
            .await;
    }

    let client = client_for(&server);
    let reference = ImageReference::parse("myuser/app");
    let token = cask_image::RegistryToken::new("t0k");
    let manifest = Manifest::from_slice(
        json!({"schemaVersion": 2, "layers": [{"digest": "sha256:one"}, {"digest": "sha256:two"}]})
            .to_string()
            .as_bytes(),
    )
    .unwrap();
    let puller = Puller::new(&client, &reference, &token);

    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    puller.assemble(&manifest, first.path()).await.unwrap();
    puller.assemble(&manifest, second.path()).await.unwrap();

    assert_eq!(snapshot(first.path()), snapshot(second.path()));
}

#[tokio::test]
async fn malformed_token_body_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_token(&ImageReference::parse("alpine"))
        .await
        .unwrap_err();

    assert!(matches!(err, CaskError::Decode { what: "token response", .. }));
}

#[tokio::test]
async fn empty_token_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": ""})))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .fetch_token(&ImageReference::parse("alpine"))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn access_token_field_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "abc"})))
        .mount(&server)
        .await;

    let token = client_for(&server)
        .fetch_token(&ImageReference::parse("alpine"))
        .await
        .unwrap();

    assert_eq!(token.as_str(), "abc");
}

#[tokio::test]
async fn missing_manifest_is_a_registry_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/library/nope/manifests/latest"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_manifest(
            &ImageReference::parse("nope"),
            &cask_image::RegistryToken::new("t0k"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CaskError::Registry { status: 404, .. }));
}

#[tokio::test]
async fn failed_blob_stops_the_pull() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/library/alpine/blobs/sha256:first"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/library/alpine/blobs/sha256:second"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(layer(&[("x", "x")])))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reference = ImageReference::parse("alpine");
    let token = cask_image::RegistryToken::new("t0k");
    let manifest = Manifest::from_slice(
        br#"{"schemaVersion": 2,
            "layers": [{"digest": "sha256:first"}, {"digest": "sha256:second"}]}"#,
    )
    .unwrap();

    let root = tempfile::tempdir().unwrap();
    let err = Puller::new(&client, &reference, &token)
        .assemble(&manifest, root.path())
        .await
        .unwrap_err();

    assert!(matches!(err, CaskError::Registry { status: 500, .. }));
}

#[tokio::test]
async fn slow_registry_hits_request_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "late"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = RegistryConfig::default()
        .with_auth_url(format!("{}/token", server.uri()))
        .with_timeouts(Duration::from_secs(1), Duration::from_millis(200));
    let err = RegistryClient::new(config)
        .unwrap()
        .fetch_token(&ImageReference::parse("alpine"))
        .await
        .unwrap_err();

    assert!(matches!(err, CaskError::Timeout { operation: "requesting token", .. }));
}
