//! Mock registry fixtures shared by the integration tests.

#![allow(dead_code)]

use std::io::Write;

use cask_image::{RegistryClient, RegistryConfig};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A gzip-compressed layer containing executable files.
pub fn layer(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o755);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        header.set_cksum();
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .unwrap();
    }
    let tar = builder.into_inner().unwrap();
    gzip(&tar)
}

/// A layer whose only entry is `bin/sh`, linked to the host shell.
pub fn shell_layer() -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Symlink);
    header.set_size(0);
    header.set_mode(0o777);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    builder
        .append_link(&mut header, "bin/sh", "/bin/sh")
        .unwrap();
    gzip(&builder.into_inner().unwrap())
}

fn gzip(tar: &[u8]) -> Vec<u8> {
    let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    gz.write_all(tar).unwrap();
    gz.finish().unwrap()
}

/// Serve `repo` as an image made of `layers`, in order.
pub async fn serve_image(server: &MockServer, repo: &str, layers: Vec<(&str, Vec<u8>)>) {
    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t0k"})))
        .mount(server)
        .await;

    let descriptors: Vec<_> = layers
        .iter()
        .map(|(digest, _)| json!({"digest": digest}))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/v2/{repo}/manifests/latest")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"schemaVersion": 2, "layers": descriptors})),
        )
        .mount(server)
        .await;

    for (digest, body) in layers {
        Mock::given(method("GET"))
            .and(path(format!("/v2/{repo}/blobs/{digest}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(server)
            .await;
    }
}

/// A client pointed at `server` for both registry and token requests.
pub fn client_for(server: &MockServer) -> RegistryClient {
    let config = RegistryConfig::default()
        .with_registry_url(server.uri())
        .with_auth_url(format!("{}/token", server.uri()));
    RegistryClient::new(config).unwrap()
}
