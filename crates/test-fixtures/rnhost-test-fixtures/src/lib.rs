//! Shared JSON fixtures for integration tests and benches.
//!
//! Graph fixtures are command scripts: the commands that build and drive an
//! animated graph, plus (optionally) the view updates the first frame should
//! produce.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    graphs: BTreeMap<String, GraphEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphEntry {
    script: String,
    #[serde(default)]
    expected: Option<String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a BTreeMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod graphs {
    use super::*;

    /// Fixture names in sorted order.
    pub fn keys() -> Vec<String> {
        MANIFEST.graphs.keys().cloned().collect()
    }

    pub fn script_json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.graphs, "graph", name)?;
        read_to_string(&entry.script)
    }

    /// Command script, usually deserialized as `Vec<GraphCommand>`.
    pub fn script<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.graphs, "graph", name)?;
        super::load_json(&entry.script)
    }

    /// Updates expected from the first frame after running the script.
    pub fn expected<T: DeserializeOwned>(name: &str) -> Result<Option<T>> {
        let entry = lookup(&MANIFEST.graphs, "graph", name)?;
        match &entry.expected {
            Some(expected) => super::load_json(expected).map(Some),
            None => Ok(None),
        }
    }

    pub fn script_path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.graphs, "graph", name)?;
        Ok(resolve_path(&entry.script))
    }
}
