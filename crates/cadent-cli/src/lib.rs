// Copyright 2025 Cadent Finder Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Cadent CLI
//!
//! Command-line client for cadent metric hosts.
//!
//! The `cadent` binary wraps [`cadent_finder::CadentFinder`]:
//!
//! - `cadent find <pattern>`: resolve a path pattern, one JSON node per line
//! - `cadent fetch --from <ts> [--until <ts>] <target>...`: fetch and merge
//!   series, printed as one JSON document
//!
//! ## Host selection
//!
//! Hosts come from the first source that is present:
//!
//! 1. repeated `-H/--host` flags
//! 2. a TOML file given with `--config`
//! 3. the `CADENT_URLS` / `CADENT_URL` environment variables
//!
//! Logs go to stderr so stdout stays pipeable into `jq`.

use anyhow::{anyhow, Result};
use cadent_common::protocol::CadentError;
use cadent_finder::{FinderConfig, LeafNode, Node, Resolution};
use std::collections::HashSet;
use std::path::Path;

/// Validates that a URL string starts with http:// or https://
pub fn validate_http_url(url: &str, description: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!(
            "Invalid {}: '{}' must start with http:// or https://",
            description,
            url
        ))
    }
}

/// Builds the finder config from flags, a config file, or the environment.
///
/// `timeout_ms` overrides whatever the chosen source says.
pub fn load_config(
    hosts: &[String],
    config_path: Option<&Path>,
    timeout_ms: Option<u64>,
) -> Result<FinderConfig> {
    let mut config = if !hosts.is_empty() {
        for host in hosts {
            validate_http_url(host, "host")?;
        }
        FinderConfig::new(hosts.to_vec())
    } else if let Some(path) = config_path {
        FinderConfig::from_file(path)
            .map_err(|e| anyhow!("Failed to load {}: {}", path.display(), e))?
    } else {
        FinderConfig::from_env()
            .map_err(|e| anyhow!("{} (use -H, --config or CADENT_URLS)", e))?
    };

    if let Some(timeout_ms) = timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    config.validate()?;
    Ok(config)
}

/// Converts a finder error into a CLI error, adding a hint where one helps
pub fn describe_error(err: CadentError) -> anyhow::Error {
    let hint = match &err {
        CadentError::Timeout(_) => Some("raise --timeout-ms or check host load"),
        CadentError::Transport(_) => Some("check that the host is up and reachable"),
        CadentError::Http { status, .. } if *status >= 500 => {
            Some("the host is failing, check its logs")
        }
        CadentError::Decode(_) => Some("the host did not answer with cadent JSON"),
        CadentError::NoHosts => Some("use -H, --config or CADENT_URLS"),
        _ => None,
    };

    match hint {
        Some(hint) => anyhow!("{} ({})", err, hint),
        None => err.into(),
    }
}

/// True when `target` holds glob characters and has to be resolved first
pub fn is_pattern(target: &str) -> bool {
    target.contains(&['*', '?', '[', '{'][..])
}

/// One JSON document per node, optionally leaves only
pub fn node_lines(resolution: &Resolution, leaves_only: bool) -> Result<Vec<String>> {
    resolution
        .nodes
        .iter()
        .filter(|n| !leaves_only || n.is_leaf())
        .map(|n| serde_json::to_string(n).map_err(Into::into))
        .collect()
}

/// Appends the leaves of `nodes` to `leaves`, skipping paths already present
pub fn extend_leaves(leaves: &mut Vec<LeafNode>, nodes: impl IntoIterator<Item = Node>) {
    let mut seen: HashSet<String> = leaves.iter().map(|l| l.path.clone()).collect();
    for node in nodes {
        if let Node::Leaf(leaf) = node {
            if seen.insert(leaf.path.clone()) {
                leaves.push(leaf);
            }
        }
    }
}
