//! @acp:module "Metadata"
//! @acp:summary "Decoded help text, aliases and flag docs for a command tree"
//! @acp:domain cli
//! @acp:layer model
//!
//! Metadata is produced at build time (typically from doc comments) and
//! shipped as a JSON payload. It only augments what clap displays; it never
//! influences which command runs.

use std::collections::BTreeMap;

use clap::Command;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Documentation for one command and, recursively, its subcommands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
    /// One-line description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    /// Full description shown by `--help`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,

    /// Alternative names for the command
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// Display names of the positional arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,

    /// Flag documentation keyed by flag id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,

    /// Subcommand metadata keyed by command name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, Metadata>,
}

impl Metadata {
    /// Decode a payload; malformed input is an error, never an empty tree
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn child(&self, name: &str) -> Option<&Metadata> {
        self.children.get(name)
    }

    /// Walk down a command path, root excluded
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&Metadata> {
        path.iter()
            .try_fold(self, |node, name| node.child(name.as_ref()))
    }

    /// Layer this node's documentation onto a clap command (not recursive)
    pub fn apply(&self, mut cmd: Command) -> Command {
        if let Some(short) = &self.short {
            cmd = cmd.about(short.clone());
        }
        if let Some(long) = &self.long {
            cmd = cmd.long_about(long.clone());
        }
        if !self.aliases.is_empty() {
            cmd = cmd.visible_aliases(self.aliases.clone());
        }

        for (id, doc) in &self.options {
            if cmd.get_arguments().any(|arg| arg.get_id().as_str() == id.as_str()) {
                let doc = doc.clone();
                cmd = cmd.mut_arg(id.as_str(), move |arg| arg.help(doc));
            } else {
                tracing::warn!(
                    command = cmd.get_name(),
                    flag = id.as_str(),
                    "metadata documents an unknown flag"
                );
            }
        }

        if !self.params.is_empty() {
            let positionals: Vec<String> = cmd
                .get_positionals()
                .map(|arg| arg.get_id().as_str().to_string())
                .collect();
            if let Some(last) = positionals.last() {
                let names = self.params.clone();
                cmd = cmd.mut_arg(last.as_str(), move |arg| arg.value_names(names));
            }
        }

        cmd
    }
}
