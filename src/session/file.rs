use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::{SessionSnapshot, Workspace};
use crate::graph::GraphData;
use crate::util::fresh_id;

#[derive(Debug, Error)]
pub enum SeedFileError {
    #[error("failed to access seed file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("seed file is not valid JSON")]
    Json(#[from] serde_json::Error),

    #[error("seed file is inconsistent: {0}")]
    Invalid(String),
}

/// Persisted exploration: the live level plus every open ancestor level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedFile {
    pub id: String,
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
    pub data: GraphData,
    #[serde(default)]
    pub session_stack: Vec<SessionSnapshot>,
}

impl SeedFile {
    pub fn from_workspace(id: Option<String>, name: impl Into<String>, workspace: &Workspace) -> Self {
        Self {
            id: id.unwrap_or_else(fresh_id),
            name: name.into(),
            last_modified: Utc::now().timestamp_millis(),
            data: workspace.store().snapshot(),
            session_stack: workspace.stack().to_vec(),
        }
    }

    pub fn into_workspace(self) -> Result<Workspace, SeedFileError> {
        self.validate()?;
        Ok(Workspace::from_parts(self.data, self.session_stack))
    }

    /// Every level must be free of orphan links and every snapshot's trigger
    /// node must exist in that snapshot.
    pub fn validate(&self) -> Result<(), SeedFileError> {
        if !self.data.is_consistent() {
            return Err(SeedFileError::Invalid(
                "live graph contains links to missing nodes".to_owned(),
            ));
        }

        for (index, snapshot) in self.session_stack.iter().enumerate() {
            if !snapshot.data.is_consistent() {
                return Err(SeedFileError::Invalid(format!(
                    "session level {index} contains links to missing nodes"
                )));
            }
            match snapshot.trigger_node_id.as_deref() {
                Some(trigger) if snapshot.data.contains(trigger) => {}
                Some(trigger) => {
                    return Err(SeedFileError::Invalid(format!(
                        "session level {index} refers to missing node `{trigger}`"
                    )));
                }
                None => {
                    return Err(SeedFileError::Invalid(format!(
                        "session level {index} has no trigger node"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SeedFileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SeedFileError> {
        let file: Self = serde_json::from_str(json)?;
        file.validate()?;
        Ok(file)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), SeedFileError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| SeedFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), levels = self.session_stack.len(), "saved seed file");
        Ok(())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, SeedFileError> {
        let json = fs::read_to_string(path).map_err(|source| SeedFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = Self::from_json(&json)?;
        info!(path = %path.display(), name = %file.name, "loaded seed file");
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Link, Node, NodeType};

    fn sample_workspace() -> Workspace {
        let mut workspace = Workspace::new(GraphData {
            nodes: vec![
                Node::new("a", "A", NodeType::Concept).as_root(),
                Node::new("b", "B", NodeType::Person),
            ],
            links: vec![Link::new("a", "b", "knows")],
        });
        workspace.enter_sub_graph("a").unwrap();
        workspace
    }

    #[test]
    fn wire_format_uses_camel_case() {
        let file = SeedFile::from_workspace(Some("f1".into()), "demo", &sample_workspace());
        let value = serde_json::to_value(&file).unwrap();
        assert_eq!(value["id"], "f1");
        assert!(value["lastModified"].is_i64());
        assert_eq!(value["sessionStack"][0]["triggerNodeId"], "a");
        assert_eq!(value["data"]["nodes"][0]["id"], "a");
    }

    #[test]
    fn json_round_trip_restores_the_workspace() {
        let workspace = sample_workspace();
        let file = SeedFile::from_workspace(None, "demo", &workspace);
        let restored = SeedFile::from_json(&file.to_json().unwrap())
            .unwrap()
            .into_workspace()
            .unwrap();

        assert_eq!(restored.stack(), workspace.stack());
        assert_eq!(restored.store().snapshot(), workspace.store().snapshot());
    }

    #[test]
    fn missing_trigger_is_rejected() {
        let mut file = SeedFile::from_workspace(None, "demo", &sample_workspace());
        file.session_stack[0].trigger_node_id = Some("gone".into());
        let error = file.validate().unwrap_err();
        assert!(matches!(error, SeedFileError::Invalid(message) if message.contains("gone")));
    }

    #[test]
    fn orphan_link_is_rejected() {
        let json = r#"{
            "id": "x", "name": "broken", "lastModified": 0,
            "data": {"nodes": [{"id": "a", "label": "A"}], "links": [{"sourceId": "a", "targetId": "b"}]}
        }"#;
        assert!(matches!(SeedFile::from_json(json), Err(SeedFileError::Invalid(_))));
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        assert!(matches!(SeedFile::from_json("{"), Err(SeedFileError::Json(_))));
    }
}
