use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use super::{Sink, SinkError};
use crate::entity::SyntheticEntity;

/// Writes `<dir>/<EntityType>.ndjson`, one JSON object per line.
#[derive(Debug, Clone)]
pub struct NdjsonSink {
    dir: PathBuf,
}

impl NdjsonSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, entity_type: &str) -> PathBuf {
        self.dir.join(format!("{entity_type}.ndjson"))
    }
}

#[async_trait]
impl Sink for NdjsonSink {
    async fn load(
        &mut self,
        entity_type: &str,
        entities: &[SyntheticEntity],
    ) -> Result<usize, SinkError> {
        let mut buf = Vec::new();
        for entity in entities {
            serde_json::to_writer(&mut buf, entity)?;
            buf.push(b'\n');
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(entity_type);
        tokio::fs::write(&path, buf).await?;

        info!("Wrote {} {} records to {}", entities.len(), entity_type, path.display());
        Ok(entities.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{FieldData, FieldValue};
    use catalog_identity::{Identifier, Identity};

    #[tokio::test]
    async fn test_writes_one_line_per_entity() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = NdjsonSink::new(dir.path().join("out"));

        let entities: Vec<SyntheticEntity> = (0..3)
            .map(|n| SyntheticEntity {
                entity_type: "ContactPoint".to_string(),
                identity: Identity {
                    identifier: Identifier::parse(format!("identifier{n:06}")).unwrap(),
                    had_primary_source: Identifier::bootstrap(),
                    identifier_in_primary_source: format!("ContactPoint-{n}"),
                    stable_target_id: Identifier::parse(format!("stabletarget{n:04}")).unwrap(),
                },
                fields: vec![(
                    "email".to_string(),
                    FieldData::List(vec![FieldValue::String(format!("user{n}@example.org"))]),
                )],
            })
            .collect();

        let written = sink.load("ContactPoint", &entities).await.unwrap();
        assert_eq!(written, 3);

        let contents = std::fs::read_to_string(sink.path_for("ContactPoint")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["entityType"], "ContactPoint");
        assert_eq!(first["identifierInPrimarySource"], "ContactPoint-0");
        assert_eq!(first["email"][0], "user0@example.org");
    }
}
