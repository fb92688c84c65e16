use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::sync::EntityRef;

/// Work that runs outside the request path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobKind {
    /// Re-project every descendant document of an entity.
    UpdateDescendants(EntityRef),
    /// Remove every descendant document of a deleted entity.
    DeleteDescendants(EntityRef),
    /// Parse a METS file into a DIP.
    ImportMets { dip_id: i64, mets_path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub kind: JobKind,
}

impl Job {
    pub fn new(kind: JobKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
        }
    }

    pub fn update_descendants(entity: EntityRef) -> Self {
        Self::new(JobKind::UpdateDescendants(entity))
    }

    pub fn delete_descendants(entity: EntityRef) -> Self {
        Self::new(JobKind::DeleteDescendants(entity))
    }

    pub fn import_mets(dip_id: i64, mets_path: PathBuf) -> Self {
        Self::new(JobKind::ImportMets { dip_id, mets_path })
    }

    /// Task name recorded with results.
    pub fn name(&self) -> &'static str {
        match self.kind {
            JobKind::UpdateDescendants(_) => "update_descendants",
            JobKind::DeleteDescendants(_) => "delete_descendants",
            JobKind::ImportMets { .. } => "import_mets",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub job_id: String,
    pub name: &'static str,
    pub success: bool,
    pub error: Option<String>,
}

impl JobResult {
    pub fn success(job: &Job) -> Self {
        Self {
            job_id: job.id.clone(),
            name: job.name(),
            success: true,
            error: None,
        }
    }

    pub fn failure(job: &Job, error: String) -> Self {
        Self {
            job_id: job.id.clone(),
            name: job.name(),
            success: false,
            error: Some(error),
        }
    }
}
