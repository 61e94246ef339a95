//! Project and report persistence.
//!
//! [`AuditStore`] is the repository seam; [`JsonFileStore`] keeps two JSON
//! documents (`projects.json`, `reports.json`) under a data directory and
//! rewrites them atomically through a temp file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::Project;
use crate::report::EvaluationReport;

const PROJECTS_FILE: &str = "projects.json";
const REPORTS_FILE: &str = "reports.json";

/// Repository of projects and their evaluation reports.
pub trait AuditStore: Send + Sync {
    fn list_projects(&self) -> Result<Vec<Project>, StoreError>;

    fn get_project(&self, id: &str) -> Result<Option<Project>, StoreError>;

    /// Insert or replace a project by id.
    fn save_project(&self, project: &Project) -> Result<(), StoreError>;

    /// Delete a project and every report that belongs to it.
    fn delete_project(&self, id: &str) -> Result<(), StoreError>;

    fn list_reports(&self) -> Result<Vec<EvaluationReport>, StoreError>;

    /// Reports of one project, ordered by iteration.
    fn project_reports(&self, project_id: &str) -> Result<Vec<EvaluationReport>, StoreError>;

    fn get_report(&self, id: &Uuid) -> Result<Option<EvaluationReport>, StoreError>;

    fn delete_report(&self, id: &Uuid) -> Result<(), StoreError>;

    /// The iteration number the next report of this project will get.
    fn next_iteration(&self, project_id: &str) -> Result<u32, StoreError>;

    /// Persist a report, stamping it with the next iteration number and
    /// updating the project's evaluation count and last score.
    fn save_report(&self, report: EvaluationReport) -> Result<EvaluationReport, StoreError>;
}

/// File-backed store holding everything in two JSON documents.
pub struct JsonFileStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| io_error(&root, source))?;
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn projects(&self) -> Result<Vec<Project>, StoreError> {
        read_document(&self.root.join(PROJECTS_FILE))
    }

    fn reports(&self) -> Result<Vec<EvaluationReport>, StoreError> {
        read_document(&self.root.join(REPORTS_FILE))
    }

    fn write_projects(&self, projects: &[Project]) -> Result<(), StoreError> {
        write_document(&self.root.join(PROJECTS_FILE), projects)
    }

    fn write_reports(&self, reports: &[EvaluationReport]) -> Result<(), StoreError> {
        write_document(&self.root.join(REPORTS_FILE), reports)
    }
}

fn next_iteration_for(project: &Project, reports: &[EvaluationReport]) -> u32 {
    let highest = reports
        .iter()
        .filter(|r| r.project_id == project.id)
        .map(|r| r.iteration)
        .max()
        .unwrap_or(0);
    highest.max(project.evaluation_count) + 1
}

impl AuditStore for JsonFileStore {
    fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let _guard = self.guard();
        self.projects()
    }

    fn get_project(&self, id: &str) -> Result<Option<Project>, StoreError> {
        let _guard = self.guard();
        Ok(self.projects()?.into_iter().find(|p| p.id == id))
    }

    fn save_project(&self, project: &Project) -> Result<(), StoreError> {
        let _guard = self.guard();
        let mut projects = self.projects()?;
        match projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project.clone(),
            None => projects.push(project.clone()),
        }
        self.write_projects(&projects)
    }

    fn delete_project(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.guard();
        let mut projects = self.projects()?;
        let before = projects.len();
        projects.retain(|p| p.id != id);
        if projects.len() == before {
            return Err(StoreError::ProjectNotFound(id.to_string()));
        }

        let mut reports = self.reports()?;
        reports.retain(|r| r.project_id != id);

        self.write_reports(&reports)?;
        self.write_projects(&projects)?;
        tracing::info!(project = %id, "deleted project and its reports");
        Ok(())
    }

    fn list_reports(&self) -> Result<Vec<EvaluationReport>, StoreError> {
        let _guard = self.guard();
        self.reports()
    }

    fn project_reports(&self, project_id: &str) -> Result<Vec<EvaluationReport>, StoreError> {
        let _guard = self.guard();
        let mut reports: Vec<_> = self
            .reports()?
            .into_iter()
            .filter(|r| r.project_id == project_id)
            .collect();
        reports.sort_by_key(|r| r.iteration);
        Ok(reports)
    }

    fn get_report(&self, id: &Uuid) -> Result<Option<EvaluationReport>, StoreError> {
        let _guard = self.guard();
        Ok(self.reports()?.into_iter().find(|r| &r.id == id))
    }

    fn delete_report(&self, id: &Uuid) -> Result<(), StoreError> {
        let _guard = self.guard();
        let mut reports = self.reports()?;
        let before = reports.len();
        reports.retain(|r| &r.id != id);
        if reports.len() == before {
            return Err(StoreError::ReportNotFound(*id));
        }
        self.write_reports(&reports)
    }

    fn next_iteration(&self, project_id: &str) -> Result<u32, StoreError> {
        let _guard = self.guard();
        let project = self
            .projects()?
            .into_iter()
            .find(|p| p.id == project_id)
            .ok_or_else(|| StoreError::ProjectNotFound(project_id.to_string()))?;
        Ok(next_iteration_for(&project, &self.reports()?))
    }

    fn save_report(&self, mut report: EvaluationReport) -> Result<EvaluationReport, StoreError> {
        let _guard = self.guard();
        let mut projects = self.projects()?;
        let project = projects
            .iter_mut()
            .find(|p| p.id == report.project_id)
            .ok_or_else(|| StoreError::ProjectNotFound(report.project_id.clone()))?;

        let mut reports = self.reports()?;
        report.iteration = next_iteration_for(project, &reports);
        project.evaluation_count = report.iteration;
        project.last_score = Some(report.overall_score);

        reports.push(report.clone());
        self.write_reports(&reports)?;
        self.write_projects(&projects)?;

        tracing::debug!(
            project = %report.project_id,
            iteration = report.iteration,
            "saved report"
        );
        Ok(report)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Read a JSON array document; a missing file is an empty collection.
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error(path, e)),
    };
    serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
        path: path.display().to_string(),
        source,
    })
}

fn write_document<T: Serialize>(path: &Path, items: &[T]) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(items).map_err(|source| StoreError::Corrupt {
        path: path.display().to_string(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|source| io_error(&tmp, source))?;
    fs::rename(&tmp, path).map_err(|source| io_error(path, source))
}
