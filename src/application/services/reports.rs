//! Systems report generation

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::error_ext::IoResultExt;
use crate::application::services::SystemResolver;
use crate::application::ApplicationResult;
use crate::domain::{attachment_file_name, Report, ReportFormat, ReportScope, DEFAULT_PDF_NAME};
use crate::infrastructure::traits::ServerApi;

pub struct ReportService {
    api: Arc<dyn ServerApi>,
    resolver: Arc<SystemResolver>,
    output_dir: PathBuf,
}

impl ReportService {
    pub fn new(
        api: Arc<dyn ServerApi>,
        resolver: Arc<SystemResolver>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            api,
            resolver,
            output_dir,
        }
    }

    /// Fetch a report for the org, or for one of its environments.
    #[instrument(skip(self))]
    pub fn fetch(
        &self,
        org: &str,
        environment: Option<&str>,
        format: ReportFormat,
    ) -> ApplicationResult<Report> {
        let scope = match environment {
            Some(name) => ReportScope::Environment(self.resolver.environment(org, Some(name))?.id),
            None => ReportScope::Org(org.to_string()),
        };
        Ok(self.api.report(&scope, format)?)
    }

    /// Write the report body under the name the server suggested.
    pub fn save(&self, report: &Report) -> ApplicationResult<PathBuf> {
        let name = attachment_file_name(report.content_disposition.as_deref(), DEFAULT_PDF_NAME);
        let path = self.output_dir.join(name);
        fs::write(&path, &report.body).with_path_context("failed to write report", &path)?;
        info!("saved {} byte report to {}", report.body.len(), path.display());
        Ok(path)
    }
}
