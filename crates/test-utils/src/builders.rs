#![allow(dead_code)]

use std::path::PathBuf;

use specpilot::config::{ConfigFile, RawConfigFile};
use specpilot::spec::{SpecMetadata, Task, TestSpec};
use specpilot::types::{Priority, ReportFormat};

/// Builder for `TestSpec` to simplify test setup.
pub struct TestSpecBuilder {
    spec: TestSpec,
}

impl TestSpecBuilder {
    pub fn new(goal: &str) -> Self {
        Self {
            spec: TestSpec {
                goal: goal.to_string(),
                start_url: "/".to_string(),
                steps: vec![],
                success_criteria: vec![],
                metadata: SpecMetadata::default(),
            },
        }
    }

    pub fn start_url(mut self, url: &str) -> Self {
        self.spec.start_url = url.to_string();
        self
    }

    pub fn step(mut self, step: &str) -> Self {
        self.spec.steps.push(step.to_string());
        self
    }

    pub fn criterion(mut self, criterion: &str) -> Self {
        self.spec.success_criteria.push(criterion.to_string());
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.spec.metadata.name = Some(name.to_string());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.spec.metadata.priority = priority;
        self
    }

    pub fn depends_on(mut self, id: &str) -> Self {
        self.spec.metadata.dependencies.push(id.to_string());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.spec.metadata.timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> TestSpec {
        self.spec
    }

    pub fn task(self, id: &str) -> Task {
        Task::new(id, self.spec)
    }
}

/// A task with a minimal valid spec.
pub fn task(id: &str) -> Task {
    TestSpecBuilder::new(&format!("goal of {id}")).task(id)
}

/// Minimal tasks for each identifier, in order.
pub fn tasks(ids: &[&str]) -> Vec<Task> {
    ids.iter().map(|id| task(id)).collect()
}

/// Builder for a validated `ConfigFile`.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn specs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.run.specs_dir = dir.into();
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.config.run.pattern = pattern.to_string();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.run.concurrency = n;
        self
    }

    pub fn deadline_secs(mut self, secs: u64) -> Self {
        self.config.run.deadline_secs = Some(secs);
        self
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.config.run.base_url = url.to_string();
        self
    }

    pub fn report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.report.dir = dir.into();
        self
    }

    pub fn report_format(mut self, format: ReportFormat) -> Self {
        self.config.report.format = format;
        self
    }

    pub fn required_env(mut self, var: &str) -> Self {
        self.config.agent.required_env = Some(var.to_string());
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
