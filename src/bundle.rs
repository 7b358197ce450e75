use log::{error, info};
use std::io;
use std::path::{Path, PathBuf};
use std::{fs, iter};
use thiserror::Error;

use crate::answers::{keys, AnswerSet};
use crate::engine::RenderError;
use crate::error::GenerateError;
use crate::render::{ArtifactKind, ArtifactRenderer};
use crate::selector::TemplateVariant;

/// Deployment targets that get a container definition.
pub const CONTAINER_TARGETS: &[&str] = &["docker", "docker_compose", "kubernetes"];

/// Artifacts every bundle contains, in write order.
const REQUIRED: &[ArtifactKind] = &[
    ArtifactKind::EntryScript,
    ArtifactKind::Configuration,
    ArtifactKind::DependencyManifest,
];

pub fn is_containerized(answers: &AnswerSet) -> bool {
    answers
        .text(keys::DEPLOYMENT_TARGET)
        .is_some_and(|target| CONTAINER_TARGETS.contains(&target.trim()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Relative to the bundle directory.
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBundle {
    pub directory: PathBuf,
    artifacts: Vec<Artifact>,
}

impl OutputBundle {
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            artifacts: Vec::new(),
        }
    }

    /// Adds an artifact; one already at the same path is replaced.
    pub fn push(&mut self, artifact: Artifact) {
        match self.artifacts.iter_mut().find(|a| a.path == artifact.path) {
            Some(existing) => *existing = artifact,
            None => self.artifacts.push(artifact),
        }
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }

    pub fn contains(&self, kind: ArtifactKind) -> bool {
        self.get(kind).is_some()
    }
}

#[derive(Error, Debug)]
#[error("Failed to write {}{}: {source}", .path.display(), written_note(.written))]
pub struct WriteError {
    pub path: PathBuf,
    /// Files this run had already written when the failure happened. Includes `path` when
    /// the failure came after its content was written.
    pub written: Vec<PathBuf>,
    #[source]
    pub source: io::Error,
}

fn written_note(written: &[PathBuf]) -> String {
    if written.is_empty() {
        String::new()
    } else {
        let files: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
        format!(" (already written: {})", files.join(", "))
    }
}

pub struct BundleAssembler {
    renderer: ArtifactRenderer,
    dry_run: bool,
}

impl BundleAssembler {
    pub fn new(renderer: ArtifactRenderer, dry_run: bool) -> Self {
        Self { renderer, dry_run }
    }

    /// Ensures that the specified directory exists, creating it if necessary.
    fn ensure_dir_exists(path: &Path) -> io::Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Renders the bundle for `agent_name` under `target_root` without touching the filesystem.
    pub fn plan(
        &self,
        target_root: &Path,
        agent_name: &str,
        variant: &TemplateVariant,
        answers: &AnswerSet,
    ) -> Result<OutputBundle, RenderError> {
        let mut bundle = OutputBundle::new(target_root.join(agent_name));

        let container = is_containerized(answers).then_some(ArtifactKind::ContainerDefinition);
        let kinds = REQUIRED
            .iter()
            .copied()
            .chain(container)
            .chain(iter::once(ArtifactKind::Documentation));

        for kind in kinds {
            bundle.push(Artifact {
                kind,
                path: PathBuf::from(kind.file_name()),
                content: self.renderer.render(kind, variant, answers)?,
            });
        }
        Ok(bundle)
    }

    /// Renders and writes the bundle. Stops at the first failed write.
    pub fn assemble(
        &self,
        target_root: &Path,
        agent_name: &str,
        variant: &TemplateVariant,
        answers: &AnswerSet,
    ) -> Result<OutputBundle, GenerateError> {
        let bundle = self.plan(target_root, agent_name, variant, answers)?;
        self.write(&bundle)?;
        Ok(bundle)
    }

    pub fn write(&self, bundle: &OutputBundle) -> Result<(), WriteError> {
        if self.dry_run {
            for artifact in bundle.artifacts() {
                info!(
                    "[DRY RUN] Would write: {:?}",
                    bundle.directory.join(&artifact.path)
                );
            }
            return Ok(());
        }

        Self::ensure_dir_exists(&bundle.directory).map_err(|source| {
            error!("Failed to create directory: {:?}", bundle.directory);
            WriteError {
                path: bundle.directory.clone(),
                written: Vec::new(),
                source,
            }
        })?;

        write_files(bundle, |artifact, path| {
            if artifact.kind == ArtifactKind::EntryScript {
                mark_executable(path)
            } else {
                Ok(())
            }
        })
    }
}

/// Writes each artifact, then runs `finish` on it. A file counts as written as soon as its
/// content is on disk, so a failing `finish` reports its own path as written too.
fn write_files<F>(bundle: &OutputBundle, mut finish: F) -> Result<(), WriteError>
where
    F: FnMut(&Artifact, &Path) -> io::Result<()>,
{
    let mut written = Vec::new();
    for artifact in bundle.artifacts() {
        let path = bundle.directory.join(&artifact.path);
        if let Err(source) = fs::write(&path, &artifact.content) {
            error!("Failed to write rendered content to file: {:?}", path);
            return Err(WriteError {
                path,
                written,
                source,
            });
        }
        written.push(path.clone());
        if let Err(source) = finish(artifact, &path) {
            error!("Failed to set permissions on: {:?}", path);
            return Err(WriteError {
                path,
                written,
                source,
            });
        }
        info!("Generated: {:?}", path);
    }
    Ok(())
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
