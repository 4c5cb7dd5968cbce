use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{
    config::{Config, OutputSettings},
    error::{CompositionError, ProjectError, Result},
    profiles::SelectionMode,
    slides::{item::ImageItem, list::SlideList},
};

/// A saved slideshow: output settings, selection mode and the slides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub mode: SelectionMode,
    pub output: OutputSettings,
    pub slides: SlideList,
}

impl Project {
    /// Build a project from image paths using the configured defaults
    pub fn from_images<I, P>(paths: I, config: &Config) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let slides = paths
            .into_iter()
            .map(|path| ImageItem::with_defaults(path, &config.defaults))
            .collect();

        Self {
            mode: SelectionMode::Manual,
            output: config.output.clone(),
            slides,
        }
    }

    /// Load a project file.
    ///
    /// Relative image paths are resolved against the directory holding the file,
    /// so the loaded paths are usable from the current directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ProjectError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let mut project: Project = toml::from_str(&content).map_err(|e| ProjectError::ParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        if let Some(base) = path.parent() {
            for item in project.slides.iter_mut() {
                item.resolve_path(base);
            }
        }

        info!("Loaded project {:?} with {} slides", path, project.slides.len());
        Ok(project)
    }

    /// Write the project as TOML.
    ///
    /// Image paths inside the file's directory are written relative to it,
    /// everything else as an absolute path.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let base = absolute(path.parent().unwrap_or_else(|| Path::new("")));

        let mut saved = self.clone();
        for item in saved.slides.iter_mut() {
            item.map_paths(|image| {
                let image = absolute(image);
                match image.strip_prefix(&base) {
                    Ok(relative) => relative.to_path_buf(),
                    Err(_) => image,
                }
            });
        }

        let content = toml::to_string_pretty(&saved).map_err(|e| ProjectError::SerializeFailed {
            reason: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        debug!("Saved project to {:?}", path);
        Ok(())
    }

    /// Total running time once neighbouring slides overlap
    pub fn duration(&self) -> f64 {
        crate::video::timeline::Timeline::build(&self.slides, self.output.overlap, self.output.fps)
            .map(|timeline| timeline.total_duration())
            .unwrap_or(0.0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.slides.is_empty() {
            return Err(CompositionError::NoImages.into());
        }

        self.output.validate()?;
        for item in self.slides.iter() {
            item.validate()?;
        }
        Ok(())
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transitions::{Side, TransitionKind};
    use crate::video::types::AspectRatio;
    use tempfile::tempdir;

    #[test]
    fn test_from_images_uses_defaults() {
        let mut config = Config::default();
        config.defaults.duration = 4.0;
        config.output.aspect_ratio = AspectRatio::Square;

        let project = Project::from_images(["a.jpg", "b.jpg"], &config);
        assert_eq!(project.slides.len(), 2);
        assert_eq!(project.slides.get(1).unwrap().duration, 4.0);
        assert_eq!(project.output.aspect_ratio, AspectRatio::Square);
        assert_eq!(project.mode, SelectionMode::Manual);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("trip.toml");

        let mut project = Project::from_images([dir.path().join("1.jpg")], &Config::default());
        project.mode = SelectionMode::Random { seed: Some(3) };
        {
            let item = project.slides.get_mut(0).unwrap();
            item.end_transition = TransitionKind::Slide(Side::Bottom);
            item.effect = "zoom_in".to_string();
        }

        project.save(&file).unwrap();
        let loaded = Project::load(&file).unwrap();
        assert_eq!(loaded, project);
    }

    #[test]
    fn test_relative_paths_resolve_against_project_dir() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("show.toml");
        std::fs::write(
            &file,
            "[output]\naspect_ratio = \"1:1\"\n\n[[slides]]\npath = \"photos/a.jpg\"\nduration = 5.0\nend_transition = \"Slide Out Left\"\n",
        )
        .unwrap();

        let project = Project::load(&file).unwrap();
        let item = project.slides.get(0).unwrap();
        assert_eq!(item.path, dir.path().join("photos/a.jpg"));
        assert_eq!(item.duration, 5.0);
        assert_eq!(item.start_transition, TransitionKind::Fade);
        assert_eq!(item.end_transition, TransitionKind::Slide(Side::Left));
        assert_eq!(project.output.aspect_ratio, AspectRatio::Square);
    }

    #[test]
    fn test_resave_through_relative_project_path() {
        let cwd = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir_in(&cwd).unwrap();
        let trip = dir.path().strip_prefix(&cwd).unwrap().join("trip");
        std::fs::create_dir_all(trip.join("photos")).unwrap();

        let file = trip.join("show.toml");
        std::fs::write(&file, "[[slides]]\npath = \"photos/a.jpg\"\n").unwrap();

        let project = Project::load(&file).unwrap();
        assert_eq!(project.slides.get(0).unwrap().path, trip.join("photos/a.jpg"));

        // Saving and loading again must not nest the directory a second time
        project.save(&file).unwrap();
        let content = std::fs::read_to_string(&file).unwrap();
        assert!(content.contains("photos/a.jpg"));
        assert!(!content.contains("trip"));

        let reloaded = Project::load(&file).unwrap();
        assert_eq!(reloaded, project);
    }

    #[test]
    fn test_paths_outside_project_dir_saved_absolute() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("show.toml");

        let project = Project::from_images(["elsewhere/b.jpg"], &Config::default());
        project.save(&file).unwrap();

        let loaded = Project::load(&file).unwrap();
        assert_eq!(
            loaded.slides.get(0).unwrap().path,
            std::env::current_dir().unwrap().join("elsewhere/b.jpg")
        );
    }

    #[test]
    fn test_validate() {
        assert!(Project::default().validate().is_err());

        let mut project = Project::from_images(["a.jpg"], &Config::default());
        assert!(project.validate().is_ok());

        project.slides.get_mut(0).unwrap().duration = 100.0;
        assert!(project.validate().is_err());
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();
        assert!(Project::load(dir.path().join("missing.toml")).is_err());

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[[slides]\npath = ").unwrap();
        assert!(Project::load(&broken).is_err());
    }
}
