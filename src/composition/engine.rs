use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    config::{Config, OutputSettings},
    effects::{EffectConfig, EffectRegistry},
    error::{CompositionError, EffectError, Result, SlideshowError, VideoError},
    profiles::ProfileRegistry,
    slides::{ImageLoader, Project, SlideList},
    video::{
        check_ffmpeg_available, format_time, EncoderSettings, FfmpegSink, Frame, FrameRenderer,
        FrameSink, PngSequenceSink, PreparedSlide, SinkConfig, Timeline,
    },
};

/// Outcome of a finished render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    /// Where the video or frames were written, if anywhere
    pub output: Option<PathBuf>,
    pub slides: usize,
    pub frame_count: usize,
    pub duration: f64,
    pub resolution: (u32, u32),
    pub estimated_size_mb: f64,
}

/// Turns a [`Project`] into video frames and hands them to a sink
///
/// The pipeline:
/// 1. Selection - apply the project's selection mode to a copy of its slides
/// 2. Image Loading - decode and fit every image onto the output canvas
/// 3. Timeline - place the slides in time, overlapping their transitions
/// 4. Preparation - bake static effects and overlays into each slide
/// 5. Rendering - draw frames in parallel batches and push them to the sink
pub struct SlideshowEngine {
    config: Config,
    effects: Arc<EffectRegistry>,
    profiles: ProfileRegistry,
}

impl SlideshowEngine {
    pub fn new(config: Config) -> Self {
        Self::with_registries(config, EffectRegistry::new(), ProfileRegistry::new())
    }

    /// Create an engine with custom effect and profile registries
    pub fn with_registries(config: Config, effects: EffectRegistry, profiles: ProfileRegistry) -> Self {
        Self {
            config,
            effects: Arc::new(effects),
            profiles,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    /// Render the project to an MP4 file with ffmpeg
    pub async fn render<P: AsRef<Path>>(&self, project: &Project, output_path: P) -> Result<RenderSummary> {
        let output_path = ensure_mp4_extension(output_path.as_ref());

        if !check_ffmpeg_available() {
            return Err(VideoError::EncodingFailed {
                reason: "FFmpeg not found. Please install FFmpeg.".to_string(),
            }
            .into());
        }

        info!("🎬 Rendering slideshow to {:?}", output_path);
        let sink = FfmpegSink::new(EncoderSettings::from_output(&output_path, &project.output));
        let (mut summary, _) = self.render_to_sink(project, sink).await?;
        summary.output = Some(output_path);

        info!("🎉 Slideshow saved to {:?}", summary.output);
        Ok(summary)
    }

    /// Render the project as a numbered PNG sequence
    pub async fn export_frames<P: AsRef<Path>>(&self, project: &Project, dir: P) -> Result<RenderSummary> {
        let dir = dir.as_ref().to_path_buf();
        info!("🖼️  Exporting frames to {:?}", dir);

        let (mut summary, _) = self.render_to_sink(project, PngSequenceSink::new(&dir)).await?;
        summary.output = Some(dir);
        Ok(summary)
    }

    /// Render every frame of the project into `sink`, returning the sink when done
    pub async fn render_to_sink<S>(&self, project: &Project, sink: S) -> Result<(RenderSummary, S)>
    where
        S: FrameSink + 'static,
    {
        // Step 1: Selection
        let slides = self.resolve_slides(project)?;
        let output = project.output.clone();
        let resolution = output.resolution();

        info!(
            "   {} slides, {} ({}x{}), {} fps, quality {}",
            slides.len(),
            output.aspect_ratio,
            resolution.0,
            resolution.1,
            output.fps,
            output.quality
        );

        // Step 2: Image Loading
        let frames = self.load_images(&slides, &output).await?;

        // Steps 3 and 4: Timeline and Preparation
        let renderer = self.build_renderer(&slides, frames, &output).await?;
        let timeline = renderer.timeline();
        let duration = timeline.total_duration();
        let frame_count = renderer.frame_count();
        info!(
            "⏱️  Timeline: {} ({:.2}s), {} frames",
            format_time(duration),
            duration,
            frame_count
        );

        // Step 5: Rendering
        let sink = self.encode(renderer, sink, output.fps).await?;

        let summary = RenderSummary {
            output: None,
            slides: slides.len(),
            frame_count,
            duration,
            resolution,
            estimated_size_mb: output.quality.estimated_size_mb(duration),
        };
        info!("   ✅ Rendered {} frames", summary.frame_count);
        Ok((summary, sink))
    }

    /// Render the single frame shown at `time` seconds.
    ///
    /// Only the images on screen at that moment are loaded.
    pub async fn preview(&self, project: &Project, time: f64) -> Result<Frame> {
        let slides = self.resolve_slides(project)?;
        let output = project.output.clone();

        let timeline = Timeline::build(&slides, output.overlap, output.fps)?;
        let duration = timeline.total_duration();
        if !(0.0..=duration).contains(&time) {
            return Err(CompositionError::PreviewOutOfRange { time, duration }.into());
        }

        // The very end of the show has no slide on screen, show the last frame instead
        let last_frame = timeline.frame_time(timeline.frame_count().saturating_sub(1));
        let time = time.min(last_frame);

        let active: Vec<usize> = timeline.active_at(time).map(|span| span.index).collect();
        let visible: SlideList = active
            .iter()
            .filter_map(|&index| slides.get(index).cloned())
            .collect();
        debug!("Rendering preview at {:.2}s from {} of {} slides", time, visible.len(), slides.len());

        let frames = self.load_images(&visible, &output).await?;
        let prepared = self.prepare_slides(&visible, frames).await?;

        let mut partial: Vec<Option<PreparedSlide>> = (0..slides.len()).map(|_| None).collect();
        for (index, slide) in active.into_iter().zip(prepared) {
            partial[index] = Some(slide);
        }

        let (frame_size, background) = (output.resolution(), output.background);
        let renderer = FrameRenderer::partial(partial, timeline, frame_size, background, self.config.effect.clone())?;

        tokio::task::spawn_blocking(move || renderer.render_at(time))
            .await
            .map_err(join_error)?
    }

    /// Apply the selection mode and check the result
    fn resolve_slides(&self, project: &Project) -> Result<SlideList> {
        info!("🎲 Step 1: Selecting transitions and effects ({})", project.mode);
        project.validate()?;

        let mut slides = project.slides.clone();
        project.mode.apply(&mut slides, &self.profiles, &self.effects)?;

        for item in slides.iter() {
            if !self.effects.is_known(&item.effect) {
                return Err(EffectError::NotFound {
                    name: item.effect.clone(),
                }
                .into());
            }
            debug!(
                "   {} | {} -> {} | effect {} | overlay {}",
                item,
                item.start_transition,
                item.end_transition,
                item.effect,
                item.overlay.describe()
            );
        }

        Ok(slides)
    }

    async fn load_images(&self, slides: &SlideList, output: &OutputSettings) -> Result<Vec<Frame>> {
        info!("📷 Step 2: Loading {} images...", slides.len());

        let paths: Vec<PathBuf> = slides.iter().map(|item| item.path.clone()).collect();
        let loader = ImageLoader::new(output.resolution(), output.background);
        let threads = self.config.render.threads;

        tokio::task::spawn_blocking(move || with_thread_pool(threads, || loader.load_all(&paths)))
            .await
            .map_err(join_error)?
    }

    async fn build_renderer(
        &self,
        slides: &SlideList,
        frames: Vec<Frame>,
        output: &OutputSettings,
    ) -> Result<FrameRenderer> {
        info!("✨ Step 3: Building timeline and preparing slides...");

        let timeline = Timeline::build(slides, output.overlap, output.fps)?;
        let prepared = self.prepare_slides(slides, frames).await?;

        FrameRenderer::new(
            prepared,
            timeline,
            output.resolution(),
            output.background,
            self.config.effect.clone(),
        )
    }

    /// Bake static effects and overlays into each loaded image
    async fn prepare_slides(&self, slides: &SlideList, frames: Vec<Frame>) -> Result<Vec<PreparedSlide>> {
        let items = slides.items().to_vec();
        let effects = Arc::clone(&self.effects);
        let effect_config: EffectConfig = self.config.effect.clone();
        let threads = self.config.render.threads;

        tokio::task::spawn_blocking(move || {
            with_thread_pool(threads, || {
                frames
                    .into_par_iter()
                    .zip(items.par_iter())
                    .map(|(frame, item)| PreparedSlide::new(frame, item, &effects, &effect_config))
                    .collect::<Result<Vec<_>>>()
            })
        })
        .await
        .map_err(join_error)?
    }

    async fn encode<S>(&self, renderer: FrameRenderer, mut sink: S, fps: u32) -> Result<S>
    where
        S: FrameSink + 'static,
    {
        info!("🎞️  Step 4: Rendering frames...");

        let threads = self.config.render.threads;
        let batch_size = self.config.render.batch_size.max(1);

        tokio::task::spawn_blocking(move || {
            let (width, height) = renderer.frame_size();
            let frame_count = renderer.frame_count();

            sink.begin(&SinkConfig {
                width,
                height,
                fps,
                frame_count,
            })?;

            let result = with_thread_pool(threads, || -> Result<()> {
                let mut start = 0;
                while start < frame_count {
                    let end = (start + batch_size).min(frame_count);
                    let batch = renderer.render_batch(start..end)?;
                    for (offset, frame) in batch.iter().enumerate() {
                        sink.push_frame(start + offset, frame)?;
                    }
                    debug!("Rendered frames {}..{} of {}", start, end, frame_count);
                    start = end;
                }
                Ok(())
            });

            match result {
                Ok(()) => {
                    sink.end()?;
                    Ok(sink)
                }
                Err(e) => {
                    warn!("Rendering stopped: {}", e);
                    if let Err(abort_error) = sink.abort() {
                        warn!("Failed to discard partial output: {}", abort_error);
                    }
                    Err(e)
                }
            }
        })
        .await
        .map_err(join_error)?
    }
}

/// Run `work` on a rayon pool with `threads` workers, or the global pool if
/// one cannot be built.
fn with_thread_pool<T, F>(threads: usize, work: F) -> T
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(threads.max(1)).build() {
        Ok(pool) => pool.install(work),
        Err(e) => {
            warn!("Falling back to the global thread pool: {}", e);
            work()
        }
    }
}

fn join_error(e: tokio::task::JoinError) -> SlideshowError {
    SlideshowError::generic(format!("render task failed: {}", e))
}

/// Append `.mp4` unless the path already ends with it
pub fn ensure_mp4_extension(path: &Path) -> PathBuf {
    let is_mp4 = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("mp4"))
        .unwrap_or(false);

    if is_mp4 {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".mp4");
        PathBuf::from(name)
    }
}

/// Timestamped output file name inside `dir`
pub fn default_output_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("slideshow_%Y%m%d_%H%M%S.mp4");
    dir.join(stamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Effect;
    use crate::profiles::SelectionMode;
    use crate::video::InMemorySink;
    use image::{Rgb, RgbImage};
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Animated effect that fails in the second half of its slide
    struct FailsHalfway;

    impl Effect for FailsHalfway {
        fn name(&self) -> &str {
            "fails_halfway"
        }

        fn label(&self) -> &str {
            "Fails Halfway"
        }

        fn description(&self) -> &str {
            "Errors once the slide is half over"
        }

        fn apply_effect(&self, _frame: &mut Frame, progress: f32, _config: &EffectConfig) -> Result<()> {
            if progress > 0.5 {
                return Err(EffectError::EffectFailed {
                    effect: "fails_halfway".to_string(),
                    reason: "out of film".to_string(),
                }
                .into());
            }
            Ok(())
        }

        fn is_animated(&self) -> bool {
            true
        }
    }

    /// Records the calls a sink receives
    #[derive(Default, Debug)]
    struct RecordingSink {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingSink {
        fn record(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl FrameSink for RecordingSink {
        fn begin(&mut self, _config: &SinkConfig) -> Result<()> {
            self.record("begin".to_string());
            Ok(())
        }

        fn push_frame(&mut self, index: usize, _frame: &Frame) -> Result<()> {
            self.record(format!("frame {}", index));
            Ok(())
        }

        fn end(&mut self) -> Result<()> {
            self.record("end".to_string());
            Ok(())
        }

        fn abort(&mut self) -> Result<()> {
            self.record("abort".to_string());
            Ok(())
        }
    }

    fn fixture_project(dir: &Path) -> Project {
        let mut paths = Vec::new();
        for (name, color) in [("a.png", [255, 0, 0]), ("b.png", [0, 0, 255])] {
            let path = dir.join(name);
            RgbImage::from_pixel(32, 18, Rgb(color)).save(&path).unwrap();
            paths.push(path);
        }

        let mut config = Config::default();
        config.output.base_height = 36;
        config.output.fps = 20;
        config.defaults.duration = 1.0;
        config.defaults.start_duration = 0.5;
        config.defaults.end_duration = 0.5;

        Project::from_images(paths, &config)
    }

    fn small_engine() -> SlideshowEngine {
        let mut config = Config::default();
        config.render.threads = 2;
        config.render.batch_size = 4;
        SlideshowEngine::new(config)
    }

    #[tokio::test]
    async fn test_render_to_memory() {
        let dir = tempdir().unwrap();
        let project = fixture_project(dir.path());

        let (summary, sink) = small_engine()
            .render_to_sink(&project, InMemorySink::new())
            .await
            .unwrap();

        // Second slide starts 0.25s early: 1.75s at 20 fps
        assert_eq!(summary.resolution, (64, 36));
        assert_eq!(summary.frame_count, 35);
        assert!((summary.duration - 1.75).abs() < 1e-9);

        assert!(sink.is_finished());
        assert_eq!(sink.frames().len(), 35);
        assert_eq!(sink.config().unwrap().width, 64);

        // Frame 0 is fully faded out, frame 10 (0.5s) is solid red
        assert_eq!(sink.frames()[0].1.get_pixel(32, 18), [0, 0, 0]);
        assert_eq!(sink.frames()[10].1.get_pixel(32, 18), [255, 0, 0]);
        for (expected, (index, _)) in sink.frames().iter().enumerate() {
            assert_eq!(*index, expected);
        }
    }

    #[tokio::test]
    async fn test_profile_mode_render() {
        let dir = tempdir().unwrap();
        let mut project = fixture_project(dir.path());
        project.mode = SelectionMode::Profile {
            name: "vintage".to_string(),
        };

        let (summary, sink) = small_engine()
            .render_to_sink(&project, InMemorySink::new())
            .await
            .unwrap();
        assert_eq!(sink.frames().len(), summary.frame_count);

        // Sepia warms pure blue toward brown: red channel rises
        let mid_blue = &sink.frames()[28].1;
        let pixel = mid_blue.get_pixel(32, 18);
        assert!(pixel[0] > 0, "sepia pixel was {:?}", pixel);
    }

    #[tokio::test]
    async fn test_empty_project() {
        let result = small_engine()
            .render_to_sink(&Project::default(), InMemorySink::new())
            .await;
        assert!(matches!(
            result,
            Err(SlideshowError::Composition(CompositionError::NoImages))
        ));
    }

    #[tokio::test]
    async fn test_missing_image_names_path() {
        let dir = tempdir().unwrap();
        let mut project = fixture_project(dir.path());
        project.slides.get_mut(1).unwrap().path = dir.path().join("gone.png");

        let err = small_engine()
            .render_to_sink(&project, InMemorySink::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("gone.png"));
    }

    #[tokio::test]
    async fn test_failed_render_aborts_sink() {
        let dir = tempdir().unwrap();
        let mut project = fixture_project(dir.path());
        project.slides.get_mut(1).unwrap().effect = "fails_halfway".to_string();

        let mut effects = EffectRegistry::new();
        effects.register("fails_halfway", || Box::new(FailsHalfway));
        let mut config = Config::default();
        config.render.threads = 2;
        config.render.batch_size = 4;
        let engine = SlideshowEngine::with_registries(config, effects, ProfileRegistry::new());

        let sink = RecordingSink::default();
        let events = Arc::clone(&sink.events);
        let err = engine.render_to_sink(&project, sink).await.unwrap_err();
        assert!(err.to_string().contains("out of film"));

        let events = events.lock().unwrap();
        assert_eq!(events.first().map(String::as_str), Some("begin"));
        assert!(events.iter().any(|e| e == "frame 0"));
        assert_eq!(events.last().map(String::as_str), Some("abort"));
        assert!(!events.iter().any(|e| e == "end"));
    }

    #[tokio::test]
    async fn test_preview_loads_only_visible_slides() {
        let dir = tempdir().unwrap();
        let mut project = fixture_project(dir.path());
        project.slides.get_mut(1).unwrap().path = dir.path().join("gone.png");
        let engine = small_engine();

        // The second slide only enters at 0.75s
        let frame = engine.preview(&project, 0.5).await.unwrap();
        assert_eq!(frame.get_pixel(32, 18), [255, 0, 0]);

        let err = engine.preview(&project, 1.5).await.unwrap_err();
        assert!(err.to_string().contains("gone.png"));
    }

    #[tokio::test]
    async fn test_preview() {
        let dir = tempdir().unwrap();
        let project = fixture_project(dir.path());
        let engine = small_engine();

        let frame = engine.preview(&project, 0.5).await.unwrap();
        assert_eq!((frame.width(), frame.height()), (64, 36));
        assert_eq!(frame.get_pixel(32, 18), [255, 0, 0]);

        assert!(engine.preview(&project, 1.75).await.is_ok());
        assert!(engine.preview(&project, 9.0).await.is_err());
    }

    #[tokio::test]
    async fn test_export_frames() {
        let dir = tempdir().unwrap();
        let project = fixture_project(dir.path());
        let frames_dir = dir.path().join("frames");

        let summary = small_engine().export_frames(&project, &frames_dir).await.unwrap();
        assert_eq!(summary.output.as_deref(), Some(frames_dir.as_path()));
        assert!(frames_dir.join("frame_000000.png").exists());
        assert!(frames_dir.join(format!("frame_{:06}.png", summary.frame_count - 1)).exists());
    }

    #[test]
    fn test_output_names() {
        assert_eq!(ensure_mp4_extension(Path::new("show")), PathBuf::from("show.mp4"));
        assert_eq!(ensure_mp4_extension(Path::new("show.MP4")), PathBuf::from("show.MP4"));
        assert_eq!(ensure_mp4_extension(Path::new("show.avi")), PathBuf::from("show.avi.mp4"));

        let name = default_output_path(Path::new("/videos"));
        let file = name.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file.starts_with("slideshow_") && file.ends_with(".mp4"));
    }
}
