//! Frame sources and the RAII camera handle

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::frame::{PixelFormat, VideoFrame};
use crate::{CameraConfig, CameraError};

/// A capture device producing frames one at a time.
///
/// `read` blocks until a frame is available. `Ok(None)` means the device
/// reported a failed read; callers treat it as the end of the session.
pub trait FrameSource {
    fn read(&mut self) -> Result<Option<VideoFrame>, CameraError>;

    /// Release the underlying device. Must be idempotent.
    fn close(&mut self);
}

/// Owning handle around a frame source.
///
/// The source is closed when the handle is dropped, so every exit path of a
/// capture loop (early return, `?`, panic unwinding) releases the device.
pub struct CameraHandle<S: FrameSource> {
    source: S,
    closed: bool,
}

/// Opens capture devices by index.
pub trait CameraOpener {
    type Source: FrameSource;

    fn open(&mut self, device_index: u32, fps: u32) -> Result<Self::Source, CameraError>;
}

impl<S: FrameSource> CameraHandle<S> {
    /// Open the device named by `config` and take ownership of it
    pub fn open<O>(opener: &mut O, config: &CameraConfig) -> Result<Self, CameraError>
    where
        O: CameraOpener<Source = S>,
    {
        let source = opener.open(config.device_index, config.fps)?;
        info!("Opened camera {} at {} fps", config.device_index, config.fps);
        Ok(Self::new(source))
    }

    /// Take ownership of an opened source
    pub fn new(source: S) -> Self {
        Self {
            source,
            closed: false,
        }
    }

    /// Read the next frame
    pub fn read(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        if self.closed {
            return Err(CameraError::Closed);
        }
        self.source.read()
    }

    /// Close the source now instead of waiting for drop
    pub fn close(&mut self) {
        if !self.closed {
            self.source.close();
            self.closed = true;
            info!("Camera released");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Access the wrapped source
    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: FrameSource> Drop for CameraHandle<S> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Replays frames from image files or from memory as if they came from a camera
pub struct ImageSequenceSource {
    pending: VecDeque<Pending>,
    frame_interval_ns: u64,
    sequence: u32,
    open: bool,
}

enum Pending {
    File(PathBuf),
    Frame(VideoFrame),
}

impl ImageSequenceSource {
    /// Open every image file in `dir`, in lexical file-name order
    pub fn open_dir(dir: impl AsRef<Path>, fps: u32) -> Result<Self, CameraError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CameraError::Open(format!("{}: {}", dir.display(), e)))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| image::ImageFormat::from_path(path).is_ok())
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(CameraError::Open(format!("no image files in {}", dir.display())));
        }

        info!("Opened image sequence with {} frames from {}", files.len(), dir.display());
        Ok(Self::with_pending(files.into_iter().map(Pending::File).collect(), fps))
    }

    /// Replay already decoded frames
    pub fn from_frames(frames: Vec<VideoFrame>, fps: u32) -> Self {
        Self::with_pending(frames.into_iter().map(Pending::Frame).collect(), fps)
    }

    fn with_pending(pending: VecDeque<Pending>, fps: u32) -> Self {
        Self {
            pending,
            frame_interval_ns: 1_000_000_000 / u64::from(fps.max(1)),
            sequence: 0,
            open: true,
        }
    }

    /// Frames not yet read
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn decode(&self, path: &Path) -> Result<VideoFrame, CameraError> {
        let img = image::open(path)
            .map_err(|e| CameraError::Format(format!("{}: {}", path.display(), e)))?
            .to_rgb8();
        let (width, height) = img.dimensions();
        // Store in native camera order
        let mut data = img.into_raw();
        for px in data.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        VideoFrame::new(data, width, height, PixelFormat::Bgr24, 0, 0)
            .ok_or_else(|| CameraError::Format(format!("{}: bad buffer size", path.display())))
    }
}

impl FrameSource for ImageSequenceSource {
    fn read(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        if !self.open {
            return Err(CameraError::Closed);
        }

        let mut frame = match self.pending.pop_front() {
            Some(Pending::Frame(frame)) => frame,
            Some(Pending::File(path)) => match self.decode(&path) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Failed to decode frame: {}", e);
                    return Ok(None);
                }
            },
            None => {
                debug!("Image sequence exhausted after {} frames", self.sequence);
                return Ok(None);
            }
        };

        frame.sequence = self.sequence;
        frame.timestamp_ns = u64::from(self.sequence) * self.frame_interval_ns;
        self.sequence += 1;
        Ok(Some(frame))
    }

    fn close(&mut self) {
        self.open = false;
        self.pending.clear();
    }
}

/// Treats each numbered subdirectory of `root` as a device.
///
/// Device `N` replays the images in `<root>/<N>`.
#[derive(Debug, Clone)]
pub struct ImageDirectoryCamera {
    root: PathBuf,
}

impl ImageDirectoryCamera {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn device_path(&self, device_index: u32) -> PathBuf {
        self.root.join(device_index.to_string())
    }
}

impl CameraOpener for ImageDirectoryCamera {
    type Source = ImageSequenceSource;

    fn open(&mut self, device_index: u32, fps: u32) -> Result<ImageSequenceSource, CameraError> {
        ImageSequenceSource::open_dir(self.device_path(device_index), fps)
    }
}
