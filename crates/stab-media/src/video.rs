//! Frame-by-frame video decoding and encoding through OpenCV.

#[cfg(feature = "opencv")]
pub use cv::{VideoSink, VideoSource};

/// Frame rate used when the container reports none.
pub const FALLBACK_FPS: f64 = 30.0;

/// Sanitize a frame rate reported by a container.
pub fn usable_fps(reported: f64) -> Option<f64> {
    (reported.is_finite() && reported > 0.0).then_some(reported)
}

#[cfg(feature = "opencv")]
mod cv {
    use std::path::{Path, PathBuf};

    use opencv::{
        core::{Mat, Size},
        prelude::*,
        videoio::{
            VideoCapture, VideoWriter, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_COUNT,
            CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH, CAP_PROP_POS_FRAMES,
        },
    };
    use tracing::{debug, warn};

    use crate::error::{cv_err, MediaError, MediaResult};

    fn path_str(path: &Path) -> MediaResult<&str> {
        path.to_str()
            .ok_or_else(|| MediaError::video_open(path, "path is not valid UTF-8"))
    }

    fn open_capture(path: &Path) -> MediaResult<VideoCapture> {
        let cap = VideoCapture::from_file(path_str(path)?, CAP_ANY)
            .map_err(|e| MediaError::video_open(path, e.to_string()))?;
        if !cap.is_opened().unwrap_or(false) {
            return Err(MediaError::video_open(path, "no backend could decode the file"));
        }
        Ok(cap)
    }

    /// Sequential reader over the frames of a video file.
    pub struct VideoSource {
        path: PathBuf,
        cap: VideoCapture,
        fps: f64,
        size: Size,
        frame_count: u64,
    }

    impl VideoSource {
        pub fn open(path: impl AsRef<Path>) -> MediaResult<Self> {
            let path = path.as_ref();
            if !path.exists() {
                return Err(MediaError::FileNotFound(path.to_path_buf()));
            }

            let cap = open_capture(path)?;
            let fps = cap.get(CAP_PROP_FPS).unwrap_or(0.0);
            let width = cap.get(CAP_PROP_FRAME_WIDTH).unwrap_or(0.0) as i32;
            let height = cap.get(CAP_PROP_FRAME_HEIGHT).unwrap_or(0.0) as i32;
            let frame_count = cap.get(CAP_PROP_FRAME_COUNT).unwrap_or(0.0).max(0.0) as u64;

            debug!(
                path = %path.display(),
                fps,
                width,
                height,
                frame_count,
                "Opened video"
            );

            Ok(Self {
                path: path.to_path_buf(),
                cap,
                fps,
                size: Size::new(width, height),
                frame_count,
            })
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        /// Frame rate reported by the container, possibly 0.
        pub fn fps(&self) -> f64 {
            self.fps
        }

        pub fn frame_size(&self) -> Size {
            self.size
        }

        /// Frame count reported by the container. An estimate for some formats.
        pub fn frame_count(&self) -> u64 {
            self.frame_count
        }

        /// Decode the next frame, `None` at end of stream.
        pub fn next_frame(&mut self) -> MediaResult<Option<Mat>> {
            let mut frame = Mat::default();
            let ok = self.cap.read(&mut frame).map_err(cv_err("read frame"))?;
            if !ok || frame.empty() {
                return Ok(None);
            }
            Ok(Some(frame))
        }

        /// Go back to the first frame, reopening the file if seeking fails.
        pub fn rewind(&mut self) -> MediaResult<()> {
            let seeked = self.cap.set(CAP_PROP_POS_FRAMES, 0.0).unwrap_or(false);
            if !seeked {
                warn!(path = %self.path.display(), "Seek to start failed, reopening video");
                self.cap = open_capture(&self.path)?;
            }
            Ok(())
        }
    }

    /// Sequential writer producing a video file.
    pub struct VideoSink {
        writer: VideoWriter,
        size: Size,
        frames_written: usize,
    }

    impl VideoSink {
        pub fn create(path: impl AsRef<Path>, fourcc: [char; 4], fps: f64, size: Size) -> MediaResult<Self> {
            let path = path.as_ref();
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }

            let code = VideoWriter::fourcc(fourcc[0], fourcc[1], fourcc[2], fourcc[3])
                .map_err(cv_err("fourcc"))?;
            let writer = VideoWriter::new(path_str(path)?, code, fps, size, true)
                .map_err(|e| MediaError::video_open(path, e.to_string()))?;
            if !writer.is_opened().unwrap_or(false) {
                let codec: String = fourcc.iter().collect();
                return Err(MediaError::video_open(
                    path,
                    format!("no encoder available for fourcc {codec}"),
                ));
            }

            debug!(
                path = %path.display(),
                fps,
                width = size.width,
                height = size.height,
                "Opened video writer"
            );

            Ok(Self {
                writer,
                size,
                frames_written: 0,
            })
        }

        /// Encode one frame. Its size must match the size given at creation.
        pub fn write(&mut self, frame: &Mat) -> MediaResult<()> {
            let size = frame.size().map_err(cv_err("frame size"))?;
            if size != self.size {
                return Err(MediaError::VideoWrite(format!(
                    "frame is {}x{}, writer expects {}x{}",
                    size.width, size.height, self.size.width, self.size.height
                )));
            }
            self.writer
                .write(frame)
                .map_err(|e| MediaError::VideoWrite(e.to_string()))?;
            self.frames_written += 1;
            Ok(())
        }

        pub fn frames_written(&self) -> usize {
            self.frames_written
        }

        /// Flush and close the file, returning the number of frames written.
        pub fn finish(mut self) -> MediaResult<usize> {
            self.writer
                .release()
                .map_err(|e| MediaError::VideoWrite(e.to_string()))?;
            Ok(self.frames_written)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_fps() {
        assert_eq!(usable_fps(29.97), Some(29.97));
        assert_eq!(usable_fps(0.0), None);
        assert_eq!(usable_fps(-1.0), None);
        assert_eq!(usable_fps(f64::NAN), None);
    }
}
