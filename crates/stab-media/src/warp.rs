//! Frame warping, border crop and side-by-side output.
//!
//! The geometry helpers are plain arithmetic and always available; the
//! OpenCV-backed operations need the `opencv` feature.

use stab_models::Motion;

/// Gap in pixels between the two halves of a side-by-side canvas.
pub const CANVAS_GAP: i32 = 10;
/// Canvases wider than this are halved.
pub const MAX_CANVAS_WIDTH: i32 = 1920;

/// Rectangle kept after cropping the warped frame's borders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CropRect {
    /// Crop `border` pixels left and right and a proportional amount top and bottom.
    ///
    /// Returns `None` when cropping is disabled or would leave nothing.
    pub fn for_frame(cols: i32, rows: i32, border: u32) -> Option<Self> {
        if border == 0 || cols <= 0 || rows <= 0 {
            return None;
        }
        let horizontal = border as i32;
        let vertical = horizontal * rows / cols;
        let width = cols - 2 * horizontal;
        let height = rows - 2 * vertical;
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(Self {
            x: horizontal,
            y: vertical,
            width,
            height,
        })
    }
}

/// Size of the before/after canvas and whether it gets halved.
pub fn canvas_size(cols: i32, rows: i32) -> (i32, i32, bool) {
    let width = cols * 2 + CANVAS_GAP;
    if width > MAX_CANVAS_WIDTH {
        (width / 2, rows / 2, true)
    } else {
        (width, rows, false)
    }
}

/// The 2x3 matrix handed to `warpAffine` for one corrected motion.
pub fn warp_matrix(motion: &Motion) -> [[f64; 3]; 2] {
    stab_models::RigidTransform::from_motion(motion).m
}

#[cfg(feature = "opencv")]
pub use cv::FrameWarper;

#[cfg(feature = "opencv")]
mod cv {
    use opencv::{
        core::{self, Mat, Rect, Scalar, Size},
        imgproc,
        prelude::*,
    };
    use stab_models::Motion;

    use super::{canvas_size, warp_matrix, CropRect, CANVAS_GAP};
    use crate::error::{cv_err, MediaResult};

    /// Applies corrected motions to frames.
    pub struct FrameWarper {
        border_crop: u32,
        side_by_side: bool,
    }

    impl FrameWarper {
        pub fn new(border_crop: u32, side_by_side: bool) -> Self {
            Self {
                border_crop,
                side_by_side,
            }
        }

        /// Size of the frames [`FrameWarper::render`] produces for a given input size.
        pub fn output_size(&self, input: Size) -> Size {
            if self.side_by_side {
                let (w, h, _) = canvas_size(input.width, input.height);
                Size::new(w, h)
            } else {
                input
            }
        }

        /// Warp, crop and compose one output frame.
        pub fn render(&self, frame: &Mat, motion: &Motion) -> MediaResult<Mat> {
            let mut warped = self.warp(frame, motion)?;
            if let Some(rect) = CropRect::for_frame(frame.cols(), frame.rows(), self.border_crop) {
                warped = crop_and_restore(&warped, rect, frame.size().map_err(cv_err("frame size"))?)?;
            }
            if self.side_by_side {
                side_by_side(frame, &warped)
            } else {
                Ok(warped)
            }
        }

        /// Resample `frame` through the rigid transform of `motion`.
        pub fn warp(&self, frame: &Mat, motion: &Motion) -> MediaResult<Mat> {
            let rows = warp_matrix(motion);
            let matrix = Mat::from_slice_2d(&rows[..]).map_err(cv_err("warp matrix"))?;
            let size = frame.size().map_err(cv_err("frame size"))?;
            let mut out = Mat::default();
            imgproc::warp_affine(
                frame,
                &mut out,
                &matrix,
                size,
                imgproc::INTER_LINEAR,
                core::BORDER_CONSTANT,
                Scalar::default(),
            )
            .map_err(cv_err("warp_affine"))?;
            Ok(out)
        }
    }

    fn crop_and_restore(frame: &Mat, rect: CropRect, size: Size) -> MediaResult<Mat> {
        let roi = Mat::roi(frame, Rect::new(rect.x, rect.y, rect.width, rect.height))
            .map_err(cv_err("crop roi"))?;
        let mut out = Mat::default();
        imgproc::resize(&*roi, &mut out, size, 0.0, 0.0, imgproc::INTER_LINEAR)
            .map_err(cv_err("crop resize"))?;
        Ok(out)
    }

    fn side_by_side(original: &Mat, stabilized: &Mat) -> MediaResult<Mat> {
        let cols = original.cols();
        let rows = original.rows();
        let mut canvas = Mat::new_rows_cols_with_default(
            rows,
            cols * 2 + CANVAS_GAP,
            original.typ(),
            Scalar::all(0.0),
        )
        .map_err(cv_err("canvas alloc"))?;

        {
            let mut left = Mat::roi_mut(&mut canvas, Rect::new(0, 0, cols, rows))
                .map_err(cv_err("canvas left"))?;
            original.copy_to(&mut *left).map_err(cv_err("canvas copy left"))?;
        }
        {
            let mut right = Mat::roi_mut(&mut canvas, Rect::new(cols + CANVAS_GAP, 0, cols, rows))
                .map_err(cv_err("canvas right"))?;
            stabilized.copy_to(&mut *right).map_err(cv_err("canvas copy right"))?;
        }

        let (width, height, halved) = canvas_size(cols, rows);
        if !halved {
            return Ok(canvas);
        }
        let mut scaled = Mat::default();
        imgproc::resize(
            &canvas,
            &mut scaled,
            Size::new(width, height),
            0.0,
            0.0,
            imgproc::INTER_AREA,
        )
        .map_err(cv_err("canvas resize"))?;
        Ok(scaled)
    }
}
