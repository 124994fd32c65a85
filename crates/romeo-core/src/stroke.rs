//! Freehand stroke with per-sample timing.

use kurbo::{BezPath, Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for strokes, stable across serialization.
pub type StrokeId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrokeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl StrokeColor {
    pub const BLACK: Self = Self::from_argb(0xFF24_2424);
    pub const RED: Self = Self::from_argb(0xFFC3_1D40);
    pub const GREEN: Self = Self::from_argb(0xFF2E_C196);
    pub const BLUE: Self = Self::from_argb(0xFF27_2F80);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from a packed `0xAARRGGBB` value.
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    /// Pack into a `0xAARRGGBB` value.
    pub fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

impl Default for StrokeColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<Color> for StrokeColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<StrokeColor> for Color {
    fn from(color: StrokeColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Reasons a decoded stroke is refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedStrokeError {
    #[error("stroke has no samples")]
    NoSamples,
    #[error("stroke has no points")]
    NoPoints,
    #[error("stroke has {times} sample times but {lengths} sample lengths")]
    SampleCountMismatch { times: usize, lengths: usize },
    #[error("sample time decreases at sample {index}")]
    NonMonotonicTime { index: usize },
    #[error("sample length decreases at sample {index}")]
    NonMonotonicLength { index: usize },
    #[error("stroke contains a non-finite coordinate or length")]
    NonFiniteValue,
    #[error("invalid stroke thickness: {0}")]
    InvalidThickness(f64),
}

/// One continuous pointer-down to pointer-up path.
///
/// `sample_times` are milliseconds since the owning board's recording origin,
/// `sample_lengths` the cumulative polyline length reached at each sample.
/// Both series have the same length and never decrease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub(crate) id: StrokeId,
    pub(crate) points: Vec<Point>,
    pub(crate) sample_lengths: Vec<f64>,
    pub(crate) sample_times: Vec<u64>,
    pub(crate) color: StrokeColor,
    pub(crate) thickness: f64,
}

impl Stroke {
    /// Open a stroke with a single sample at `point`.
    pub(crate) fn begin(point: Point, time: u64, color: StrokeColor, thickness: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            points: vec![point],
            sample_lengths: vec![0.0],
            sample_times: vec![time],
            color,
            thickness,
        }
    }

    /// Assemble a stroke from decoded parts, checking every invariant.
    pub fn from_parts(
        id: StrokeId,
        points: Vec<Point>,
        sample_times: Vec<u64>,
        sample_lengths: Vec<f64>,
        color: StrokeColor,
        thickness: f64,
    ) -> Result<Self, MalformedStrokeError> {
        let stroke = Self {
            id,
            points,
            sample_lengths,
            sample_times,
            color,
            thickness,
        };
        stroke.validate()?;
        Ok(stroke)
    }

    /// Append a point and record its time and the new cumulative length.
    pub(crate) fn push_sample(&mut self, point: Point, time: u64) {
        let previous = self.points.last().copied().unwrap_or(point);
        let length = self.total_length() + previous.distance(point);
        let time = time.max(self.last_time());
        self.points.push(point);
        self.sample_lengths.push(length);
        self.sample_times.push(time);
    }

    pub(crate) fn set_thickness(&mut self, thickness: f64) {
        self.thickness = thickness;
    }

    pub fn id(&self) -> StrokeId {
        self.id
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn sample_times(&self) -> &[u64] {
        &self.sample_times
    }

    pub fn sample_lengths(&self) -> &[f64] {
        &self.sample_lengths
    }

    pub fn color(&self) -> StrokeColor {
        self.color
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Number of timing samples.
    pub fn sample_count(&self) -> usize {
        self.sample_times.len()
    }

    /// Time of the first sample.
    pub fn first_time(&self) -> u64 {
        self.sample_times.first().copied().unwrap_or(0)
    }

    /// Time of the last sample.
    pub fn last_time(&self) -> u64 {
        self.sample_times.last().copied().unwrap_or(0)
    }

    /// Cumulative length recorded at the last sample.
    pub fn total_length(&self) -> f64 {
        self.sample_lengths.last().copied().unwrap_or(0.0)
    }

    /// Length of the polyline measured from its points.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Check the sample series and visual attributes.
    pub fn validate(&self) -> Result<(), MalformedStrokeError> {
        if self.sample_times.is_empty() {
            return Err(MalformedStrokeError::NoSamples);
        }
        if self.sample_times.len() != self.sample_lengths.len() {
            return Err(MalformedStrokeError::SampleCountMismatch {
                times: self.sample_times.len(),
                lengths: self.sample_lengths.len(),
            });
        }
        if self.points.is_empty() {
            return Err(MalformedStrokeError::NoPoints);
        }
        if self.points.iter().any(|p| !p.is_finite())
            || self.sample_lengths.iter().any(|l| !l.is_finite())
        {
            return Err(MalformedStrokeError::NonFiniteValue);
        }
        if let Some(index) = self.sample_times.windows(2).position(|w| w[1] < w[0]) {
            return Err(MalformedStrokeError::NonMonotonicTime { index: index + 1 });
        }
        if let Some(index) = self.sample_lengths.windows(2).position(|w| w[1] < w[0]) {
            return Err(MalformedStrokeError::NonMonotonicLength { index: index + 1 });
        }
        if !self.thickness.is_finite() || self.thickness <= 0.0 {
            return Err(MalformedStrokeError::InvalidThickness(self.thickness));
        }
        Ok(())
    }

    /// Bounding box of the points.
    pub fn bounds(&self) -> Rect {
        let Some(&first) = self.points.first() else {
            return Rect::ZERO;
        };
        self.points
            .iter()
            .fold(Rect::from_points(first, first), |rect, p| rect.union_pt(*p))
    }

    /// Full polyline as a path.
    pub fn to_path(&self) -> BezPath {
        self.path_up_to(f64::INFINITY)
    }

    /// Prefix of the polyline ending `length` units along it.
    ///
    /// The last segment is cut by interpolation, so a zero length still yields
    /// a degenerate segment that renders as a dot with round caps.
    pub fn path_up_to(&self, length: f64) -> BezPath {
        let mut path = BezPath::new();
        let Some(&first) = self.points.first() else {
            return path;
        };
        path.move_to(first);
        if self.points.len() == 1 {
            path.line_to(first);
            return path;
        }

        let mut remaining = length.max(0.0);
        for w in self.points.windows(2) {
            let segment = w[0].distance(w[1]);
            if remaining <= segment {
                let t = if segment > 0.0 { remaining / segment } else { 1.0 };
                path.line_to(w[0].lerp(w[1], t));
                return path;
            }
            path.line_to(w[1]);
            remaining -= segment;
        }
        path
    }

    /// Point reached `offset` past the last point, used for synthetic tap samples.
    pub(crate) fn last_point_offset(&self, offset: f64) -> Point {
        let last = self.points.last().copied().unwrap_or(Point::ZERO);
        last + Vec2::new(offset, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stroke() -> Stroke {
        let mut stroke = Stroke::begin(Point::new(0.0, 0.0), 0, StrokeColor::BLACK, 15.0);
        stroke.push_sample(Point::new(3.0, 4.0), 40);
        stroke.push_sample(Point::new(3.0, 14.0), 80);
        stroke
    }

    #[test]
    fn test_push_sample_accumulates_length() {
        let stroke = sample_stroke();
        assert_eq!(stroke.sample_lengths(), &[0.0, 5.0, 15.0]);
        assert_eq!(stroke.sample_times(), &[0, 40, 80]);
        assert!((stroke.total_length() - stroke.length()).abs() < 1e-9);
    }

    #[test]
    fn test_push_sample_never_rewinds_time() {
        let mut stroke = Stroke::begin(Point::ZERO, 100, StrokeColor::RED, 15.0);
        stroke.push_sample(Point::new(1.0, 0.0), 90);
        assert_eq!(stroke.sample_times(), &[100, 100]);
    }

    #[test]
    fn test_validate_rejects_mismatched_series() {
        let result = Stroke::from_parts(
            Uuid::new_v4(),
            vec![Point::ZERO, Point::new(1.0, 1.0)],
            vec![0, 10],
            vec![0.0],
            StrokeColor::BLACK,
            15.0,
        );
        assert_eq!(
            result.unwrap_err(),
            MalformedStrokeError::SampleCountMismatch { times: 2, lengths: 1 }
        );
    }

    #[test]
    fn test_validate_rejects_time_going_backwards() {
        let result = Stroke::from_parts(
            Uuid::new_v4(),
            vec![Point::ZERO, Point::new(1.0, 1.0), Point::new(2.0, 2.0)],
            vec![0, 50, 20],
            vec![0.0, 1.0, 2.0],
            StrokeColor::BLACK,
            15.0,
        );
        assert_eq!(
            result.unwrap_err(),
            MalformedStrokeError::NonMonotonicTime { index: 2 }
        );
    }

    #[test]
    fn test_validate_rejects_empty_and_bad_thickness() {
        let empty = Stroke::from_parts(Uuid::new_v4(), vec![], vec![], vec![], StrokeColor::BLACK, 1.0);
        assert_eq!(empty.unwrap_err(), MalformedStrokeError::NoSamples);

        let thin = Stroke::from_parts(
            Uuid::new_v4(),
            vec![Point::ZERO],
            vec![0],
            vec![0.0],
            StrokeColor::BLACK,
            0.0,
        );
        assert_eq!(thin.unwrap_err(), MalformedStrokeError::InvalidThickness(0.0));
    }

    #[test]
    fn test_path_up_to_cuts_inside_segment() {
        let stroke = sample_stroke();
        let path = stroke.path_up_to(10.0);
        let end = path.elements().last().and_then(|el| el.end_point()).unwrap();
        assert!((end.x - 3.0).abs() < 1e-9);
        assert!((end.y - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_full_path_ends_at_last_point() {
        let stroke = sample_stroke();
        let end = stroke.to_path().elements().last().and_then(|el| el.end_point()).unwrap();
        assert_eq!(end, Point::new(3.0, 14.0));
    }

    #[test]
    fn test_bounds() {
        let bounds = sample_stroke().bounds();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 3.0, 14.0));
    }

    #[test]
    fn test_color_argb_packing() {
        assert_eq!(StrokeColor::RED, StrokeColor::new(0xC3, 0x1D, 0x40, 0xFF));
        assert_eq!(StrokeColor::BLUE.to_argb(), 0xFF27_2F80);
    }
}
