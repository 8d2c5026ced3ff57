use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn long_side(self) -> u32 {
        self.width.max(self.height)
    }

    /// Scales both sides by `factor`, or returns `None` when the long side
    /// would drop under `min_long_side`.
    pub fn shrink(self, factor: f32, min_long_side: u32) -> Option<Self> {
        let width = ((self.width as f32 * factor).round() as u32).max(1);
        let height = ((self.height as f32 * factor).round() as u32).max(1);
        let shrunk = Self { width, height };
        if shrunk.long_side() < min_long_side || shrunk == self {
            return None;
        }
        Some(shrunk)
    }
}

/// Fits `(width, height)` inside `max_width x max_height`, keeping the aspect
/// ratio. Never upscales. Zero-sized input is clamped to one pixel.
pub fn plan_dimensions(
    width: u32,
    height: u32,
    max_width: u32,
    max_height: u32,
    resize: bool,
) -> Dimensions {
    let width = width.max(1);
    let height = height.max(1);

    if !resize || (width <= max_width && height <= max_height) {
        return Dimensions { width, height };
    }

    let max_width = max_width.max(1);
    let max_height = max_height.max(1);
    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);

    Dimensions {
        width: ((width as f64 * scale).round() as u32).clamp(1, max_width),
        height: ((height as f64 * scale).round() as u32).clamp(1, max_height),
    }
}
