use crate::types::BarDetection;

pub const BAR_LINE_THICKNESS: i32 = 10;
const PLUMB_LINE_THICKNESS: i32 = 4;

const BAR_COLOR: [u8; 4] = [250, 204, 21, 255];
const PLUMB_COLOR: [u8; 4] = [56, 189, 248, 255];
const TRAIL_COLOR: [u8; 4] = [248, 113, 113, 255];

/// Screen-space lines marking a detected bar on the color image.
#[derive(Clone, Debug, PartialEq)]
pub struct BarOverlay {
    /// Horizontal bar line, left end then right end.
    pub bar: ((f32, f32), (f32, f32)),
    /// Vertical line from just under the bar down to the bottom of the image.
    pub plumb: ((f32, f32), (f32, f32)),
    /// Bar height in meters with two decimals.
    pub label: String,
}

impl BarOverlay {
    /// Lays out the overlay on a canvas `canvas_height` pixels tall. Returns
    /// `None` when an endpoint has no color-space position.
    pub fn from_detection(
        detection: &BarDetection,
        canvas_height: f32,
        line_thickness: f32,
    ) -> Option<Self> {
        let min = detection.minimum.color;
        let max = detection.maximum.color;
        let trail = detection.trail.color;
        if !(min.is_finite() && max.is_finite() && trail.is_finite()) {
            return None;
        }

        let width = (max.x - min.x).abs();
        let bar_y = trail.y;
        let plumb_top = trail.y + line_thickness / 2.0;

        Some(Self {
            bar: ((min.x, bar_y), (min.x + width, bar_y)),
            plumb: ((trail.x, plumb_top), (trail.x, canvas_height.max(plumb_top))),
            label: format!("{:.2}", detection.bar_height),
        })
    }
}

pub fn draw_overlay(buffer: &mut [u8], width: u32, height: u32, overlay: &BarOverlay) {
    let mut canvas = Canvas {
        buffer,
        width,
        height,
    };

    let (plumb_top, plumb_bottom) = overlay.plumb;
    canvas.stroke(plumb_top, plumb_bottom, PLUMB_LINE_THICKNESS, PLUMB_COLOR);

    let (left, right) = overlay.bar;
    canvas.stroke(left, right, BAR_LINE_THICKNESS, BAR_COLOR);

    let radius = (BAR_LINE_THICKNESS / 2).max(4) + 2;
    canvas.dab((plumb_top.0 as i32, left.1 as i32), radius, TRAIL_COLOR);
}

/// RGBA8 buffer that silently clips everything outside its bounds.
struct Canvas<'a> {
    buffer: &'a mut [u8],
    width: u32,
    height: u32,
}

impl Canvas<'_> {
    /// Bresenham walk from `from` to `to`, stamping a round brush at each step.
    fn stroke(&mut self, from: (f32, f32), to: (f32, f32), thickness: i32, color: [u8; 4]) {
        let (mut x, mut y) = (from.0 as i32, from.1 as i32);
        let (x1, y1) = (to.0 as i32, to.1 as i32);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let step_x = if x < x1 { 1 } else { -1 };
        let step_y = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let radius = (thickness.max(1) - 1) / 2;

        loop {
            self.dab((x, y), radius, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += step_x;
            }
            if e2 <= dx {
                err += dx;
                y += step_y;
            }
        }
    }

    /// Filled disc of `radius` pixels; radius 0 paints a single pixel.
    fn dab(&mut self, (cx, cy): (i32, i32), radius: i32, color: [u8; 4]) {
        let r2 = radius * radius;
        for oy in -radius..=radius {
            for ox in -radius..=radius {
                if ox * ox + oy * oy <= r2 {
                    self.paint(cx + ox, cy + oy, color);
                }
            }
        }
    }

    fn paint(&mut self, x: i32, y: i32, color: [u8; 4]) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        if let Some(px) = self.buffer.get_mut(idx..idx + 4) {
            px.copy_from_slice(&color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColorPoint, PointTriple};

    fn detection(min: ColorPoint, max: ColorPoint, height: f64) -> BarDetection {
        let minimum = PointTriple {
            color: min,
            ..PointTriple::default()
        };
        let maximum = PointTriple {
            color: max,
            ..PointTriple::default()
        };
        BarDetection {
            trail: minimum.midpoint(&maximum),
            minimum,
            maximum,
            bar_length: 1.0,
            bar_height: height,
            angle: 0.0,
        }
    }

    #[test]
    fn layout_follows_color_points() {
        let d = detection(ColorPoint::new(100.0, 200.0), ColorPoint::new(300.0, 220.0), 1.234);
        let overlay = BarOverlay::from_detection(&d, 480.0, 10.0).unwrap();
        assert_eq!(overlay.bar, ((100.0, 210.0), (300.0, 210.0)));
        assert_eq!(overlay.plumb, ((200.0, 215.0), (200.0, 480.0)));
        assert_eq!(overlay.label, "1.23");
    }

    #[test]
    fn hidden_without_color_position() {
        let d = detection(
            ColorPoint::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
            ColorPoint::new(300.0, 220.0),
            1.0,
        );
        assert!(BarOverlay::from_detection(&d, 480.0, 10.0).is_none());
    }

    #[test]
    fn drawing_stays_inside_buffer() {
        let (w, h) = (40u32, 30u32);
        let mut buffer = vec![0u8; (w * h * 4) as usize];
        let overlay = BarOverlay {
            bar: ((-20.0, 10.0), (60.0, 10.0)),
            plumb: ((20.0, 15.0), (20.0, 100.0)),
            label: "0.50".to_string(),
        };
        draw_overlay(&mut buffer, w, h, &overlay);

        let px = |x: u32, y: u32| {
            let i = ((y * w + x) * 4) as usize;
            [buffer[i], buffer[i + 1], buffer[i + 2], buffer[i + 3]]
        };
        assert_eq!(px(0, 10), BAR_COLOR);
        assert_eq!(px(39, 10), BAR_COLOR);
        assert_eq!(px(20, 29), PLUMB_COLOR);
        assert_eq!(px(5, 28), [0, 0, 0, 0]);
    }

    #[test]
    fn thin_stroke_paints_single_pixels() {
        let (w, h) = (8u32, 8u32);
        let mut buffer = vec![0u8; (w * h * 4) as usize];
        let mut canvas = Canvas {
            buffer: &mut buffer,
            width: w,
            height: h,
        };
        canvas.stroke((1.0, 1.0), (6.0, 6.0), 1, BAR_COLOR);

        let painted = buffer.chunks_exact(4).filter(|px| px[3] != 0).count();
        assert_eq!(painted, 6);
        let i = ((3 * w + 3) * 4) as usize;
        assert_eq!(buffer[i..i + 4], BAR_COLOR);
    }
}
