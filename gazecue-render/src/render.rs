use crate::text::TextCache;
use ab_glyph::FontArc;
use anyhow::{Result, anyhow, bail};
use bytemuck::{cast_slice, cast_slice_mut};
use gazecue_core::{Element, Frame, ImageId, TargetSide};
use gazecue_timing::Timer;
use std::time::Duration;
use tiny_skia::{Color, Paint, Pixmap, Rect, Transform};

/// Mid grey, straight RGBA.
pub const BACKGROUND: [u8; 4] = [175, 175, 175, 255];

const FIXATION_LENGTH: u32 = 20;
const FIXATION_WIDTH: u32 = 4;
const MESSAGE_SIZE_PX: f32 = 36.0;
const OVERLAY_SIZE_PX: f32 = 18.0;
const OVERLAY_MARGIN: i32 = 16;

pub const REST_MESSAGE: &[&str] = &[
    "Take a short break.",
    "",
    "When you are ready, press any key to continue.",
];

/// Screen placement of trial elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    /// Horizontal distance from the screen centre to each target.
    pub target_offset_px: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            target_offset_px: 500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub clear: Duration,
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub elements: usize,
}

/// Draws visible frames onto an offscreen canvas and presents it into an
/// RGBA8 frame buffer of the same size.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    center: (f32, f32),
    layout: Layout,
    canvas: Pixmap,
    clear_buffer: Vec<u8>,
    fixation: Pixmap,
    message_text: TextCache,
    overlay_text: TextCache,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, layout: Layout, font: FontArc) -> Result<Self> {
        let (canvas, clear_buffer) = blank_canvas(width, height)?;
        let black = Color::from_rgba8(0, 0, 0, 255);
        Ok(Self {
            width,
            height,
            center: (width as f32 / 2.0, height as f32 / 2.0),
            layout,
            canvas,
            clear_buffer,
            fixation: fixation_cross()?,
            message_text: TextCache::new(font.clone(), MESSAGE_SIZE_PX, black),
            overlay_text: TextCache::new(font, OVERLAY_SIZE_PX, black),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let (canvas, clear_buffer) = blank_canvas(width, height)?;
        self.width = width;
        self.height = height;
        self.center = (width as f32 / 2.0, height as f32 / 2.0);
        self.canvas = canvas;
        self.clear_buffer = clear_buffer;
        log::debug!("Renderer resized to {width}x{height}");
        Ok(())
    }

    /// Centre point of an element on screen.
    pub fn position(&self, element: Element) -> (f32, f32) {
        match element {
            Element::Target(_, TargetSide::Left) => {
                (self.center.0 - self.layout.target_offset_px, self.center.1)
            }
            Element::Target(_, TargetSide::Right) => {
                (self.center.0 + self.layout.target_offset_px, self.center.1)
            }
            Element::FixationCross | Element::Stimulus(_) | Element::RestMessage => self.center,
        }
    }

    /// Draws `frame` with `images` as the image store, plus optional overlay
    /// lines in the top-left corner.
    pub fn render_frame<T: Timer>(
        &mut self,
        frame: &Frame,
        images: &[Pixmap],
        overlay: &[String],
        frame_buffer: &mut [u8],
        timer: &mut T,
    ) -> Result<FrameStats> {
        self.present(frame_buffer, timer, |r| {
            let elements = frame.elements();
            for element in &elements {
                r.draw_element(*element, images)?;
            }
            r.draw_overlay(overlay);
            Ok(elements.len())
        })
    }

    /// Draws centred message lines, used for the instruction and end screens.
    pub fn render_message<T: Timer>(
        &mut self,
        lines: &[&str],
        overlay: &[String],
        frame_buffer: &mut [u8],
        timer: &mut T,
    ) -> Result<FrameStats> {
        self.present(frame_buffer, timer, |r| {
            r.draw_lines(lines);
            r.draw_overlay(overlay);
            Ok(lines.len())
        })
    }

    fn present<T: Timer>(
        &mut self,
        frame_buffer: &mut [u8],
        timer: &mut T,
        draw: impl FnOnce(&mut Self) -> Result<usize>,
    ) -> Result<FrameStats> {
        if frame_buffer.len() != self.clear_buffer.len() {
            bail!(
                "frame buffer holds {} bytes, {}x{} canvas needs {}",
                frame_buffer.len(),
                self.width,
                self.height,
                self.clear_buffer.len()
            );
        }

        let start = timer.now();
        self.canvas.data_mut().copy_from_slice(&self.clear_buffer);
        let clear = timer.elapsed(start);

        let t = timer.now();
        let elements = draw(self)?;
        let draw_time = timer.elapsed(t);

        let t = timer.now();
        frame_buffer.copy_from_slice(self.canvas.data());
        let copy = timer.elapsed(t);

        let total = timer.elapsed(start);
        timer.record_frame(total);
        Ok(FrameStats {
            clear,
            draw: draw_time,
            copy,
            total,
            elements,
        })
    }

    fn draw_element(&mut self, element: Element, images: &[Pixmap]) -> Result<()> {
        let pos = self.position(element);
        match element {
            Element::FixationCross => {
                blit_centered(&mut self.canvas, &self.fixation, pos);
            }
            Element::Stimulus(id) | Element::Target(id, _) => {
                let image = lookup(images, id)?;
                blit_centered(&mut self.canvas, image, pos);
            }
            Element::RestMessage => self.draw_lines(REST_MESSAGE),
        }
        Ok(())
    }

    fn draw_lines(&mut self, lines: &[&str]) {
        let step = self.message_text.line_height();
        let first = self.center.1 - step * (lines.len() as f32 - 1.0) / 2.0;
        for (i, line) in lines.iter().enumerate() {
            if let Some(pm) = self.message_text.get_or_render(line) {
                blit_centered(&mut self.canvas, &pm, (self.center.0, first + step * i as f32));
            }
        }
    }

    fn draw_overlay(&mut self, lines: &[String]) {
        let step = self.overlay_text.line_height() as i32;
        for (i, line) in lines.iter().enumerate() {
            if let Some(pm) = self.overlay_text.get_or_render(line) {
                blit_at(&mut self.canvas, &pm, OVERLAY_MARGIN, OVERLAY_MARGIN + step * i as i32);
            }
        }
    }
}

fn lookup(images: &[Pixmap], id: ImageId) -> Result<&Pixmap> {
    images
        .get(id.0)
        .ok_or_else(|| anyhow!("no image {} in a store of {}", id.0, images.len()))
}

fn blank_canvas(width: u32, height: u32) -> Result<(Pixmap, Vec<u8>)> {
    let canvas =
        Pixmap::new(width, height).ok_or_else(|| anyhow!("invalid canvas size {width}x{height}"))?;
    let clear_buffer = BACKGROUND
        .iter()
        .copied()
        .cycle()
        .take(width as usize * height as usize * 4)
        .collect();
    Ok((canvas, clear_buffer))
}

fn fixation_cross() -> Result<Pixmap> {
    let (len, thick) = (FIXATION_LENGTH as f32, FIXATION_WIDTH as f32);
    let mut pm = Pixmap::new(FIXATION_LENGTH, FIXATION_LENGTH)
        .ok_or_else(|| anyhow!("fixation pixmap"))?;
    let mut paint = Paint::default();
    paint.anti_alias = false;
    paint.set_color(Color::from_rgba8(0, 0, 0, 255));

    let offset = (len - thick) / 2.0;
    let bars = [
        Rect::from_xywh(0.0, offset, len, thick),
        Rect::from_xywh(offset, 0.0, thick, len),
    ];
    for bar in bars.into_iter().flatten() {
        pm.fill_rect(bar, &paint, Transform::identity(), None);
    }
    Ok(pm)
}

/// Blits `src` so its centre lands on `pos`.
pub fn blit_centered(canvas: &mut Pixmap, src: &Pixmap, pos: (f32, f32)) -> bool {
    let x0 = (pos.0 - src.width() as f32 * 0.5).floor() as i32;
    let y0 = (pos.1 - src.height() as f32 * 0.5).floor() as i32;
    blit_at(canvas, src, x0, y0)
}

/// Source-over blit of premultiplied `src` with its top-left at `(x0, y0)`,
/// clipped to the canvas. Returns `false` when nothing was visible.
pub fn blit_at(canvas: &mut Pixmap, src: &Pixmap, x0: i32, y0: i32) -> bool {
    let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);
    let (sw, sh) = (src.width() as i32, src.height() as i32);

    let dst_x = x0.max(0);
    let dst_y = y0.max(0);
    let copy_w = (x0 + sw).min(cw) - dst_x;
    let copy_h = (y0 + sh).min(ch) - dst_y;
    if copy_w <= 0 || copy_h <= 0 {
        return false;
    }
    let (src_x, src_y) = ((dst_x - x0) as usize, (dst_y - y0) as usize);
    let (dst_x, dst_y) = (dst_x as usize, dst_y as usize);
    let (copy_w, copy_h) = (copy_w as usize, copy_h as usize);
    let (sw, cw) = (sw as usize, cw as usize);

    let src_px: &[[u8; 4]] = cast_slice(src.data());
    let dst_px: &mut [[u8; 4]] = cast_slice_mut(canvas.data_mut());

    let opaque = (0..copy_h).all(|row| {
        let start = (src_y + row) * sw + src_x;
        src_px[start..start + copy_w].iter().all(|p| p[3] == 255)
    });

    for row in 0..copy_h {
        let s = (src_y + row) * sw + src_x;
        let d = (dst_y + row) * cw + dst_x;
        let (src_row, dst_row) = (&src_px[s..s + copy_w], &mut dst_px[d..d + copy_w]);
        if opaque {
            dst_row.copy_from_slice(src_row);
            continue;
        }
        for (dp, sp) in dst_row.iter_mut().zip(src_row) {
            let inv = 255 - u32::from(sp[3]);
            for c in 0..4 {
                dp[c] = (u32::from(sp[c]) + (u32::from(dp[c]) * inv + 127) / 255) as u8;
            }
        }
    }
    true
}
