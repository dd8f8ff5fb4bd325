use std::time::Duration;

use anyhow::{Context, Result, bail};
use bytemuck::cast_slice;
use drivecheck_core::{
    AssessmentStage, IllusionSnapshot, LaneGeometry, PerceptionSnapshot, PumpPhase, PumpSnapshot,
    Snapshot,
};
use drivecheck_timing::{Clock, MonotonicClock};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};

use crate::digits;
use crate::palette;
use crate::scene::Scene;

/// Logical scene extent. Everything is laid out in these units and scaled
/// uniformly to fit the window.
pub const SCENE_WIDTH: f32 = 800.0;
pub const SCENE_HEIGHT: f32 = 450.0;

const LANE_TOP: f32 = 150.0;
const OBSTACLE_WIDTH: f32 = 20.0;
const ROAD_TOP: f32 = 100.0;
const ROAD_HEIGHT: f32 = 300.0;
const PLAYER_X: f32 = 60.0;
const PLAYER_SIZE: (f32, f32) = (60.0, 30.0);
const HAZARD_SIZE: f32 = 40.0;
const BURST_SIZE: f32 = 160.0;

#[repr(usize)]
#[derive(Debug, Clone, Copy)]
enum Sprite {
    Car = 0,
    Player = 1,
    Hazard = 2,
    Burst = 3,
}

impl Sprite {
    const COUNT: usize = 4;
    const ALL: [Sprite; Sprite::COUNT] = [Sprite::Car, Sprite::Player, Sprite::Hazard, Sprite::Burst];
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub clear: Duration,
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub dirty_count: usize,
}

pub trait Renderer {
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Draws `scene` and copies every changed region into `frame_buffer`,
    /// which must be `width * height` RGBA8 pixels.
    fn render_frame(&mut self, scene: &Scene<'_>, frame_buffer: &mut [u8]) -> Result<FrameStats>;
}

pub struct SkiaRenderer {
    width: u32,
    height: u32,
    scale: f32,
    offset: (f32, f32),

    geometry: LaneGeometry,
    lane_count: u8,

    sprites: Vec<Pixmap>,
    canvas: Pixmap,
    clear_buffer: Vec<[u8; 4]>,
    dirty_regions: Vec<Rect>,
    first_frame: bool,

    clock: MonotonicClock,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let mut renderer = Self {
            width,
            height,
            scale: 1.0,
            offset: (0.0, 0.0),
            geometry: LaneGeometry::default(),
            lane_count: 3,
            sprites: Vec::with_capacity(Sprite::COUNT),
            canvas: Pixmap::new(width, height).context("canvas pixmap")?,
            clear_buffer: Vec::new(),
            dirty_regions: Vec::with_capacity(32),
            first_frame: true,
            clock: MonotonicClock::new(),
        };
        renderer.layout(width, height)?;
        Ok(renderer)
    }

    /// Lane layout used for the perception task; must match the trial's.
    pub fn with_geometry(mut self, geometry: LaneGeometry) -> Result<Self> {
        self.geometry = geometry;
        self.build_sprites()?;
        Ok(self)
    }

    pub fn with_lane_count(mut self, lanes: u8) -> Self {
        self.lane_count = lanes.max(1);
        self
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn layout(&mut self, width: u32, height: u32) -> Result<()> {
        self.width = width;
        self.height = height;
        self.scale = (width as f32 / SCENE_WIDTH).min(height as f32 / SCENE_HEIGHT);
        self.offset = (
            (width as f32 - SCENE_WIDTH * self.scale) / 2.0,
            (height as f32 - SCENE_HEIGHT * self.scale) / 2.0,
        );
        self.canvas = Pixmap::new(width, height).context("canvas pixmap")?;
        self.clear_buffer = vec![palette::BACKGROUND; (width * height) as usize];
        self.dirty_regions.clear();
        self.first_frame = true;
        self.build_sprites()
    }

    fn build_sprites(&mut self) -> Result<()> {
        self.sprites = Sprite::ALL
            .iter()
            .map(|sprite| self.render_sprite(*sprite))
            .collect::<Result<_>>()?;
        Ok(())
    }

    fn render_sprite(&self, sprite: Sprite) -> Result<Pixmap> {
        let s = self.scale;
        let (w, h) = match sprite {
            Sprite::Car => (self.geometry.car_width as f32, self.geometry.car_height as f32),
            Sprite::Player => PLAYER_SIZE,
            Sprite::Hazard => (HAZARD_SIZE, HAZARD_SIZE),
            Sprite::Burst => (BURST_SIZE, BURST_SIZE),
        };
        let (pw, ph) = ((w * s).ceil().max(1.0), (h * s).ceil().max(1.0));
        let mut pixmap = Pixmap::new(pw as u32, ph as u32).context("sprite pixmap")?;

        match sprite {
            Sprite::Car | Sprite::Player => {
                let body = if matches!(sprite, Sprite::Car) {
                    palette::CAR
                } else {
                    palette::PLAYER
                };
                fill(&mut pixmap, Rect::from_xywh(0.0, 0.0, pw, ph), body);
                fill(
                    &mut pixmap,
                    Rect::from_xywh(pw * 0.6, ph * 0.2, pw * 0.2, ph * 0.6),
                    palette::WINDOW,
                );
            }
            Sprite::Hazard => {
                if let Some(path) = PathBuilder::from_circle(pw / 2.0, ph / 2.0, pw / 2.0) {
                    pixmap.fill_path(
                        &path,
                        &paint(palette::HAZARD),
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                }
            }
            Sprite::Burst => {
                let (cx, cy) = (pw / 2.0, ph / 2.0);
                let mut pb = PathBuilder::new();
                for i in 0..16 {
                    let r = if i % 2 == 0 { pw / 2.0 } else { pw / 4.5 };
                    let a = i as f32 * std::f32::consts::PI / 8.0;
                    let (x, y) = (cx + r * a.cos(), cy + r * a.sin());
                    if i == 0 {
                        pb.move_to(x, y);
                    } else {
                        pb.line_to(x, y);
                    }
                }
                pb.close();
                if let Some(path) = pb.finish() {
                    pixmap.fill_path(
                        &path,
                        &paint(palette::BURST),
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                }
            }
        }
        Ok(pixmap)
    }

    fn to_px(&self, x: f32, y: f32) -> (f32, f32) {
        (self.offset.0 + x * self.scale, self.offset.1 + y * self.scale)
    }

    fn mark_dirty(&mut self, rect: Rect) {
        let (w, h) = (self.width as f32, self.height as f32);
        let clipped = Rect::from_ltrb(
            rect.left().floor().clamp(0.0, w),
            rect.top().floor().clamp(0.0, h),
            rect.right().ceil().clamp(0.0, w),
            rect.bottom().ceil().clamp(0.0, h),
        );
        if let Some(r) = clipped {
            self.dirty_regions.push(r);
        }
    }

    /// Fills a rectangle given in scene units.
    fn fill_scene(&mut self, x: f32, y: f32, w: f32, h: f32, color: [u8; 4]) {
        let (px, py) = self.to_px(x, y);
        let Some(rect) = Rect::from_xywh(px, py, w * self.scale, h * self.scale) else {
            return;
        };
        fill(&mut self.canvas, Some(rect), color);
        self.mark_dirty(rect);
    }

    fn blit_sprite(&mut self, sprite: Sprite, scene_pos: (f32, f32)) {
        let (px, py) = self.to_px(scene_pos.0, scene_pos.1);
        let (x0, y0) = (px.round() as i64, py.round() as i64);
        let (cw, ch) = (self.width as i64, self.height as i64);

        let src = &self.sprites[sprite as usize];
        let (sw, sh) = (src.width() as i64, src.height() as i64);
        let (cx0, cy0) = (x0.max(0), y0.max(0));
        let (cx1, cy1) = ((x0 + sw).min(cw), (y0 + sh).min(ch));
        if cx1 <= cx0 || cy1 <= cy0 {
            return;
        }

        let src_data = src.data();
        let dst_data = self.canvas.data_mut();
        for y in cy0..cy1 {
            for x in cx0..cx1 {
                let si = (((y - y0) * sw + (x - x0)) * 4) as usize;
                let di = ((y * cw + x) * 4) as usize;
                blend_over(&src_data[si..si + 4], &mut dst_data[di..di + 4]);
            }
        }

        if let Some(rect) = Rect::from_ltrb(cx0 as f32, cy0 as f32, cx1 as f32, cy1 as f32) {
            self.dirty_regions.push(rect);
        }
    }

    /// Draws `value` with its top-left corner at `(x, y)` in scene units.
    fn draw_number(&mut self, value: u32, x: f32, y: f32, digit_w: f32, color: [u8; 4]) {
        let mut cursor = x;
        for ch in value.to_string().chars() {
            let mask = ch.to_digit(10).and_then(digits::mask).unwrap_or(0);
            for (sx, sy, sw, sh) in digits::segment_rects(mask, cursor, y, digit_w) {
                self.fill_scene(sx, sy, sw, sh, color);
            }
            cursor += digit_w * 1.4;
        }
    }

    fn draw_number_centred(&mut self, value: u32, cx: f32, cy: f32, digit_w: f32, color: [u8; 4]) {
        let w = digits::number_width(value, digit_w);
        self.draw_number(value, cx - w / 2.0, cy - digit_w, digit_w, color);
    }

    fn draw_progress(&mut self, completed: usize, total: usize) {
        for i in 0..total {
            let color = if i < completed {
                palette::PIP_DONE
            } else {
                palette::PIP_PENDING
            };
            self.fill_scene(20.0 + i as f32 * 24.0, 420.0, 14.0, 14.0, color);
        }
    }

    fn draw_scene(&mut self, scene: &Scene<'_>) {
        match *scene {
            Scene::Stage {
                stage,
                completed,
                total,
            } => {
                self.fill_scene(100.0, 150.0, 600.0, 150.0, palette::stage(stage));
                let number = match stage {
                    AssessmentStage::Intake => 0,
                    AssessmentStage::Perception => 1,
                    AssessmentStage::FuelPump => 2,
                    AssessmentStage::Illusion => 3,
                    AssessmentStage::Complete => 4,
                };
                self.draw_number_centred(number, 400.0, 225.0, 30.0, palette::DIGIT);
                self.draw_progress(completed, total);
            }
            Scene::Trial {
                snapshot,
                completed,
                total,
            } => {
                match snapshot {
                    Snapshot::Perception(snap) => self.draw_perception(snap),
                    Snapshot::FuelPump(snap) => self.draw_pump(snap),
                    Snapshot::Illusion(snap) => self.draw_illusion(snap),
                }
                self.draw_progress(completed, total);
            }
            Scene::ModeChoice { scenario, total } => {
                for (i, mode) in drivecheck_core::DriveMode::ALL.iter().enumerate() {
                    let x = 160.0 + i as f32 * 280.0;
                    self.fill_scene(x, 150.0, 200.0, 150.0, palette::mode(*mode));
                    self.draw_number_centred(i as u32 + 1, x + 100.0, 225.0, 30.0, palette::DIGIT);
                }
                self.draw_progress(scenario, total);
            }
            Scene::Attribution { outcome, options } => {
                self.fill_scene(100.0, 60.0, 600.0, 60.0, palette::outcome(outcome));
                let gap = 20.0;
                let width = 160.0;
                let span = options as f32 * width + options.saturating_sub(1) as f32 * gap;
                let left = (SCENE_WIDTH - span) / 2.0;
                for i in 0..options {
                    let x = left + i as f32 * (width + gap);
                    self.fill_scene(x, 180.0, width, 160.0, palette::PIP_PENDING);
                    self.draw_number_centred(i as u32 + 1, x + width / 2.0, 260.0, 25.0, palette::DIGIT);
                }
            }
            Scene::Complete { banked_points } => {
                self.fill_scene(100.0, 120.0, 600.0, 60.0, palette::SUCCESS);
                self.draw_number_centred(banked_points, 400.0, 290.0, 30.0, palette::POINTS);
            }
        }
    }

    fn draw_perception(&mut self, snap: &PerceptionSnapshot) {
        let g = self.geometry;
        let (lane_w, lane_h) = (g.lane_width as f32, g.lane_height as f32);
        self.fill_scene(0.0, LANE_TOP, lane_w, lane_h, palette::LANE);

        let mid = LANE_TOP + lane_h / 2.0;
        let mut x = 10.0;
        while x < lane_w {
            self.fill_scene(x, mid - 2.0, 30.0, 4.0, palette::MARKING);
            x += 60.0;
        }
        self.fill_scene(g.obstacle_x as f32, LANE_TOP, OBSTACLE_WIDTH, lane_h, palette::OBSTACLE);

        if snap.car_visible {
            let y = LANE_TOP + (lane_h - g.car_height as f32) / 2.0;
            self.blit_sprite(Sprite::Car, (snap.position_x as f32, y));
        }
        if snap.collided {
            self.fill_scene(0.0, LANE_TOP + lane_h + 10.0, lane_w, 12.0, palette::OBSTACLE);
        }
        if let Some(digit) = snap.countdown {
            self.draw_number_centred(digit, 400.0, 75.0, 30.0, palette::DIGIT);
        }
    }

    fn draw_pump(&mut self, snap: &PumpSnapshot) {
        self.fill_scene(340.0, 60.0, 120.0, 320.0, palette::TANK_FRAME);
        self.fill_scene(350.0, 70.0, 100.0, 300.0, palette::TANK_EMPTY);
        let level = (snap.level_pct.clamp(0.0, 100.0) / 100.0) as f32 * 300.0;
        if level > 0.0 {
            self.fill_scene(350.0, 370.0 - level, 100.0, level, palette::FUEL);
        }

        self.draw_number(snap.pumps, 520.0, 100.0, 25.0, palette::DIGIT);
        self.draw_number(snap.trial_points, 520.0, 230.0, 25.0, palette::POINTS);

        match snap.phase {
            PumpPhase::Exploded => {
                self.blit_sprite(
                    Sprite::Burst,
                    (400.0 - BURST_SIZE / 2.0, 220.0 - BURST_SIZE / 2.0),
                );
            }
            PumpPhase::Stopped => self.fill_scene(340.0, 392.0, 120.0, 12.0, palette::SUCCESS),
            PumpPhase::Ready | PumpPhase::Pumping => {}
        }
    }

    fn draw_illusion(&mut self, snap: &IllusionSnapshot) {
        let lanes = self.lane_count.max(1);
        let lane_h = ROAD_HEIGHT / lanes as f32;
        self.fill_scene(0.0, ROAD_TOP, SCENE_WIDTH, ROAD_HEIGHT, palette::LANE);
        for i in 1..lanes {
            let y = ROAD_TOP + i as f32 * lane_h;
            let mut x = 10.0;
            while x < SCENE_WIDTH {
                self.fill_scene(x, y - 2.0, 30.0, 4.0, palette::MARKING);
                x += 60.0;
            }
        }

        self.fill_scene(20.0, 20.0, 40.0, 40.0, palette::mode(snap.mode));
        if let Some(action) = snap.action {
            self.fill_scene(80.0, 20.0, 40.0, 40.0, palette::action(action));
        }

        let lane_centre = |lane: u8| ROAD_TOP + (lane.min(lanes - 1) as f32 + 0.5) * lane_h;
        let hazard_y = lane_centre(lanes / 2) - HAZARD_SIZE / 2.0;
        self.blit_sprite(Sprite::Hazard, (snap.hazard_x as f32, hazard_y));
        let player_y = lane_centre(snap.lane) - PLAYER_SIZE.1 / 2.0;
        self.blit_sprite(Sprite::Player, (PLAYER_X, player_y));
    }

    fn clear_dirty(&mut self, dirty: &[Rect]) {
        let stride = self.width as usize * 4;
        let clear: &[u8] = cast_slice(&self.clear_buffer);
        let canvas_data = self.canvas.data_mut();

        for rect in dirty {
            let Some((x0, y0, x1, y1)) = pixel_bounds(*rect, self.width, self.height) else {
                continue;
            };
            let row_len = (x1 - x0) * 4;
            for y in y0..y1 {
                let off = y * stride + x0 * 4;
                canvas_data[off..off + row_len].copy_from_slice(&clear[off..off + row_len]);
            }
        }
    }

    fn copy_dirty_region(&self, dirty: Rect, frame_buffer: &mut [u8]) {
        let Some((x0, y0, x1, y1)) = pixel_bounds(dirty, self.width, self.height) else {
            return;
        };
        let bytes = (x1 - x0) * 4;
        let row_bytes = self.width as usize * 4;
        let canvas_data = self.canvas.data();

        for row in y0..y1 {
            let off = row * row_bytes + x0 * 4;
            frame_buffer[off..off + bytes].copy_from_slice(&canvas_data[off..off + bytes]);
        }
    }

    fn coalesce_dirty(rects: &mut Vec<Rect>) {
        rects.sort_by(|a, b| a.y().total_cmp(&b.y()).then(a.x().total_cmp(&b.x())));
        let mut out: Vec<Rect> = Vec::with_capacity(rects.len());
        for r in rects.drain(..) {
            if let Some(last) = out.last_mut() {
                let same_row =
                    (r.y() - last.y()).abs() < 1.0 && (r.height() - last.height()).abs() < 1.0;
                let touching = r.x() <= last.x() + last.width() + 1.0;
                if same_row && touching {
                    let nx = last.x().min(r.x());
                    let nx2 = (last.x() + last.width()).max(r.x() + r.width());
                    if let Some(merged) = Rect::from_xywh(nx, last.y(), nx2 - nx, last.height()) {
                        *last = merged;
                        continue;
                    }
                }
            }
            out.push(r);
        }
        *rects = out;
    }

    fn since(&self, start: f64) -> Duration {
        Duration::from_secs_f64(self.clock.elapsed(start).max(0.0) / 1000.0)
    }
}

impl Renderer for SkiaRenderer {
    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.layout(width, height)
    }

    fn render_frame(&mut self, scene: &Scene<'_>, frame_buffer: &mut [u8]) -> Result<FrameStats> {
        let expected = self.width as usize * self.height as usize * 4;
        if frame_buffer.len() != expected {
            bail!(
                "frame buffer holds {} bytes, expected {expected} for {}x{}",
                frame_buffer.len(),
                self.width,
                self.height
            );
        }
        let t_total = self.clock.now();

        if self.first_frame {
            self.first_frame = false;
            let clear: &[u8] = cast_slice(&self.clear_buffer);
            self.canvas.data_mut().copy_from_slice(clear);
            frame_buffer.copy_from_slice(clear);
            self.dirty_regions.clear();
        }

        // Last frame's content is erased from the canvas before drawing.
        let old_dirty = std::mem::take(&mut self.dirty_regions);
        let t = self.clock.now();
        self.clear_dirty(&old_dirty);
        let clear = self.since(t);

        let t = self.clock.now();
        self.draw_scene(scene);
        let draw = self.since(t);

        let mut present = old_dirty;
        present.extend_from_slice(&self.dirty_regions);
        Self::coalesce_dirty(&mut present);

        let t = self.clock.now();
        for rect in &present {
            self.copy_dirty_region(*rect, frame_buffer);
        }
        let copy = self.since(t);

        Ok(FrameStats {
            clear,
            draw,
            copy,
            total: self.since(t_total),
            dirty_count: present.len(),
        })
    }
}

fn paint(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = false;
    paint
}

fn fill(pixmap: &mut Pixmap, rect: Option<Rect>, color: [u8; 4]) {
    if let Some(rect) = rect {
        pixmap.fill_rect(rect, &paint(color), Transform::identity(), None);
    }
}

fn pixel_bounds(rect: Rect, width: u32, height: u32) -> Option<(usize, usize, usize, usize)> {
    let x0 = rect.x().floor().clamp(0.0, width as f32) as usize;
    let y0 = rect.y().floor().clamp(0.0, height as f32) as usize;
    let x1 = rect.right().ceil().clamp(0.0, width as f32) as usize;
    let y1 = rect.bottom().ceil().clamp(0.0, height as f32) as usize;
    (x1 > x0 && y1 > y0).then_some((x0, y0, x1, y1))
}

/// Porter-Duff over in premultiplied space.
fn blend_over(src: &[u8], dst: &mut [u8]) {
    let inv = 255 - u32::from(src[3]);
    if inv == 255 {
        return;
    }
    for c in 0..4 {
        let d = u32::from(dst[c]);
        dst[c] = (u32::from(src[c]) + (d * inv + 127) / 255).min(255) as u8;
    }
}
