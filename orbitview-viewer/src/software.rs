//! CPU reference renderer
//!
//! Rasterises a [`RenderRequest`] into an RGBA8 [`Frame`] with a depth
//! buffer and per-vertex lighting. It backs headless use and tests; a GPU
//! renderer plugs into the same [`Renderer`] trait.

use crate::render::{Frame, RenderError, RenderRequest, Renderer};
use crate::scene::{LightingParams, MaterialKind, PresetParams, SceneModel, Toggle};
use nalgebra::Vector4;
use orbitview_core::math::rotate_about_pivot;
use orbitview_core::{Asset, Drawable, Matrix4f, Point3f, Rotation3f, Vector3f};

const EPSILON: f32 = 1e-6;

/// Software rasteriser settings
#[derive(Debug, Clone, PartialEq)]
pub struct SoftwareRenderConfig {
    pub enable_backface_culling: bool,
    /// Axis length relative to the asset's extent
    pub axis_scale: f32,
}

impl Default for SoftwareRenderConfig {
    fn default() -> Self {
        Self {
            enable_backface_culling: false,
            axis_scale: 1.2,
        }
    }
}

#[derive(Debug, Default)]
pub struct SoftwareRenderer {
    config: SoftwareRenderConfig,
    frames_rendered: u64,
}

impl SoftwareRenderer {
    pub fn new(config: SoftwareRenderConfig) -> Self {
        Self {
            config,
            frames_rendered: 0,
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

impl Renderer for SoftwareRenderer {
    fn render(&mut self, request: &RenderRequest) -> Result<Frame, RenderError> {
        let viewport = request.viewport;
        if viewport.is_empty() {
            return Err(RenderError::Transient(format!(
                "cannot render into a {}x{} viewport",
                viewport.width, viewport.height
            )));
        }
        let view_proj = request
            .camera
            .view_projection(viewport)
            .map_err(|e| RenderError::Transient(e.to_string()))?;

        let scene = request.scene.as_ref();
        let mut canvas = Canvas::new(Frame::new(request.id, viewport.width, viewport.height), view_proj);
        let eye = request.camera.position();

        if scene.toggle(Toggle::ShowSkymap) {
            canvas.fill_sky(&scene.lighting_params(), scene.environment_rotation(), eye);
        } else {
            let bg = scene.background();
            canvas.clear([bg.r, bg.g, bg.b]);
        }

        if let Some(asset) = scene.asset().filter(|a| !a.is_empty()) {
            let shading = Shading::new(scene, eye);
            self.draw_asset(&mut canvas, asset, scene.model_rotation(), &shading);
        }

        if scene.toggle(Toggle::ShowAxes) {
            let length = scene
                .asset()
                .filter(|a| !a.is_empty())
                .map(|a| (a.center().coords.norm() + a.bounding_radius()) * self.config.axis_scale)
                .unwrap_or(1.0)
                .max(EPSILON);
            let origin = Point3f::origin();
            for (axis, color) in [
                (Vector3f::x(), Vector3f::new(0.9, 0.1, 0.1)),
                (Vector3f::y(), Vector3f::new(0.1, 0.75, 0.1)),
                (Vector3f::z(), Vector3f::new(0.1, 0.2, 0.9)),
            ] {
                canvas.draw_world_line(&origin, &(origin + axis * length), &color);
            }
        }

        self.frames_rendered += 1;
        Ok(canvas.into_frame())
    }

    fn name(&self) -> &str {
        "software"
    }
}

impl SoftwareRenderer {
    fn draw_asset(&self, canvas: &mut Canvas, asset: &Asset, rotation: Rotation3f, shading: &Shading) {
        let pivot = asset.center();
        let shaded: Vec<ShadedVertex> = asset
            .vertices()
            .iter()
            .map(|v| {
                let world = rotate_about_pivot(&v.position, &pivot, &rotation);
                let normal = rotation * v.normal;
                ShadedVertex {
                    screen: canvas.project(&world),
                    color: shading.shade(&world, &normal),
                }
            })
            .collect();

        if asset.is_point_cloud() {
            let size = shading.point_size.round().max(1.0) as i64;
            for vertex in &shaded {
                if let Some(p) = vertex.screen {
                    canvas.splat(&p, size, &vertex.color, shading.opacity);
                }
            }
            return;
        }

        for [a, b, c] in asset.triangles() {
            let corners = [&shaded[a as usize], &shaded[b as usize], &shaded[c as usize]];
            let (Some(pa), Some(pb), Some(pc)) = (corners[0].screen, corners[1].screen, corners[2].screen) else {
                continue;
            };
            if shading.kind == MaterialKind::Wireframe {
                canvas.draw_line(&pa, &pb, &corners[0].color, &corners[1].color);
                canvas.draw_line(&pb, &pc, &corners[1].color, &corners[2].color);
                canvas.draw_line(&pc, &pa, &corners[2].color, &corners[0].color);
            } else {
                canvas.fill_triangle(
                    [pa, pb, pc],
                    [corners[0].color, corners[1].color, corners[2].color],
                    shading.opacity,
                    self.config.enable_backface_culling,
                );
            }
        }
    }
}

struct ShadedVertex {
    screen: Option<ScreenPoint>,
    color: Vector3f,
}

/// Pixel coordinates plus NDC depth
#[derive(Debug, Clone, Copy)]
struct ScreenPoint {
    x: f32,
    y: f32,
    z: f32,
}

/// Per-vertex lighting for one scene snapshot
struct Shading {
    kind: MaterialKind,
    base: Vector3f,
    preset: PresetParams,
    light: LightingParams,
    eye: Point3f,
    opacity: f32,
    point_size: f32,
}

impl Shading {
    fn new(scene: &SceneModel, eye: Point3f) -> Self {
        let material = scene.material();
        let preset = material.preset.params();
        Self {
            kind: material.kind,
            base: Vector3f::from(material.base_color.to_f32()),
            preset,
            light: scene.lighting_params(),
            eye,
            opacity: preset.opacity.clamp(0.0, 1.0),
            point_size: material.point_size,
        }
    }

    fn shade(&self, position: &Point3f, normal: &Vector3f) -> Vector3f {
        match self.kind {
            MaterialKind::Unlit | MaterialKind::Wireframe => self.base,
            MaterialKind::Lit | MaterialKind::Pbr => {
                let view = (self.eye - position).try_normalize(EPSILON).unwrap_or_else(Vector3f::z);
                let mut n = normal.try_normalize(EPSILON).unwrap_or(view);
                // lit from both sides
                if n.dot(&view) < 0.0 {
                    n = -n;
                }
                let l = self.light.sun_direction;
                let sun = Vector3f::from(self.light.sun_color) * self.light.sun_intensity;
                let diffuse = n.dot(&l).max(0.0);
                let irradiance = Vector3f::repeat(self.light.ambient) + sun * diffuse;
                let mut color = self.base.component_mul(&irradiance);

                if self.kind == MaterialKind::Pbr {
                    let PresetParams { roughness, metallic, .. } = self.preset;
                    let half = (l + view).try_normalize(EPSILON).unwrap_or(n);
                    let shininess = (2.0 / (roughness * roughness).max(1e-3) - 2.0).max(1.0);
                    let specular = if diffuse > 0.0 {
                        n.dot(&half).max(0.0).powf(shininess)
                    } else {
                        0.0
                    };
                    let f0 = Vector3f::repeat(0.04).lerp(&self.base, metallic);
                    color = color * (1.0 - 0.5 * metallic) + f0.component_mul(&sun) * specular;
                }
                color
            }
        }
    }
}

/// Frame plus depth buffer and the projection used to draw into it
struct Canvas {
    frame: Frame,
    depth: Vec<f32>,
    view_proj: Matrix4f,
}

impl Canvas {
    fn new(frame: Frame, view_proj: Matrix4f) -> Self {
        let depth = vec![f32::INFINITY; frame.width as usize * frame.height as usize];
        Self { frame, depth, view_proj }
    }

    fn into_frame(self) -> Frame {
        self.frame
    }

    fn clear(&mut self, rgb: [u8; 3]) {
        for px in self.frame.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
    }

    fn fill_sky(&mut self, light: &LightingParams, yaw: f32, eye: Point3f) {
        let Some(inverse) = self.view_proj.try_inverse() else {
            self.clear([0, 0, 0]);
            return;
        };
        let zenith = Vector3f::from(light.sky_zenith);
        let horizon = Vector3f::from(light.sky_horizon);
        let (w, h) = (self.frame.width, self.frame.height);
        for y in 0..h {
            for x in 0..w {
                let ndc_x = (x as f32 + 0.5) / w as f32 * 2.0 - 1.0;
                let ndc_y = 1.0 - (y as f32 + 0.5) / h as f32 * 2.0;
                let far = inverse * Vector4::new(ndc_x, ndc_y, 1.0, 1.0);
                let world = Point3f::from(far.xyz() / far.w);
                let dir = (world - eye).try_normalize(EPSILON).unwrap_or_else(Vector3f::z);
                let color = if dir.y >= 0.0 {
                    horizon.lerp(&zenith, dir.y)
                } else {
                    horizon * (1.0 + 0.4 * dir.y)
                };
                // faint longitudinal banding so skymap rotation is visible
                let azimuth = dir.z.atan2(dir.x) + yaw;
                let color = color * (1.0 + 0.06 * azimuth.cos());
                self.write(x as usize, y as usize, &color);
            }
        }
    }

    /// Screen position of a world point, `None` behind the camera
    fn project(&self, world: &Point3f) -> Option<ScreenPoint> {
        let clip = self.view_proj * world.to_homogeneous();
        if clip.w <= EPSILON {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        Some(ScreenPoint {
            x: (ndc.x + 1.0) * 0.5 * self.frame.width as f32,
            y: (1.0 - ndc.y) * 0.5 * self.frame.height as f32,
            z: ndc.z,
        })
    }

    fn write(&mut self, x: usize, y: usize, color: &Vector3f) {
        let i = 4 * (y * self.frame.width as usize + x);
        self.frame.pixels[i] = to_channel(color.x);
        self.frame.pixels[i + 1] = to_channel(color.y);
        self.frame.pixels[i + 2] = to_channel(color.z);
        self.frame.pixels[i + 3] = 255;
    }

    /// Depth-tested, alpha-blended pixel write
    fn blend(&mut self, x: i64, y: i64, z: f32, color: &Vector3f, alpha: f32) {
        if x < 0 || y < 0 || x >= self.frame.width as i64 || y >= self.frame.height as i64 || !(-1.0..=1.0).contains(&z) {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let slot = y * self.frame.width as usize + x;
        if z >= self.depth[slot] {
            return;
        }
        if alpha >= 1.0 {
            self.depth[slot] = z;
            self.write(x, y, color);
        } else {
            let i = 4 * slot;
            let under = Vector3f::new(
                self.frame.pixels[i] as f32 / 255.0,
                self.frame.pixels[i + 1] as f32 / 255.0,
                self.frame.pixels[i + 2] as f32 / 255.0,
            );
            self.write(x, y, &under.lerp(color, alpha));
        }
    }

    fn fill_triangle(&mut self, p: [ScreenPoint; 3], colors: [Vector3f; 3], alpha: f32, cull: bool) {
        let area = edge(&p[0], &p[1], p[2].x, p[2].y);
        // screen y points down, so front faces have negative area
        if area.abs() < EPSILON || (cull && area > 0.0) {
            return;
        }
        let (w, h) = (self.frame.width as f32, self.frame.height as f32);
        let min_x = p.iter().map(|q| q.x).fold(f32::INFINITY, f32::min).floor().max(0.0);
        let max_x = p.iter().map(|q| q.x).fold(f32::NEG_INFINITY, f32::max).ceil().min(w - 1.0);
        let min_y = p.iter().map(|q| q.y).fold(f32::INFINITY, f32::min).floor().max(0.0);
        let max_y = p.iter().map(|q| q.y).fold(f32::NEG_INFINITY, f32::max).ceil().min(h - 1.0);
        if min_x > max_x || min_y > max_y {
            return;
        }

        for y in min_y as i64..=max_y as i64 {
            for x in min_x as i64..=max_x as i64 {
                let (sx, sy) = (x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(&p[1], &p[2], sx, sy) / area;
                let w1 = edge(&p[2], &p[0], sx, sy) / area;
                let w2 = 1.0 - w0 - w1;
                if w0 < -EPSILON || w1 < -EPSILON || w2 < -EPSILON {
                    continue;
                }
                let z = w0 * p[0].z + w1 * p[1].z + w2 * p[2].z;
                let color = colors[0] * w0 + colors[1] * w1 + colors[2] * w2;
                self.blend(x, y, z, &color, alpha);
            }
        }
    }

    fn draw_line(&mut self, a: &ScreenPoint, b: &ScreenPoint, color_a: &Vector3f, color_b: &Vector3f) {
        let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).ceil().clamp(1.0, 16_384.0) as usize;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let x = a.x + (b.x - a.x) * t;
            let y = a.y + (b.y - a.y) * t;
            // lines win ties against the surfaces they outline
            let z = a.z + (b.z - a.z) * t - 1e-4;
            self.blend(x.floor() as i64, y.floor() as i64, z, &color_a.lerp(color_b, t), 1.0);
        }
    }

    fn draw_world_line(&mut self, from: &Point3f, to: &Point3f, color: &Vector3f) {
        if let (Some(a), Some(b)) = (self.project(from), self.project(to)) {
            self.draw_line(&a, &b, color, color);
        }
    }

    fn splat(&mut self, p: &ScreenPoint, size: i64, color: &Vector3f, alpha: f32) {
        let x0 = p.x.floor() as i64 - (size - 1) / 2;
        let y0 = p.y.floor() as i64 - (size - 1) / 2;
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                self.blend(x, y, p.z, color, alpha);
            }
        }
    }
}

fn edge(a: &ScreenPoint, b: &ScreenPoint, x: f32, y: f32) -> f32 {
    (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x)
}

fn to_channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
