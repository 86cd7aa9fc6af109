//! Polylines, dimension lines and labels displayed in 3D.
//!
//! Text is not rasterized here: text shapes are flat quads whose texture
//! reference is `text:<font>:<content>`, left to the renderer to draw.

use cgmath::{Matrix4, Point3, Rad, Transform, Vector3};

use crate::common::RgbaColor;
use crate::home::{Home, HomeItem, ObjectId};
use crate::scene::{Appearance, AppearanceFlags, Geometry, NodeId, NodeKind, Scene, Visibility};

use super::{packed_color, plan_point, Object3D, Object3DBase};

/// Default text height, in centimeters.
const TEXT_SIZE: f32 = 18.0;
/// Gap between a dimension line and its text.
const TEXT_OFFSET: f32 = 5.0;

/// Reference of a text texture.
pub fn text_texture(font: Option<&str>, text: &str) -> String {
    format!("text:{}:{}", font.unwrap_or("default"), text)
}

/// A vertical text quad centered on the origin, rotated by `yaw` around the
/// vertical axis and tilted by `pitch`, then moved to `center`.
fn text_quad(text: &str, center: Point3<f32>, yaw: f32, pitch: f32) -> Geometry {
    let width = text.chars().count().max(1) as f32 * TEXT_SIZE * 0.6;
    let (hw, hh) = (width / 2.0, TEXT_SIZE / 2.0);
    let transform = Matrix4::from_translation(center - Point3::new(0.0, 0.0, 0.0))
        * Matrix4::from_angle_y(Rad(-yaw))
        * Matrix4::from_angle_x(Rad(-pitch));
    let positions = [[-hw, -hh], [hw, -hh], [hw, hh], [-hw, hh]]
        .iter()
        .map(|[x, y]| transform.transform_point(Point3::new(*x, *y, 0.0)))
        .collect();
    Geometry::triangles(positions, vec![0, 1, 2, 0, 2, 3])
}

fn visibility(visible: bool) -> Visibility {
    if visible {
        Visibility::Visible
    } else {
        Visibility::Invisible
    }
}

macro_rules! impl_object3d {
    ($type:ty) => {
        impl Object3D for $type {
            fn item(&self) -> ObjectId {
                self.base.item
            }

            fn node(&self) -> NodeId {
                self.base.node
            }

            fn update(&mut self, home: &Home, scene: &mut Scene) -> anyhow::Result<()> {
                self.base.update_count += 1;
                self.rebuild(home, scene)
            }

            fn update_count(&self) -> u32 {
                self.base.update_count
            }
        }
    };
}

/// A polyline drawn as lines at its elevation.
pub struct Polyline3D {
    base: Object3DBase,
}

impl Polyline3D {
    pub fn create(
        home: &Home,
        item: ObjectId,
        scene: &mut Scene,
        parent: NodeId,
        index: Option<usize>,
    ) -> anyhow::Result<Self> {
        let polyline = Self {
            base: Object3DBase::create(item, scene, parent, index, "polyline", NodeKind::Group)?,
        };
        polyline.rebuild(home, scene)?;
        Ok(polyline)
    }

    fn rebuild(&self, home: &Home, scene: &mut Scene) -> anyhow::Result<()> {
        self.base.clear(scene);
        let Some(HomeItem::Polyline(polyline)) = home.item(self.base.item) else {
            return Ok(());
        };
        let visible = polyline.visible_in_3d && home.is_level_viewable(polyline.level);
        if visible && polyline.points.len() >= 2 {
            let elevation = home.level_elevation(polyline.level) + polyline.elevation;
            let points = polyline.points.iter().map(|&point| plan_point(point, elevation)).collect();
            scene.add_node(
                Some(self.base.node),
                Some("polyline".to_string()),
                NodeKind::Shape {
                    geometry: Geometry::polyline(points, polyline.closed),
                    appearance: Appearance::new(RgbaColor::from_packed_rgb(polyline.color))
                        .with_flags(AppearanceFlags::UNLIT),
                },
            )?;
        }
        scene.set_visibility(self.base.node, visibility(visible));
        Ok(())
    }
}

impl_object3d!(Polyline3D);

/// A dimension line with its extension lines and its length text.
pub struct DimensionLine3D {
    base: Object3DBase,
}

impl DimensionLine3D {
    pub fn create(
        home: &Home,
        item: ObjectId,
        scene: &mut Scene,
        parent: NodeId,
        index: Option<usize>,
    ) -> anyhow::Result<Self> {
        let line = Self {
            base: Object3DBase::create(item, scene, parent, index, "dimension", NodeKind::Group)?,
        };
        line.rebuild(home, scene)?;
        Ok(line)
    }

    fn rebuild(&self, home: &Home, scene: &mut Scene) -> anyhow::Result<()> {
        self.base.clear(scene);
        let Some(HomeItem::DimensionLine(line)) = home.item(self.base.item) else {
            return Ok(());
        };
        let visible = line.visible_in_3d && home.is_level_viewable(line.level);
        let length = line.length();
        if visible && length > 0.0 {
            let level_elevation = home.level_elevation(line.level);
            let (dx, dy) = ((line.x_end - line.x_start) / length, (line.y_end - line.y_start) / length);
            let (nx, ny) = (-dy * line.offset, dx * line.offset);
            let start_elevation = level_elevation + line.elevation_start;
            let end_elevation = level_elevation + line.elevation_end;

            let positions = vec![
                plan_point([line.x_start, line.y_start], start_elevation),
                plan_point([line.x_start + nx, line.y_start + ny], start_elevation),
                plan_point([line.x_end + nx, line.y_end + ny], end_elevation),
                plan_point([line.x_end, line.y_end], end_elevation),
            ];
            let color = RgbaColor::BLACK;
            scene.add_node(
                Some(self.base.node),
                Some("dimension-lines".to_string()),
                NodeKind::Shape {
                    geometry: Geometry::lines(positions, vec![0, 1, 1, 2, 2, 3]),
                    appearance: Appearance::new(color).with_flags(AppearanceFlags::UNLIT),
                },
            )?;

            let preferences = home.preferences();
            let text = preferences.unit.format(length);
            let middle = Point3::new(
                (line.x_start + line.x_end) / 2.0 + nx,
                (start_elevation + end_elevation) / 2.0 + TEXT_OFFSET + TEXT_SIZE / 2.0,
                (line.y_start + line.y_end) / 2.0 + ny,
            );
            let yaw = dy.atan2(dx);
            scene.add_node(
                Some(self.base.node),
                Some("dimension-text".to_string()),
                NodeKind::Shape {
                    geometry: text_quad(&text, middle, yaw, 0.0),
                    appearance: Appearance::new(color)
                        .with_texture(Some(text_texture(preferences.default_font_name.as_deref(), &text)))
                        .with_flags(AppearanceFlags::UNLIT | AppearanceFlags::DOUBLE_SIDED),
                },
            )?;
        }
        scene.set_visibility(self.base.node, visibility(visible));
        Ok(())
    }
}

impl_object3d!(DimensionLine3D);

/// A label, displayed in 3D only when it has a pitch.
pub struct Label3D {
    base: Object3DBase,
}

impl Label3D {
    pub fn create(
        home: &Home,
        item: ObjectId,
        scene: &mut Scene,
        parent: NodeId,
        index: Option<usize>,
    ) -> anyhow::Result<Self> {
        let label = Self {
            base: Object3DBase::create(item, scene, parent, index, "label", NodeKind::Group)?,
        };
        label.rebuild(home, scene)?;
        Ok(label)
    }

    fn rebuild(&self, home: &Home, scene: &mut Scene) -> anyhow::Result<()> {
        self.base.clear(scene);
        let Some(HomeItem::Label(label)) = home.item(self.base.item) else {
            return Ok(());
        };
        let visible = label.pitch.is_some() && !label.text.is_empty() && home.is_level_viewable(label.level);
        if let (true, Some(pitch)) = (visible, label.pitch) {
            let elevation = home.level_elevation(label.level) + label.elevation;
            let center = plan_point([label.x, label.y], elevation) + Vector3::new(0.0, TEXT_SIZE / 2.0, 0.0);
            scene.add_node(
                Some(self.base.node),
                Some("label-text".to_string()),
                NodeKind::Shape {
                    geometry: text_quad(&label.text, center, 0.0, pitch),
                    appearance: Appearance::new(packed_color(label.color, RgbaColor::BLACK))
                        .with_texture(Some(text_texture(home.preferences().default_font_name.as_deref(), &label.text)))
                        .with_flags(AppearanceFlags::UNLIT | AppearanceFlags::DOUBLE_SIDED),
                },
            )?;
        }
        scene.set_visibility(self.base.node, visibility(visible));
        Ok(())
    }
}

impl_object3d!(Label3D);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::home::{DimensionLine, DimensionLineProperty, Label, LengthUnit, Polyline};

    fn root(scene: &mut Scene) -> NodeId {
        scene.add_node(None, None, NodeKind::Group).unwrap()
    }

    fn texture_of(scene: &mut Scene, node: NodeId, child: usize) -> Option<String> {
        let id = scene.get_node(node).unwrap().children()[child];
        scene.appearance_mut(id).unwrap().texture.clone()
    }

    #[test]
    fn test_polyline_hidden_unless_visible_in_3d() {
        let mut home = Home::new();
        let id = home.add_polyline(Polyline::new(vec![[0.0, 0.0], [100.0, 0.0], [100.0, 100.0]]));
        let mut scene = Scene::new();
        let parent = root(&mut scene);
        let mut polyline = Polyline3D::create(&home, id, &mut scene, parent, None).unwrap();
        assert!(!scene.is_visible(polyline.node()));

        home.modify_polyline(id, crate::home::PolylineProperty::VisibleIn3D, |p| p.visible_in_3d = true);
        polyline.update(&home, &mut scene).unwrap();
        assert!(scene.is_visible(polyline.node()));
        assert_eq!(scene.get_node(polyline.node()).unwrap().children().len(), 1);
    }

    #[test]
    fn test_dimension_text_follows_unit() {
        let mut home = Home::new();
        let mut line = DimensionLine::new(0.0, 0.0, 250.0, 0.0, 20.0);
        line.visible_in_3d = true;
        let id = home.add_dimension_line(line);
        let mut scene = Scene::new();
        let parent = root(&mut scene);
        let mut dimension = DimensionLine3D::create(&home, id, &mut scene, parent, None).unwrap();
        assert_eq!(texture_of(&mut scene, dimension.node(), 1).as_deref(), Some("text:default:250.0 cm"));

        home.modify_preferences(|preferences| preferences.unit = LengthUnit::Meter);
        dimension.update(&home, &mut scene).unwrap();
        assert_eq!(texture_of(&mut scene, dimension.node(), 1).as_deref(), Some("text:default:2.500 m"));

        home.modify_dimension_line(id, DimensionLineProperty::VisibleIn3D, |line| line.visible_in_3d = false);
        dimension.update(&home, &mut scene).unwrap();
        assert!(scene.get_node(dimension.node()).unwrap().children().is_empty());
    }

    #[test]
    fn test_label_needs_pitch() {
        let mut home = Home::new();
        let flat = home.add_label(Label::new("Kitchen", 100.0, 100.0));
        let mut pitched = Label::new("Hall", 0.0, 0.0);
        pitched.pitch = Some(0.0);
        let pitched = home.add_label(pitched);

        let mut scene = Scene::new();
        let parent = root(&mut scene);
        let flat3d = Label3D::create(&home, flat, &mut scene, parent, None).unwrap();
        let pitched3d = Label3D::create(&home, pitched, &mut scene, parent, None).unwrap();
        assert!(!scene.is_visible(flat3d.node()));
        assert!(scene.is_visible(pitched3d.node()));
        assert_eq!(texture_of(&mut scene, pitched3d.node(), 0).as_deref(), Some("text:default:Hall"));
    }
}
