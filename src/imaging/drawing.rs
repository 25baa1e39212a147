//! Vector shapes that can be drawn onto a surface.
//!
//! [`DrawingObject`] is a closed set of six shapes. Each carries its own
//! geometry plus optional border and fill colors; `None` suppresses that pass.
//! Objects are plain values: construct, hand to
//! [`Editor::draw`](crate::Editor::draw), done.
//!
//! | Shape | Border | Fill | Geometry rule |
//! |---|---|---|---|
//! | `Line` | color, thickness | – | two points |
//! | `Rectangle` | optional | optional | positive size, top-left position |
//! | `Ellipse` | optional | optional | positive size, top-left of bounding box |
//! | `Polygon` | optional | optional | at least three points |
//! | `QuadraticBezier` | color | – | start, control, end |
//! | `CubicBezier` | color | – | start, two controls, end |

use super::params::{Color, Point};
use crate::error::{GrafikaError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawingObject {
    Line {
        start: Point,
        end: Point,
        thickness: u32,
        color: Color,
    },
    Rectangle {
        width: u32,
        height: u32,
        position: Point,
        border_size: u32,
        border_color: Option<Color>,
        fill_color: Option<Color>,
    },
    Ellipse {
        width: u32,
        height: u32,
        position: Point,
        border_size: u32,
        border_color: Option<Color>,
        fill_color: Option<Color>,
    },
    Polygon {
        points: Vec<Point>,
        border_size: u32,
        border_color: Option<Color>,
        fill_color: Option<Color>,
    },
    QuadraticBezier {
        start: Point,
        control: Point,
        end: Point,
        color: Color,
    },
    CubicBezier {
        start: Point,
        control1: Point,
        control2: Point,
        end: Point,
        color: Color,
    },
}

impl DrawingObject {
    pub fn line(start: Point, end: Point, thickness: u32, color: Color) -> Self {
        Self::Line {
            start,
            end,
            thickness,
            color,
        }
    }

    pub fn rectangle(
        width: u32,
        height: u32,
        position: Point,
        border_size: u32,
        border_color: Option<Color>,
        fill_color: Option<Color>,
    ) -> Self {
        Self::Rectangle {
            width,
            height,
            position,
            border_size,
            border_color,
            fill_color,
        }
    }

    pub fn ellipse(
        width: u32,
        height: u32,
        position: Point,
        border_size: u32,
        border_color: Option<Color>,
        fill_color: Option<Color>,
    ) -> Self {
        Self::Ellipse {
            width,
            height,
            position,
            border_size,
            border_color,
            fill_color,
        }
    }

    pub fn polygon(
        points: Vec<Point>,
        border_size: u32,
        border_color: Option<Color>,
        fill_color: Option<Color>,
    ) -> Self {
        Self::Polygon {
            points,
            border_size,
            border_color,
            fill_color,
        }
    }

    pub fn quadratic_bezier(start: Point, control: Point, end: Point, color: Color) -> Self {
        Self::QuadraticBezier {
            start,
            control,
            end,
            color,
        }
    }

    pub fn cubic_bezier(
        start: Point,
        control1: Point,
        control2: Point,
        end: Point,
        color: Color,
    ) -> Self {
        Self::CubicBezier {
            start,
            control1,
            control2,
            end,
            color,
        }
    }

    /// Build a shape from its symbolic name (`"Line"`, `"Rectangle"`, `"Ellipse"`,
    /// `"Polygon"`, `"QuadraticBezier"`, `"CubicBezier"`; case-insensitive).
    pub fn from_name(name: &str, args: ShapeArgs) -> Result<Self> {
        let ShapeArgs {
            points,
            width,
            height,
            thickness,
            border_color,
            fill_color,
        } = args;
        let point = |i: usize| {
            points.get(i).copied().ok_or_else(|| {
                GrafikaError::invalid(format!("{name} needs at least {} points", i + 1))
            })
        };
        let stroke_color = border_color.unwrap_or(Color::BLACK);
        let object = match name.to_ascii_lowercase().as_str() {
            "line" => Self::line(point(0)?, point(1)?, thickness, stroke_color),
            "rectangle" => Self::rectangle(
                width,
                height,
                points.first().copied().unwrap_or_default(),
                thickness,
                border_color,
                fill_color,
            ),
            "ellipse" => Self::ellipse(
                width,
                height,
                points.first().copied().unwrap_or_default(),
                thickness,
                border_color,
                fill_color,
            ),
            "polygon" => Self::polygon(points.clone(), thickness, border_color, fill_color),
            "quadraticbezier" => {
                Self::quadratic_bezier(point(0)?, point(1)?, point(2)?, stroke_color)
            }
            "cubicbezier" => {
                Self::cubic_bezier(point(0)?, point(1)?, point(2)?, point(3)?, stroke_color)
            }
            _ => {
                return Err(GrafikaError::invalid(format!(
                    "invalid drawing object name '{name}'"
                )));
            }
        };
        object.validate()?;
        Ok(object)
    }

    /// Shape name as accepted by [`from_name`](Self::from_name).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Line { .. } => "Line",
            Self::Rectangle { .. } => "Rectangle",
            Self::Ellipse { .. } => "Ellipse",
            Self::Polygon { .. } => "Polygon",
            Self::QuadraticBezier { .. } => "QuadraticBezier",
            Self::CubicBezier { .. } => "CubicBezier",
        }
    }

    /// Reject geometry no backend can render.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Rectangle { width, height, .. } | Self::Ellipse { width, height, .. }
                if *width == 0 || *height == 0 =>
            {
                Err(GrafikaError::invalid(format!(
                    "{} size must be positive, got {width}x{height}",
                    self.name()
                )))
            }
            Self::Polygon { points, .. } if points.len() < 3 => Err(GrafikaError::invalid(
                format!("Polygon needs at least 3 points, got {}", points.len()),
            )),
            _ => Ok(()),
        }
    }

    /// Whether a border/stroke pass will paint anything.
    pub fn has_border(&self) -> bool {
        match self {
            Self::Line { thickness, .. } => *thickness > 0,
            Self::Rectangle {
                border_size,
                border_color,
                ..
            }
            | Self::Ellipse {
                border_size,
                border_color,
                ..
            }
            | Self::Polygon {
                border_size,
                border_color,
                ..
            } => *border_size > 0 && border_color.is_some(),
            Self::QuadraticBezier { .. } | Self::CubicBezier { .. } => true,
        }
    }
}

/// Loose arguments for [`DrawingObject::from_name`].
///
/// Defaults mirror the typed helpers: thickness 1, black border, white fill.
/// `points` holds the position for rectangles and ellipses (defaults to the
/// origin), and the ordered control points for everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeArgs {
    pub points: Vec<Point>,
    pub width: u32,
    pub height: u32,
    pub thickness: u32,
    pub border_color: Option<Color>,
    pub fill_color: Option<Color>,
}

impl Default for ShapeArgs {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            width: 0,
            height: 0,
            thickness: 1,
            border_color: Some(Color::BLACK),
            fill_color: Some(Color::WHITE),
        }
    }
}

impl ShapeArgs {
    pub fn points(mut self, points: impl IntoIterator<Item = impl Into<Point>>) -> Self {
        self.points = points.into_iter().map(Into::into).collect();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn thickness(mut self, thickness: u32) -> Self {
        self.thickness = thickness;
        self
    }

    pub fn border(mut self, color: Option<Color>) -> Self {
        self.border_color = color;
        self
    }

    pub fn fill(mut self, color: Option<Color>) -> Self {
        self.fill_color = color;
        self
    }
}
