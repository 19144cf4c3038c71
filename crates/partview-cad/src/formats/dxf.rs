//! ASCII DXF reader.
//!
//! Reads the `ENTITIES` section and turns the supported entity types into
//! polylines. Everything else (text, hatches, dimensions, block
//! references, ...) is counted and skipped.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use nalgebra::{Point2, Vector2};

use crate::error::BackendError;

const FORMAT: &str = "DXF";
const BINARY_SENTINEL: &[u8] = b"AutoCAD Binary DXF";
/// Upper bound on segments per curved entity.
const MAX_SEGMENTS: usize = 360;

/// A supported DXF entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// Straight segment.
    Line {
        /// Start point.
        start: Point2<f64>,
        /// End point.
        end: Point2<f64>,
    },
    /// Full circle.
    Circle {
        /// Centre.
        center: Point2<f64>,
        /// Radius.
        radius: f64,
    },
    /// Counter-clockwise arc, angles in degrees.
    Arc {
        /// Centre.
        center: Point2<f64>,
        /// Radius.
        radius: f64,
        /// Start angle.
        start_deg: f64,
        /// End angle.
        end_deg: f64,
    },
    /// Polyline with optional bulge (arc) segments.
    Polyline {
        /// Vertices with the bulge of the segment that starts at each.
        vertices: Vec<(Point2<f64>, f64)>,
        /// Whether the last vertex connects back to the first.
        closed: bool,
    },
    /// Ellipse or elliptical arc, parameters in radians.
    Ellipse {
        /// Centre.
        center: Point2<f64>,
        /// Major axis endpoint relative to the centre.
        major: Vector2<f64>,
        /// Minor to major axis ratio.
        ratio: f64,
        /// Start parameter.
        start: f64,
        /// End parameter.
        end: f64,
    },
    /// Spline approximated by its fit points or control polygon.
    Spline {
        /// Points to connect.
        points: Vec<Point2<f64>>,
        /// Whether the spline is closed.
        closed: bool,
    },
    /// Single point.
    Point(Point2<f64>),
}

/// Parsed drawing content.
#[derive(Debug, Clone, Default)]
pub struct Drawing {
    /// Supported entities in file order.
    pub entities: Vec<Entity>,
    /// Count of skipped entities per type.
    pub skipped: BTreeMap<String, usize>,
    /// Count of every entity in the `ENTITIES` section per type.
    pub entity_counts: BTreeMap<String, usize>,
    /// `$ACADVER` from the header, e.g. `AC1015`.
    pub version: Option<String>,
    /// Layer names from the layer table, in file order.
    pub layers: Vec<String>,
}

impl Drawing {
    /// Flatten every entity into polylines. Points that overflow to a
    /// non-finite value are dropped.
    pub fn tessellate(&self) -> Vec<Vec<Point2<f64>>> {
        self.entities
            .iter()
            .map(|entity| {
                let mut points = entity.tessellate();
                points.retain(|p| p.x.is_finite() && p.y.is_finite());
                points
            })
            .collect()
    }
}

impl Entity {
    /// Approximate this entity as a polyline.
    pub fn tessellate(&self) -> Vec<Point2<f64>> {
        match self {
            Self::Line { start, end } => vec![*start, *end],
            Self::Point(p) => vec![*p],
            Self::Circle { center, radius } => arc_points(*center, *radius, 0.0, TAU),
            Self::Arc {
                center,
                radius,
                start_deg,
                end_deg,
            } => {
                let start = start_deg.rem_euclid(360.0).to_radians();
                let end = end_deg.rem_euclid(360.0).to_radians();
                arc_points(*center, *radius, start, ccw_sweep(start, end))
            }
            Self::Ellipse {
                center,
                major,
                ratio,
                start,
                end,
            } => {
                let minor = Vector2::new(-major.y, major.x) * *ratio;
                let start = start.rem_euclid(TAU);
                let sweep = ccw_sweep(start, end.rem_euclid(TAU));
                let steps = segments_for(sweep);
                (0..=steps)
                    .map(|i| {
                        let t = start + sweep * i as f64 / steps as f64;
                        center + major * t.cos() + minor * t.sin()
                    })
                    .collect()
            }
            Self::Spline { points, closed } => {
                let mut out = points.clone();
                if *closed && let Some(first) = points.first() {
                    out.push(*first);
                }
                out
            }
            Self::Polyline { vertices, closed } => polyline_points(vertices, *closed),
        }
    }
}

/// Counter-clockwise sweep from `start` to `end`, both in `[0, TAU)`.
/// Equal angles mean a full turn.
fn ccw_sweep(start: f64, end: f64) -> f64 {
    let mut sweep = end - start;
    if sweep <= 0.0 {
        sweep += TAU;
    }
    sweep.clamp(0.0, TAU)
}

fn segments_for(sweep: f64) -> usize {
    // about one segment per 5 degrees
    ((sweep.abs() / 5f64.to_radians()).ceil() as usize).clamp(2, MAX_SEGMENTS)
}

fn arc_points(center: Point2<f64>, radius: f64, start: f64, sweep: f64) -> Vec<Point2<f64>> {
    let steps = segments_for(sweep);
    (0..=steps)
        .map(|i| {
            let a = start + sweep * i as f64 / steps as f64;
            center + Vector2::new(a.cos(), a.sin()) * radius
        })
        .collect()
}

fn polyline_points(vertices: &[(Point2<f64>, f64)], closed: bool) -> Vec<Point2<f64>> {
    let mut out = Vec::new();
    let count = vertices.len();
    if count == 0 {
        return out;
    }
    let segments = if closed { count } else { count - 1 };
    out.push(vertices[0].0);
    for i in 0..segments {
        let (p1, bulge) = vertices[i];
        let p2 = vertices[(i + 1) % count].0;
        if bulge.abs() < 1e-9 {
            out.push(p2);
        } else {
            out.extend(bulge_points(p1, p2, bulge).into_iter().skip(1));
        }
    }
    out
}

/// Points along the arc between `p1` and `p2` described by `bulge`
/// (tangent of a quarter of the included angle, positive = CCW).
fn bulge_points(p1: Point2<f64>, p2: Point2<f64>, bulge: f64) -> Vec<Point2<f64>> {
    let chord = p2 - p1;
    let length = chord.norm();
    if length < 1e-12 {
        return vec![p1, p2];
    }
    let theta = 4.0 * bulge.atan();
    let radius = length / (2.0 * (theta / 2.0).sin());
    let offset = radius * (theta / 2.0).cos();
    let normal = Vector2::new(-chord.y, chord.x) / length;
    let center = p1 + chord / 2.0 + normal * offset;

    let start = (p1.y - center.y).atan2(p1.x - center.x);
    let steps = segments_for(theta);
    let r = radius.abs();
    let mut points: Vec<Point2<f64>> = (0..steps)
        .map(|i| {
            let a = start + theta * i as f64 / steps as f64;
            center + Vector2::new(a.cos(), a.sin()) * r
        })
        .collect();
    points.push(p2);
    points
}

/// One `(group code, value)` pair.
#[derive(Debug, Clone, Copy)]
struct Group<'a> {
    code: i32,
    value: &'a str,
}

fn read_groups(text: &str) -> Result<Vec<Group<'_>>, BackendError> {
    let mut lines = text.lines();
    let mut groups = Vec::new();
    let mut line_no = 0usize;
    while let Some(code_line) = lines.next() {
        line_no += 1;
        let code_str = code_line.trim();
        if code_str.is_empty() {
            continue;
        }
        let code: i32 = code_str.parse().map_err(|_| {
            BackendError::parse(FORMAT, format!("line {line_no}: expected group code, got '{code_str}'"))
        })?;
        let value = lines
            .next()
            .ok_or_else(|| BackendError::parse(FORMAT, format!("line {line_no}: group {code} has no value")))?;
        line_no += 1;
        groups.push(Group {
            code,
            value: value.trim(),
        });
    }
    Ok(groups)
}

/// Parse ASCII DXF bytes.
///
/// Numeric values that parse but are not finite (`inf`, `NaN`, `1e999`)
/// are a parse error.
pub fn parse(data: &[u8]) -> Result<Drawing, BackendError> {
    if data.starts_with(BINARY_SENTINEL) {
        return Err(BackendError::parse(FORMAT, "binary DXF is not supported"));
    }
    let text = String::from_utf8_lossy(data);
    if text.trim().is_empty() {
        return Err(BackendError::parse(FORMAT, "file is empty"));
    }
    let groups = read_groups(&text)?;
    if groups.is_empty() {
        return Err(BackendError::parse(FORMAT, "no group codes"));
    }

    let mut drawing = Drawing {
        version: section(&groups, "HEADER").and_then(header_version),
        layers: section(&groups, "TABLES").map(layer_names).unwrap_or_default(),
        ..Drawing::default()
    };
    let Some(entities) = section(&groups, "ENTITIES") else {
        return Ok(drawing);
    };

    let mut open_polyline: Option<(Vec<(Point2<f64>, f64)>, bool)> = None;
    for (kind, body) in records(entities) {
        match kind.as_str() {
            "VERTEX" => {
                if let Some((vertices, _)) = open_polyline.as_mut() {
                    vertices.push((point(body, 10, 20)?, real(body, 42)?.unwrap_or(0.0)));
                }
                continue;
            }
            "SEQEND" => {
                if let Some((vertices, closed)) = open_polyline.take() {
                    drawing.entities.push(Entity::Polyline { vertices, closed });
                }
                continue;
            }
            _ => {}
        }

        // any other entity terminates a polyline missing its SEQEND
        if let Some((vertices, closed)) = open_polyline.take() {
            drawing.entities.push(Entity::Polyline { vertices, closed });
        }
        *drawing.entity_counts.entry(kind.clone()).or_insert(0) += 1;

        match kind.as_str() {
            "LINE" => drawing.entities.push(Entity::Line {
                start: point(body, 10, 20)?,
                end: point(body, 11, 21)?,
            }),
            "CIRCLE" => drawing.entities.push(Entity::Circle {
                center: point(body, 10, 20)?,
                radius: real(body, 40)?.unwrap_or(0.0),
            }),
            "ARC" => drawing.entities.push(Entity::Arc {
                center: point(body, 10, 20)?,
                radius: real(body, 40)?.unwrap_or(0.0),
                start_deg: real(body, 50)?.unwrap_or(0.0),
                end_deg: real(body, 51)?.unwrap_or(360.0),
            }),
            "LWPOLYLINE" => drawing.entities.push(lwpolyline(body)?),
            "POLYLINE" => {
                let closed = int(body, 70).unwrap_or(0) & 1 == 1;
                open_polyline = Some((Vec::new(), closed));
            }
            "ELLIPSE" => {
                let major = point(body, 11, 21)?;
                drawing.entities.push(Entity::Ellipse {
                    center: point(body, 10, 20)?,
                    major: Vector2::new(major.x, major.y),
                    ratio: real(body, 40)?.unwrap_or(1.0),
                    start: real(body, 41)?.unwrap_or(0.0),
                    end: real(body, 42)?.unwrap_or(TAU),
                });
            }
            "SPLINE" => {
                let fit = points(body, 11, 21)?;
                let points = if fit.len() >= 2 { fit } else { points(body, 10, 20)? };
                if !points.is_empty() {
                    drawing.entities.push(Entity::Spline {
                        points,
                        closed: int(body, 70).unwrap_or(0) & 1 == 1,
                    });
                }
            }
            "POINT" => drawing.entities.push(Entity::Point(point(body, 10, 20)?)),
            other => *drawing.skipped.entry(other.to_string()).or_insert(0) += 1,
        }
    }

    if let Some((vertices, closed)) = open_polyline.take() {
        drawing.entities.push(Entity::Polyline { vertices, closed });
    }

    Ok(drawing)
}

/// The groups between `0/SECTION 2/{name}` and the following `0/ENDSEC`.
fn section<'a>(groups: &'a [Group<'a>], name: &str) -> Option<&'a [Group<'a>]> {
    let start = groups.windows(2).position(|w| {
        w[0].code == 0
            && w[0].value.eq_ignore_ascii_case("SECTION")
            && w[1].code == 2
            && w[1].value.eq_ignore_ascii_case(name)
    })? + 2;
    let end = groups[start..]
        .iter()
        .position(|g| g.code == 0 && g.value.eq_ignore_ascii_case("ENDSEC"))
        .map(|p| start + p)
        .unwrap_or(groups.len());
    Some(&groups[start..end])
}

/// Split a section into `(upper-cased type, body)` records, one per
/// `0/<type>` group.
fn records<'a>(section: &'a [Group<'a>]) -> impl Iterator<Item = (String, &'a [Group<'a>])> {
    let starts: Vec<usize> = section
        .iter()
        .enumerate()
        .filter(|(_, g)| g.code == 0)
        .map(|(i, _)| i)
        .collect();
    let ends: Vec<usize> = starts.iter().skip(1).copied().chain([section.len()]).collect();
    starts.into_iter().zip(ends).map(move |(start, end)| {
        (
            section[start].value.to_ascii_uppercase(),
            &section[start + 1..end],
        )
    })
}

fn header_version(header: &[Group<'_>]) -> Option<String> {
    let at = header
        .iter()
        .position(|g| g.code == 9 && g.value.eq_ignore_ascii_case("$ACADVER"))?;
    header[at + 1..]
        .iter()
        .take_while(|g| g.code != 9)
        .find(|g| g.code == 1)
        .map(|g| g.value.to_string())
}

fn layer_names(tables: &[Group<'_>]) -> Vec<String> {
    records(tables)
        .filter(|(kind, _)| kind == "LAYER")
        .filter_map(|(_, body)| body.iter().find(|g| g.code == 2))
        .map(|g| g.value.to_string())
        .collect()
}

fn lwpolyline(body: &[Group<'_>]) -> Result<Entity, BackendError> {
    let closed = int(body, 70).unwrap_or(0) & 1 == 1;
    let mut vertices: Vec<(Point2<f64>, f64)> = Vec::new();
    let mut pending_x: Option<f64> = None;
    for group in body {
        match group.code {
            10 => pending_x = number(group)?,
            20 => {
                if let (Some(x), Some(y)) = (pending_x.take(), number(group)?) {
                    vertices.push((Point2::new(x, y), 0.0));
                }
            }
            42 => {
                if let (Some(last), Some(b)) = (vertices.last_mut(), number(group)?) {
                    last.1 = b;
                }
            }
            _ => {}
        }
    }
    Ok(Entity::Polyline { vertices, closed })
}

/// The group's value as a finite number. Unparseable text is `None`,
/// a non-finite number is an error.
fn number(group: &Group<'_>) -> Result<Option<f64>, BackendError> {
    match group.value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Err(BackendError::parse(
            FORMAT,
            format!("group {} is not a finite number: '{}'", group.code, group.value),
        )),
        Err(_) => Ok(None),
    }
}

fn real(body: &[Group<'_>], code: i32) -> Result<Option<f64>, BackendError> {
    match body.iter().find(|g| g.code == code) {
        Some(group) => number(group),
        None => Ok(None),
    }
}

fn int(body: &[Group<'_>], code: i32) -> Option<i64> {
    body.iter()
        .find(|g| g.code == code)
        .and_then(|g| g.value.parse().ok())
}

fn point(body: &[Group<'_>], x_code: i32, y_code: i32) -> Result<Point2<f64>, BackendError> {
    Ok(Point2::new(
        real(body, x_code)?.unwrap_or(0.0),
        real(body, y_code)?.unwrap_or(0.0),
    ))
}

fn points(body: &[Group<'_>], x_code: i32, y_code: i32) -> Result<Vec<Point2<f64>>, BackendError> {
    let mut out = Vec::new();
    let mut pending_x: Option<f64> = None;
    for group in body {
        if group.code == x_code {
            pending_x = number(group)?;
        } else if group.code == y_code
            && let (Some(x), Some(y)) = (pending_x.take(), number(group)?)
        {
            out.push(Point2::new(x, y));
        }
    }
    Ok(out)
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Minimal DXF writers for tests.

    /// Wrap entity groups in a HEADER-less DXF document.
    pub fn document(entities: &str) -> String {
        format!("0\nSECTION\n2\nENTITIES\n{entities}0\nENDSEC\n0\nEOF\n")
    }

    /// A `LINE` entity.
    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> String {
        format!("0\nLINE\n8\n0\n10\n{x1}\n20\n{y1}\n30\n0.0\n11\n{x2}\n21\n{y2}\n31\n0.0\n")
    }

    /// A closed axis-aligned rectangle as four lines.
    pub fn rectangle(width: f64, height: f64) -> String {
        [
            line(0.0, 0.0, width, 0.0),
            line(width, 0.0, width, height),
            line(width, height, 0.0, height),
            line(0.0, height, 0.0, 0.0),
        ]
        .concat()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn bounds(paths: &[Vec<Point2<f64>>]) -> (f64, f64, f64, f64) {
        let mut b = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for p in paths.iter().flatten() {
            b = (b.0.min(p.x), b.1.min(p.y), b.2.max(p.x), b.3.max(p.y));
        }
        b
    }

    #[test]
    fn test_rectangle_lines() {
        let drawing = parse(document(&rectangle(200.0, 100.0)).as_bytes()).expect("parse");
        assert_eq!(drawing.entities.len(), 4);
        let (x0, y0, x1, y1) = bounds(&drawing.tessellate());
        assert_eq!((x0, y0, x1, y1), (0.0, 0.0, 200.0, 100.0));
    }

    #[test]
    fn test_unsupported_entities_are_skipped() {
        let body = format!(
            "{}0\nTEXT\n10\n5.0\n20\n5.0\n1\nhello\n0\nHATCH\n{}",
            line(0.0, 0.0, 1.0, 1.0),
            "0\nCIRCLE\n10\n0\n20\n0\n40\n2.5\n"
        );
        let drawing = parse(document(&body).as_bytes()).expect("parse");
        assert_eq!(drawing.entities.len(), 2);
        assert_eq!(drawing.skipped.get("TEXT"), Some(&1));
        assert_eq!(drawing.skipped.get("HATCH"), Some(&1));
    }

    #[test]
    fn test_circle_and_arc_extents() {
        let body = "0\nCIRCLE\n10\n10\n20\n10\n40\n5\n0\nARC\n10\n0\n20\n0\n40\n2\n50\n0\n51\n90\n";
        let drawing = parse(document(body).as_bytes()).expect("parse");
        let circle = drawing.entities[0].tessellate();
        let (x0, y0, x1, y1) = bounds(&[circle]);
        assert!((x0 - 5.0).abs() < 1e-6 && (x1 - 15.0).abs() < 1e-6);
        assert!((y0 - 5.0).abs() < 1e-2 && (y1 - 15.0).abs() < 1e-2);

        let arc = drawing.entities[1].tessellate();
        let first = arc.first().expect("first");
        let last = arc.last().expect("last");
        assert!((first.x - 2.0).abs() < 1e-9 && first.y.abs() < 1e-9);
        assert!(last.x.abs() < 1e-9 && (last.y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_lwpolyline_bulge_semicircle() {
        // from (0,0) to (2,0) with bulge 1: half circle below the chord
        let body = "0\nLWPOLYLINE\n90\n2\n70\n0\n10\n0\n20\n0\n42\n1.0\n10\n2\n20\n0\n";
        let drawing = parse(document(body).as_bytes()).expect("parse");
        let points = drawing.entities[0].tessellate();
        let (_, y0, _, y1) = bounds(&[points.clone()]);
        assert!((y0 + 1.0).abs() < 1e-6, "lowest point {y0}");
        assert!(y1.abs() < 1e-9);
        let last = points.last().expect("last");
        assert!((last.x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_polyline_vertices_and_closed_flag() {
        let body = "0\nPOLYLINE\n66\n1\n70\n1\n0\nVERTEX\n10\n0\n20\n0\n0\nVERTEX\n10\n4\n20\n0\n0\nVERTEX\n10\n4\n20\n3\n0\nSEQEND\n";
        let drawing = parse(document(body).as_bytes()).expect("parse");
        match &drawing.entities[0] {
            Entity::Polyline { vertices, closed } => {
                assert_eq!(vertices.len(), 3);
                assert!(*closed);
            }
            other => panic!("unexpected entity {other:?}"),
        }
        let points = drawing.entities[0].tessellate();
        assert_eq!(points.len(), 4);
        assert_eq!(points.first(), points.last());
    }

    #[test]
    fn test_no_entities_is_empty_drawing() {
        let drawing = parse(document("").as_bytes()).expect("parse");
        assert!(drawing.entities.is_empty());

        let header_only = "0\nSECTION\n2\nHEADER\n0\nENDSEC\n0\nEOF\n";
        let drawing = parse(header_only.as_bytes()).expect("parse");
        assert!(drawing.entities.is_empty());
    }

    #[test]
    fn test_out_of_range_arc_angles_are_normalized() {
        let body = "0\nARC\n10\n0\n20\n0\n40\n5\n50\n0\n51\n1e15\n0\nARC\n10\n0\n20\n0\n40\n1\n50\n-270\n51\n450\n";
        let drawing = parse(document(body).as_bytes()).expect("parse");

        let huge = drawing.entities[0].tessellate();
        assert!(huge.len() <= MAX_SEGMENTS + 1, "{} points", huge.len());
        assert!(huge.iter().all(|p| (p.coords.norm() - 5.0).abs() < 1e-9));

        // -270 and 450 are 90 degrees: a full turn
        let full = drawing.entities[1].tessellate();
        let first = full.first().expect("first");
        let last = full.last().expect("last");
        assert!((first - last).norm() < 1e-9);
        assert!(first.x.abs() < 1e-9 && (first.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_ellipse_parameters_are_bounded() {
        let body = "0\nELLIPSE\n10\n0\n20\n0\n11\n4\n21\n0\n40\n0.5\n41\n-1e300\n42\n1e300\n";
        let drawing = parse(document(body).as_bytes()).expect("parse");
        let points = drawing.entities[0].tessellate();
        assert!(points.len() >= 3 && points.len() <= MAX_SEGMENTS + 1);
        assert!(points.iter().all(|p| p.x.abs() <= 4.0 + 1e-9 && p.y.abs() <= 2.0 + 1e-9));
    }

    #[test]
    fn test_non_finite_numbers_are_parse_errors() {
        let cases = [
            line(0.0, 0.0, 1.0, 1.0).replace("\n21\n1\n", "\n21\n1e999\n"),
            "0\nCIRCLE\n10\ninf\n20\n0\n40\n1\n".to_string(),
            "0\nARC\n10\n0\n20\n0\n40\n1\n50\nNaN\n51\n90\n".to_string(),
            "0\nLWPOLYLINE\n10\n0\n20\n0\n42\nNaN\n10\n1\n20\n0\n".to_string(),
            "0\nSPLINE\n11\n0\n21\n0\n11\n-inf\n21\n1\n".to_string(),
            "0\nPOLYLINE\n70\n0\n0\nVERTEX\n10\n0\n20\n1e400\n0\nSEQEND\n".to_string(),
        ];
        for body in cases {
            let err = parse(document(&body).as_bytes()).expect_err(&body);
            assert!(matches!(err, BackendError::Parse { .. }), "{err}");
        }
    }

    #[test]
    fn test_overflowing_geometry_is_dropped_from_paths() {
        let body = "0\nCIRCLE\n10\n1.5e308\n20\n0\n40\n1e308\n";
        let drawing = parse(document(body).as_bytes()).expect("parse");
        let paths = drawing.tessellate();
        assert!(paths.iter().flatten().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_header_version_layers_and_counts() {
        let text = format!(
            "0\nSECTION\n2\nHEADER\n9\n$ACADVER\n1\nAC1015\n9\n$INSUNITS\n70\n4\n0\nENDSEC\n\
             0\nSECTION\n2\nTABLES\n0\nTABLE\n2\nLAYER\n70\n2\n\
             0\nLAYER\n2\n0\n70\n0\n0\nLAYER\n2\nOUTLINE\n70\n0\n0\nENDTAB\n0\nENDSEC\n{}",
            document(&format!("{}0\nTEXT\n1\nA\n", rectangle(20.0, 10.0)))
        );
        let drawing = parse(text.as_bytes()).expect("parse");
        assert_eq!(drawing.version.as_deref(), Some("AC1015"));
        assert_eq!(drawing.layers, vec!["0".to_string(), "OUTLINE".to_string()]);
        assert_eq!(drawing.entity_counts.get("LINE"), Some(&4));
        assert_eq!(drawing.entity_counts.get("TEXT"), Some(&1));
        assert_eq!(drawing.entities.len(), 4);
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(parse(b"this is not a drawing").is_err());
        assert!(parse(b"").is_err());
        assert!(parse(b"AutoCAD Binary DXF\r\n\x1a\x00").is_err());
    }
}
