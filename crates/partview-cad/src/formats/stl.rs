//! STL mesh reader (ASCII and binary).

use nalgebra::Point3;

use crate::error::BackendError;

const FORMAT: &str = "STL";
const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

/// A triangle soup.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Triangles as vertex triples.
    pub triangles: Vec<[Point3<f64>; 3]>,
}

impl Mesh {
    /// All vertices, three per triangle.
    pub fn vertices(&self) -> impl Iterator<Item = &Point3<f64>> {
        self.triangles.iter().flatten()
    }
}

/// Parse STL bytes, detecting the encoding.
///
/// Binary files may also start with `solid`, so the binary length check
/// runs first.
pub fn parse(data: &[u8]) -> Result<Mesh, BackendError> {
    if is_binary(data) {
        return parse_binary(data);
    }
    if data.trim_ascii_start().starts_with(b"solid") {
        return parse_ascii(data);
    }
    Err(BackendError::parse(FORMAT, "neither ASCII nor binary STL"))
}

fn is_binary(data: &[u8]) -> bool {
    if data.len() < HEADER_LEN + 4 {
        return false;
    }
    let count = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
    count
        .checked_mul(TRIANGLE_LEN)
        .and_then(|n| n.checked_add(HEADER_LEN + 4))
        == Some(data.len())
}

fn parse_binary(data: &[u8]) -> Result<Mesh, BackendError> {
    let body = &data[HEADER_LEN + 4..];
    let mut triangles = Vec::with_capacity(body.len() / TRIANGLE_LEN);
    for record in body.chunks_exact(TRIANGLE_LEN) {
        // 12 bytes of normal, three 12-byte vertices, 2 attribute bytes
        let vertex = |offset: usize| {
            let f = |i: usize| {
                let at = offset + i * 4;
                f64::from(f32::from_le_bytes([
                    record[at],
                    record[at + 1],
                    record[at + 2],
                    record[at + 3],
                ]))
            };
            Point3::new(f(0), f(1), f(2))
        };
        triangles.push([vertex(12), vertex(24), vertex(36)]);
    }
    finish(triangles)
}

fn parse_ascii(data: &[u8]) -> Result<Mesh, BackendError> {
    let text = String::from_utf8_lossy(data);
    let mut triangles = Vec::new();
    let mut current: Vec<Point3<f64>> = Vec::with_capacity(3);

    for (line_no, line) in text.lines().enumerate() {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("vertex") => {
                let coords: Vec<f64> = words
                    .take(3)
                    .map(str::parse)
                    .collect::<Result<_, _>>()
                    .map_err(|e| {
                        BackendError::parse(FORMAT, format!("line {}: {e}", line_no + 1))
                    })?;
                if coords.len() != 3 {
                    return Err(BackendError::parse(
                        FORMAT,
                        format!("line {}: vertex needs three coordinates", line_no + 1),
                    ));
                }
                current.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("endloop") => {
                if current.len() == 3 {
                    triangles.push([current[0], current[1], current[2]]);
                }
                current.clear();
            }
            _ => {}
        }
    }
    finish(triangles)
}

fn finish(triangles: Vec<[Point3<f64>; 3]>) -> Result<Mesh, BackendError> {
    let valid = triangles
        .iter()
        .flatten()
        .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
    if !valid {
        return Err(BackendError::parse(FORMAT, "non-finite vertex coordinates"));
    }
    if triangles.is_empty() {
        return Err(BackendError::NoGeometry { format: FORMAT });
    }
    Ok(Mesh { triangles })
}
