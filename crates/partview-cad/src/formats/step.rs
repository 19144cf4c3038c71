//! Point extraction from ISO 10303-21 (STEP) exchange files.
//!
//! Only `CARTESIAN_POINT` instances are read; topology is ignored.

use nalgebra::Point3;

use crate::error::BackendError;

const FORMAT: &str = "STEP";
const KEYWORD: &str = "CARTESIAN_POINT";

/// Read every cartesian point in the file.
pub fn parse_points(data: &[u8]) -> Result<Vec<Point3<f64>>, BackendError> {
    let text = String::from_utf8_lossy(data);
    if !text.contains("ISO-10303-21") {
        return Err(BackendError::parse(FORMAT, "missing ISO-10303-21 header"));
    }

    let upper = text.to_ascii_uppercase();
    let mut points = Vec::new();
    let mut rest = upper.as_str();
    while let Some(pos) = rest.find(KEYWORD) {
        rest = &rest[pos + KEYWORD.len()..];
        if let Some(point) = read_point(rest) {
            points.push(point);
        }
    }

    if points.is_empty() {
        return Err(BackendError::NoGeometry { format: FORMAT });
    }
    Ok(points)
}

/// Parse `('name',(x,y[,z]))` following the keyword.
fn read_point(after_keyword: &str) -> Option<Point3<f64>> {
    let mut chars = after_keyword.char_indices().skip_while(|(_, c)| c.is_whitespace());
    let (_, open) = chars.next()?;
    if open != '(' {
        return None;
    }

    // skip the quoted name; '' is an escaped quote inside it
    let mut in_string = false;
    let mut coords_start = None;
    let mut prev_quote = false;
    for (idx, c) in chars {
        if in_string {
            if c == '\'' {
                prev_quote = !prev_quote;
            } else if prev_quote {
                in_string = false;
                prev_quote = false;
                if c == '(' {
                    coords_start = Some(idx + 1);
                    break;
                }
            }
            continue;
        }
        match c {
            '\'' => in_string = true,
            '(' => {
                coords_start = Some(idx + 1);
                break;
            }
            ';' => return None,
            _ => {}
        }
    }
    let start = coords_start?;
    let end = after_keyword[start..].find(')')? + start;

    let values: Vec<f64> = after_keyword[start..end]
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    let point = match values.as_slice() {
        [x, y] => Point3::new(*x, *y, 0.0),
        [x, y, z] => Point3::new(*x, *y, *z),
        _ => return None,
    };
    (point.x.is_finite() && point.y.is_finite() && point.z.is_finite()).then_some(point)
}
