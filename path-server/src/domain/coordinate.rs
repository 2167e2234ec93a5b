//! Coordinate types and submitted-path validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default maximum number of points per request.
///
/// Bounded by the routing oracle's per-call waypoint ceiling.
pub const DEFAULT_MAX_POINTS: usize = 23;

/// A geographic position in decimal degrees.
///
/// Serializes as a two-element `[lat, lng]` array, the same shape clients
/// submit.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    /// Create a coordinate, checking that both components are finite and in range.
    ///
    /// Latitude must lie in `[-90, 90]` and longitude in `[-180, 180]`,
    /// inclusive on both ends.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let in_range = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        in_range.then_some(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

/// A latitude/longitude pair outside the valid ranges.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("coordinate [{lat}, {lng}] is out of range")]
pub struct InvalidCoordinate {
    pub lat: f64,
    pub lng: f64,
}

impl TryFrom<[f64; 2]> for Coordinate {
    type Error = InvalidCoordinate;

    fn try_from([lat, lng]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(lat, lng).ok_or(InvalidCoordinate { lat, lng })
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinate({}, {})", self.lat, self.lng)
    }
}

/// Formats as `lat,lng`, the form the routing oracle expects.
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Why a submitted path was turned away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Not a sequence of valid coordinate pairs.
    #[error("Invalid body input format")]
    Malformed,

    /// Structurally valid, but longer than the configured limit.
    #[error("Too many points; maximum point count is {limit}")]
    TooLarge { limit: usize },
}

/// Result of validating a submitted path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathValidation {
    Valid(Vec<Coordinate>),
    Rejected(Rejection),
}

/// Validate a raw submitted path.
///
/// The body must be a non-empty array whose elements are each an array of
/// exactly two values. A value may be a JSON number or a string holding a
/// finite number. Any single bad element rejects the whole path. The length
/// limit is only checked once the path is structurally valid.
pub fn validate_path(body: &Value, max_points: usize) -> PathValidation {
    let Some(elements) = body.as_array() else {
        return PathValidation::Rejected(Rejection::Malformed);
    };

    if elements.is_empty() {
        return PathValidation::Rejected(Rejection::Malformed);
    }

    let parsed: Option<Vec<Coordinate>> = elements.iter().map(parse_pair).collect();
    let Some(path) = parsed else {
        return PathValidation::Rejected(Rejection::Malformed);
    };

    if path.len() > max_points {
        return PathValidation::Rejected(Rejection::TooLarge { limit: max_points });
    }

    PathValidation::Valid(path)
}

fn parse_pair(element: &Value) -> Option<Coordinate> {
    match element.as_array()?.as_slice() {
        [lat, lng] => Coordinate::new(parse_component(lat)?, parse_component(lng)?),
        _ => None,
    }
}

fn parse_component(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn deserializing_checks_ranges() {
        let c: Coordinate = serde_json::from_str("[51.5, -0.25]").unwrap();
        assert_eq!(c, coord(51.5, -0.25));
        assert_eq!(serde_json::to_string(&c).unwrap(), "[51.5,-0.25]");

        assert!(serde_json::from_str::<Coordinate>("[91.0, 0.0]").is_err());
        assert!(serde_json::from_str::<Coordinate>("[0.0, -180.5]").is_err());
    }

    #[test]
    fn accepts_valid_path() {
        let result = validate_path(&json!([[1, 2], [7, 8]]), DEFAULT_MAX_POINTS);
        assert_eq!(
            result,
            PathValidation::Valid(vec![coord(1.0, 2.0), coord(7.0, 8.0)])
        );
    }

    #[test]
    fn accepts_single_point() {
        let result = validate_path(&json!([[51.5, -0.12]]), DEFAULT_MAX_POINTS);
        assert_eq!(result, PathValidation::Valid(vec![coord(51.5, -0.12)]));
    }

    #[test]
    fn accepts_numeric_strings() {
        let result = validate_path(&json!([["1.5", " 2 "], [3, "4e1"]]), DEFAULT_MAX_POINTS);
        assert_eq!(
            result,
            PathValidation::Valid(vec![coord(1.5, 2.0), coord(3.0, 40.0)])
        );
    }

    #[test]
    fn accepts_inclusive_bounds() {
        let body = json!([[90, 180], [-90, -180], [0, 0]]);
        assert!(matches!(
            validate_path(&body, DEFAULT_MAX_POINTS),
            PathValidation::Valid(_)
        ));
    }

    #[test]
    fn rejects_wrong_arity() {
        let body = json!([[1, 2], [2, 3, 3]]);
        assert_eq!(
            validate_path(&body, DEFAULT_MAX_POINTS),
            PathValidation::Rejected(Rejection::Malformed)
        );

        let body = json!([[1]]);
        assert_eq!(
            validate_path(&body, DEFAULT_MAX_POINTS),
            PathValidation::Rejected(Rejection::Malformed)
        );
    }

    #[test]
    fn rejects_out_of_range() {
        for body in [
            json!([[1, 2], [2, 355]]),
            json!([[90.0001, 0]]),
            json!([[-91, 0]]),
            json!([[0, -180.5]]),
        ] {
            assert_eq!(
                validate_path(&body, DEFAULT_MAX_POINTS),
                PathValidation::Rejected(Rejection::Malformed),
                "{body}"
            );
        }
    }

    #[test]
    fn rejects_non_numeric_values() {
        for body in [
            json!([["a", 2]]),
            json!([["", 2]]),
            json!([[null, 2]]),
            json!([[true, 2]]),
            json!([[[1], 2]]),
            json!([["NaN", 2]]),
            json!([["inf", 2]]),
        ] {
            assert_eq!(
                validate_path(&body, DEFAULT_MAX_POINTS),
                PathValidation::Rejected(Rejection::Malformed),
                "{body}"
            );
        }
    }

    #[test]
    fn rejects_non_array_bodies() {
        for body in [json!({"path": [[1, 2]]}), json!("1,2"), json!([]), json!([1, 2])] {
            assert_eq!(
                validate_path(&body, DEFAULT_MAX_POINTS),
                PathValidation::Rejected(Rejection::Malformed),
                "{body}"
            );
        }
    }

    #[test]
    fn rejects_too_many_points() {
        let body = Value::Array((0..30).map(|_| json!([1, 2])).collect());
        assert_eq!(
            validate_path(&body, DEFAULT_MAX_POINTS),
            PathValidation::Rejected(Rejection::TooLarge { limit: 23 })
        );
    }

    #[test]
    fn malformed_wins_over_too_large() {
        let mut points: Vec<Value> = (0..30).map(|_| json!([1, 2])).collect();
        points.push(json!([1, 500]));
        assert_eq!(
            validate_path(&Value::Array(points), DEFAULT_MAX_POINTS),
            PathValidation::Rejected(Rejection::Malformed)
        );
    }

    #[test]
    fn exactly_limit_is_accepted() {
        let body = Value::Array((0..23).map(|_| json!([1, 2])).collect());
        assert!(matches!(
            validate_path(&body, DEFAULT_MAX_POINTS),
            PathValidation::Valid(p) if p.len() == 23
        ));
    }

    #[test]
    fn rejection_messages() {
        assert_eq!(Rejection::Malformed.to_string(), "Invalid body input format");
        assert_eq!(
            Rejection::TooLarge { limit: 23 }.to_string(),
            "Too many points; maximum point count is 23"
        );
    }

    #[test]
    fn serializes_as_pair() {
        let json = serde_json::to_value(coord(1.5, -2.0)).unwrap();
        assert_eq!(json, json!([1.5, -2.0]));

        let back: Coordinate = serde_json::from_value(json).unwrap();
        assert_eq!(back, coord(1.5, -2.0));
    }

    #[test]
    fn display_for_oracle() {
        assert_eq!(coord(51.5, -0.25).to_string(), "51.5,-0.25");
    }
}
