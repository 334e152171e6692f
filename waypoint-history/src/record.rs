//! Which snapshot records become position samples.

use serde_json::Value;

use crate::models::normalize_identity;
use crate::repository::is_safe_file_stem;
use crate::snapshot::Object;

/// Raw field holding the player's stable identity.
pub const IDENTITY_FIELD: &str = "steamIdentifier";

/// A record that passed the inclusion checks.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Normalized identity, usable as a file name
    pub identity: String,
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

/// Why a record was not sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    NotAnObject,
    NoCoords,
    NotACharacter,
    Invisible,
    MalformedCoords,
    NoIdentity,
}

impl Skip {
    pub fn as_str(self) -> &'static str {
        match self {
            Skip::NotAnObject => "not an object",
            Skip::NoCoords => "no coords",
            Skip::NotACharacter => "not a character",
            Skip::Invisible => "invisible",
            Skip::MalformedCoords => "coords are not numeric x/y/z",
            Skip::NoIdentity => "no identity",
        }
    }
}

impl Observation {
    /// Apply the inclusion predicate to one raw record.
    ///
    /// Coordinates are rounded half away from zero.
    pub fn from_record(record: &Value) -> Result<Self, Skip> {
        let obj = record.as_object().ok_or(Skip::NotAnObject)?;

        let coords = obj.get("coords").filter(|v| !v.is_null()).ok_or(Skip::NoCoords)?;

        // `character` may also be an object describing the character; only an explicit false drops the record.
        if obj.get("character").and_then(Value::as_bool) == Some(false) {
            return Err(Skip::NotACharacter);
        }
        if obj.get("invisible").and_then(Value::as_bool) == Some(true) {
            return Err(Skip::Invisible);
        }

        let coords = coords.as_object().ok_or(Skip::MalformedCoords)?;
        let (x, y, z) = read_xyz(coords).ok_or(Skip::MalformedCoords)?;

        // Identities that would leave the history directory count as missing
        let identity = obj
            .get(IDENTITY_FIELD)
            .and_then(Value::as_str)
            .map(normalize_identity)
            .filter(|s| is_safe_file_stem(s))
            .ok_or(Skip::NoIdentity)?;

        Ok(Self {
            identity,
            x: x.round() as i64,
            y: y.round() as i64,
            z: z.round() as i64,
        })
    }
}

fn read_xyz(coords: &Object) -> Option<(f64, f64, f64)> {
    let axis = |key: &str| coords.get(key).and_then(Value::as_f64);
    Some((axis("x")?, axis("y")?, axis("z")?))
}
