//! Compact player summaries served to map clients.
//!
//! Keys are single letters and empty fields are left out, since the latest
//! snapshot of a busy server is fetched by every open map every few seconds.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use waypoint_history::IDENTITY_FIELD;
use waypoint_history::snapshot::{Object, get_bool, get_f64, get_i64, get_map, get_string};

fn is_zero(n: &i64) -> bool {
    *n == 0
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompactCharacter {
    #[serde(rename = "a", skip_serializing_if = "is_zero")]
    pub flags: i64,
    #[serde(rename = "b", skip_serializing_if = "String::is_empty")]
    pub full_name: String,
    #[serde(rename = "c", skip_serializing_if = "is_zero")]
    pub id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompactVehicle {
    #[serde(rename = "a", skip_serializing_if = "is_false")]
    pub driving: bool,
    #[serde(rename = "b", skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(rename = "c", skip_serializing_if = "String::is_empty")]
    pub model: String,
    #[serde(rename = "d", skip_serializing_if = "String::is_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompactPlayer {
    #[serde(rename = "a", skip_serializing_if = "is_zero")]
    pub afk_since: i64,
    #[serde(rename = "b", skip_serializing_if = "Option::is_none")]
    pub character: Option<CompactCharacter>,
    /// "x,y,z,heading[,speed]"
    #[serde(rename = "c", skip_serializing_if = "String::is_empty")]
    pub movement: String,
    #[serde(rename = "d", skip_serializing_if = "is_zero")]
    pub flags: i64,
    #[serde(rename = "e", skip_serializing_if = "is_zero")]
    pub invisible_since: i64,
    #[serde(rename = "f", skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "g", skip_serializing_if = "is_zero")]
    pub source: i64,
    #[serde(rename = "h", skip_serializing_if = "String::is_empty")]
    pub steam: String,
    #[serde(rename = "i", skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<CompactVehicle>,
}

/// One summary per record, in input order. Non-objects become empty summaries.
pub fn compress_players(records: &[Value]) -> Vec<CompactPlayer> {
    records
        .iter()
        .map(|record| record.as_object().map(compress_player).unwrap_or_default())
        .collect()
}

fn compress_player(p: &Object) -> CompactPlayer {
    let character = get_map("character", p).map(|c| CompactCharacter {
        flags: get_i64("flags", c, false),
        full_name: get_string("fullName", c, false),
        id: get_i64("id", c, false),
    });

    let vehicle = get_map("vehicle", p).map(|v| CompactVehicle {
        driving: get_bool("driving", v),
        id: get_i64("id", v, false),
        model: get_string("model", v, true),
        name: get_string("name", v, false),
    });

    CompactPlayer {
        afk_since: get_i64("afkSince", p, true),
        character,
        movement: movement(p),
        flags: get_i64("flags", p, false),
        invisible_since: get_i64("invisible_since", p, false),
        name: get_string("name", p, false),
        source: get_i64("source", p, false),
        steam: get_string(IDENTITY_FIELD, p, false),
        vehicle,
    }
}

fn movement(p: &Object) -> String {
    let Some(coords) = get_map("coords", p) else {
        return String::new();
    };

    let axis = |key: &str| coords.get(key).and_then(Value::as_f64);
    let (Some(x), Some(y), Some(z)) = (axis("x"), axis("y"), axis("z")) else {
        warn!(?coords, "unable to read coords as xyz");
        return String::new();
    };

    let heading = get_f64("heading", p);
    let speed = get_f64("speed", p);

    let mut movement = format!("{x:.1},{y:.1},{z:.1},{heading:.1}");
    if speed != 0.0 {
        movement.push_str(&format!(",{speed:.1}"));
    }
    movement
}
