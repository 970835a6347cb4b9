use std::collections::HashMap;

use serde_json::Value;

use crate::codec::Position;
use crate::error::{Error, Result};

/// Icon used when a marker names none, or an unknown one
pub const DEFAULT_ICON: u8 = 8;
pub const DEFAULT_DESCRIPTION: &str = "NO_DESCRIPTION";

const ICONS: &[(&str, u8)] = &[
    ("checkmark", 0),
    ("?", 1),
    ("!", 2),
    ("star", 3),
    ("crossmark", 4),
    ("temple", 5),
    ("brush", 6),
    ("sword", 7),
    ("flag", 8),
    ("lock", 9),
    ("skull", 10),
    ("$", 11),
    ("dollar", 11),
    ("red up", 12),
    ("red down", 13),
    ("red right", 14),
    ("red left", 15),
    ("green up", 16),
    ("green down", 17),
    ("green right", 18),
    ("green left", 19),
    ("up", 12),
    ("down", 13),
    ("right", 14),
    ("left", 15),
];

/// Map annotation drawn over the minimap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub pos: Position,
    pub icon: u8,
    pub description: String,
}

/// Unique key per position: 16 bits x, 16 bits y, 8 bits z
pub fn marker_key(pos: Position) -> u64 {
    ((pos.x as u64) << 24) | ((pos.y as u64) << 8) | pos.z as u64
}

/// Icon id for a case-insensitive icon name
pub fn parse_icon(name: &str) -> u8 {
    let lower = name.to_lowercase();
    ICONS
        .iter()
        .find(|(n, _)| *n == lower)
        .map(|(_, id)| *id)
        .unwrap_or(DEFAULT_ICON)
}

#[derive(Debug, Default)]
pub struct MarkerStore {
    markers: HashMap<u64, Marker, ahash::RandomState>,
    loaded: bool,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Whether a bulk load has completed
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Add a marker, replacing any at the same position
    pub fn add(&mut self, pos: Position, icon: u8, description: impl Into<String>) {
        let marker = Marker { pos, icon, description: description.into() };
        self.markers.insert(marker_key(pos), marker);
    }

    pub fn remove(&mut self, pos: Position) -> Option<Marker> {
        self.markers.remove(&marker_key(pos))
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.markers.contains_key(&marker_key(pos))
    }

    pub fn get(&self, pos: Position) -> Option<&Marker> {
        self.markers.get(&marker_key(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    /// Markers on `center.z` within `range` tiles on both axes
    pub fn in_range(&self, center: Position, range: i32) -> Vec<Marker> {
        self.markers
            .values()
            .filter(|m| {
                m.pos.z == center.z
                    && (m.pos.x as i32 - center.x as i32).abs() <= range
                    && (m.pos.y as i32 - center.y as i32).abs() <= range
            })
            .cloned()
            .collect()
    }

    /// Replace all markers from a JSON array of `{x, y, z, icon?, description?}`.
    ///
    /// A document that is not an array leaves the store untouched. Records
    /// without usable coordinates are skipped.
    pub fn load_json(&mut self, text: &str) -> Result<usize> {
        let doc: Value = serde_json::from_str(text).map_err(|e| Error::MalformedMarkers(e.to_string()))?;
        let Value::Array(records) = doc else {
            return Err(Error::MalformedMarkers("expected a JSON array".into()));
        };

        self.clear();
        let mut loaded = 0;
        for record in &records {
            let Some(pos) = record_position(record) else {
                continue;
            };
            let icon = record
                .get("icon")
                .and_then(Value::as_str)
                .map(parse_icon)
                .unwrap_or(DEFAULT_ICON);
            let description = record
                .get("description")
                .and_then(Value::as_str)
                .filter(|d| !d.is_empty())
                .unwrap_or(DEFAULT_DESCRIPTION);
            self.add(pos, icon, description);
            loaded += 1;
        }

        self.loaded = true;
        Ok(loaded)
    }
}

fn record_position(record: &Value) -> Option<Position> {
    let coord = |name: &str| record.get(name).and_then(Value::as_u64);
    Some(Position {
        x: u16::try_from(coord("x")?).ok()?,
        y: u16::try_from(coord("y")?).ok()?,
        z: u8::try_from(coord("z")?).ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MAX_Z;
    use std::collections::HashSet;

    #[test]
    fn test_marker_key_is_injective() {
        let coords = [0u16, 1, 2, 255, 256, 257, 4095, 4096, 32767, 32768, 65534, 65535];
        let mut seen = HashSet::new();
        for &x in &coords {
            for &y in &coords {
                for z in 0..=MAX_Z {
                    assert!(seen.insert(marker_key(Position::new(x, y, z))));
                }
            }
        }

        // Each field owns a disjoint bit range, so the key decodes back.
        let pos = Position::new(65535, 65535, 255);
        let key = marker_key(pos);
        assert_eq!((key >> 24) as u16, pos.x);
        assert_eq!((key >> 8) as u16, pos.y);
        assert_eq!(key as u8, pos.z);
    }

    #[test]
    fn test_parse_icon() {
        assert_eq!(parse_icon("Skull"), 10);
        assert_eq!(parse_icon("RED LEFT"), 15);
        assert_eq!(parse_icon("left"), 15);
        assert_eq!(parse_icon("dollar"), 11);
        assert_eq!(parse_icon("no such icon"), DEFAULT_ICON);
    }

    #[test]
    fn test_add_remove() {
        let mut store = MarkerStore::new();
        let pos = Position::new(100, 200, 7);
        store.add(pos, 3, "home");
        store.add(pos, 4, "home again");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(pos).unwrap().icon, 4);
        assert!(store.contains(pos));
        assert!(!store.contains(Position::new(100, 200, 6)));

        assert_eq!(store.remove(pos).unwrap().description, "home again");
        assert!(store.get(pos).is_none());
    }

    #[test]
    fn test_in_range() {
        let mut store = MarkerStore::new();
        store.add(Position::new(100, 100, 7), 0, "a");
        store.add(Position::new(105, 95, 7), 0, "b");
        store.add(Position::new(106, 100, 7), 0, "c");
        store.add(Position::new(100, 100, 6), 0, "d");

        let mut found: Vec<_> = store
            .in_range(Position::new(100, 100, 7), 5)
            .into_iter()
            .map(|m| m.description)
            .collect();
        found.sort();
        assert_eq!(found, vec!["a", "b"]);
    }

    #[test]
    fn test_load_json() {
        let mut store = MarkerStore::new();
        store.add(Position::new(1, 1, 1), 0, "old");

        let json = r#"[
            {"x": 100, "y": 200, "z": 7, "icon": "Star", "description": "shop"},
            {"x": 101, "y": 200, "z": 7, "icon": 5, "description": ""},
            {"x": 102, "y": 200},
            {"x": -1, "y": 200, "z": 7},
            {"x": 103, "y": 200, "z": 7}
        ]"#;
        assert_eq!(store.load_json(json).unwrap(), 3);
        assert!(store.is_loaded());
        assert!(!store.contains(Position::new(1, 1, 1)));

        let shop = store.get(Position::new(100, 200, 7)).unwrap();
        assert_eq!((shop.icon, shop.description.as_str()), (3, "shop"));

        let plain = store.get(Position::new(101, 200, 7)).unwrap();
        assert_eq!((plain.icon, plain.description.as_str()), (DEFAULT_ICON, DEFAULT_DESCRIPTION));
        assert!(store.contains(Position::new(103, 200, 7)));
    }

    #[test]
    fn test_load_json_malformed_keeps_markers() {
        let mut store = MarkerStore::new();
        store.add(Position::new(1, 1, 1), 0, "old");

        assert!(matches!(store.load_json("{\"x\": 1}"), Err(Error::MalformedMarkers(_))));
        assert!(matches!(store.load_json("[{"), Err(Error::MalformedMarkers(_))));
        assert_eq!(store.len(), 1);
        assert!(!store.is_loaded());
    }
}
