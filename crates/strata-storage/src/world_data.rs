//! Per-world scalar state persisted as `world.dat`.
//!
//! ## Binary Layout (big-endian)
//!
//! | Field | Size |
//! |-------|------|
//! | Magic `0x4C574150` | 4 |
//! | Format version (currently 2) | 4 |
//! | Seed (`i32`) | 4 |
//! | Spawn x, y, z, yaw, pitch (`f64`) | 40 |
//! | Tagged fields: type byte, name, value | variable |
//! | End tag `0` | 1 |
//!
//! Names and string values are a `u16` byte length followed by UTF-8. Type
//! bytes: 1 = bool (1 byte), 2 = `i32`, 3 = `f64`, 4 = string. Readers skip
//! fields they do not recognise by sizing the value from its type byte.
//!
//! Files written before the tagged format have no magic: they start with the
//! seed, then the pose, then a single noclip bool.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::StorageError;
use crate::world_dir::{DEFAULT_DIMENSION, WorldDirectory};

/// First word of every tagged-format file ("LWAP").
pub const MAGIC: u32 = 0x4C57_4150;

/// Format version written by this build.
pub const FORMAT_VERSION: u32 = 2;

/// First version that carries tagged fields.
const TAGGED_VERSION: u32 = 2;

const TAG_END: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_DOUBLE: u8 = 3;
const TAG_STRING: u8 = 4;

const FIELD_NOCLIP: &str = "debugNoclip";
const FIELD_FLY: &str = "debugFly";
const FIELD_FULLBRIGHT: &str = "debugFullbright";
const FIELD_CHUNK_BORDERS: &str = "showChunkBorders";
const FIELD_XRAY: &str = "debugXray";
const FIELD_GAME_TIME: &str = "gameTime";
const FIELD_DAY_COUNTER: &str = "dayCounter";
const FIELD_DIMENSION: &str = "localDimension";

const KNOWN_FIELDS: [&str; 8] = [
    FIELD_NOCLIP,
    FIELD_FLY,
    FIELD_FULLBRIGHT,
    FIELD_CHUNK_BORDERS,
    FIELD_XRAY,
    FIELD_GAME_TIME,
    FIELD_DAY_COUNTER,
    FIELD_DIMENSION,
];

/// A typed value of one tagged field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Tag 1.
    Bool(bool),
    /// Tag 2.
    Int(i32),
    /// Tag 3.
    Double(f64),
    /// Tag 4.
    Str(String),
}

impl FieldValue {
    fn tag(&self) -> u8 {
        match self {
            Self::Bool(_) => TAG_BOOL,
            Self::Int(_) => TAG_INT,
            Self::Double(_) => TAG_DOUBLE,
            Self::Str(_) => TAG_STRING,
        }
    }
}

/// A named field read from or destined for the tagged section.
#[derive(Clone, Debug, PartialEq)]
pub struct TaggedField {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: FieldValue,
}

/// Scalar state of one world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldData {
    /// World generation seed.
    pub seed: i32,
    /// Spawn X.
    pub x: f64,
    /// Spawn Y.
    pub y: f64,
    /// Spawn Z.
    pub z: f64,
    /// Spawn yaw in radians.
    pub yaw: f64,
    /// Spawn pitch in radians.
    pub pitch: f64,
    /// Noclip debug toggle.
    pub debug_noclip: bool,
    /// Fly debug toggle.
    pub debug_fly: bool,
    /// Fullbright debug toggle.
    pub debug_fullbright: bool,
    /// Chunk border overlay toggle.
    pub show_chunk_borders: bool,
    /// X-ray debug toggle.
    pub debug_xray: bool,
    /// Time of day in hours.
    pub game_time: f64,
    /// Days elapsed.
    pub day_counter: i32,
    /// Dimension the local player was in.
    pub local_dimension: String,
    /// Fields this build does not recognise, written back unchanged on save.
    pub extra_fields: Vec<TaggedField>,
}

impl Default for WorldData {
    fn default() -> Self {
        Self {
            seed: 0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            debug_noclip: false,
            debug_fly: false,
            debug_fullbright: false,
            show_chunk_borders: false,
            debug_xray: false,
            game_time: 12.0,
            day_counter: 0,
            local_dimension: DEFAULT_DIMENSION.to_string(),
            extra_fields: Vec::new(),
        }
    }
}

impl WorldData {
    /// World state with the given seed and spawn pose, everything else default.
    pub fn new(seed: i32, pose: [f64; 5]) -> Self {
        let [x, y, z, yaw, pitch] = pose;
        Self {
            seed,
            x,
            y,
            z,
            yaw,
            pitch,
            ..Self::default()
        }
    }

    /// Serializes to the current tagged format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);
        buf.extend_from_slice(&MAGIC.to_be_bytes());
        buf.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        buf.extend_from_slice(&self.seed.to_be_bytes());
        for v in [self.x, self.y, self.z, self.yaw, self.pitch] {
            buf.extend_from_slice(&v.to_be_bytes());
        }

        let known = [
            (FIELD_NOCLIP, FieldValue::Bool(self.debug_noclip)),
            (FIELD_FLY, FieldValue::Bool(self.debug_fly)),
            (FIELD_FULLBRIGHT, FieldValue::Bool(self.debug_fullbright)),
            (FIELD_CHUNK_BORDERS, FieldValue::Bool(self.show_chunk_borders)),
            (FIELD_XRAY, FieldValue::Bool(self.debug_xray)),
            (FIELD_GAME_TIME, FieldValue::Double(self.game_time)),
            (FIELD_DAY_COUNTER, FieldValue::Int(self.day_counter)),
            (FIELD_DIMENSION, FieldValue::Str(self.local_dimension.clone())),
        ];
        for (name, value) in &known {
            write_field(&mut buf, name, value);
        }
        for field in &self.extra_fields {
            if KNOWN_FIELDS.contains(&field.name.as_str()) {
                continue;
            }
            write_field(&mut buf, &field.name, &field.value);
        }

        buf.push(TAG_END);
        buf
    }

    /// Parses either the tagged format or the legacy bare-seed format.
    ///
    /// Running out of bytes inside the tagged section ends it cleanly; running
    /// out inside the fixed header is an error.
    pub fn from_bytes(data: &[u8], path: &Path) -> Result<Self, StorageError> {
        let mut reader = Reader::new(data);
        let truncated = || {
            StorageError::io(
                path,
                std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "world.dat header truncated",
                ),
            )
        };

        let first = reader.u32().ok_or_else(truncated)?;
        let (version, seed) = if first == MAGIC {
            let version = reader.u32().ok_or_else(truncated)?;
            let seed = reader.i32().ok_or_else(truncated)?;
            (version, seed)
        } else {
            (0, first as i32)
        };

        let mut pose = [0.0f64; 5];
        for v in &mut pose {
            *v = reader.f64().ok_or_else(truncated)?;
        }
        let mut world = Self::new(seed, pose);

        if version >= TAGGED_VERSION {
            while let Some(field) = read_field(&mut reader)? {
                world.apply_field(field);
            }
        } else if let Some(noclip) = reader.u8() {
            world.debug_noclip = noclip != 0;
        }

        Ok(world)
    }

    fn apply_field(&mut self, field: TaggedField) {
        match (field.name.as_str(), &field.value) {
            (FIELD_NOCLIP, FieldValue::Bool(v)) => self.debug_noclip = *v,
            (FIELD_FLY, FieldValue::Bool(v)) => self.debug_fly = *v,
            (FIELD_FULLBRIGHT, FieldValue::Bool(v)) => self.debug_fullbright = *v,
            (FIELD_CHUNK_BORDERS, FieldValue::Bool(v)) => self.show_chunk_borders = *v,
            (FIELD_XRAY, FieldValue::Bool(v)) => self.debug_xray = *v,
            (FIELD_GAME_TIME, FieldValue::Double(v)) => self.game_time = *v,
            (FIELD_DAY_COUNTER, FieldValue::Int(v)) => self.day_counter = *v,
            (FIELD_DIMENSION, FieldValue::Str(v)) => self.local_dimension = v.clone(),
            (name, value) if KNOWN_FIELDS.contains(&name) => {
                tracing::warn!(
                    field = name,
                    tag = value.tag(),
                    "ignoring world field with unexpected type"
                );
            }
            _ => {
                tracing::debug!(field = %field.name, "keeping unrecognised world field");
                self.extra_fields.push(field);
            }
        }
    }
}

/// Reads and writes the `world.dat` of one world.
#[derive(Debug)]
pub struct WorldMetadataStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl WorldMetadataStore {
    /// Creates a store for `world`'s metadata file.
    pub fn new(world: &WorldDirectory) -> Self {
        Self {
            path: world.world_data_path(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the metadata file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `data`, replacing any previous file.
    ///
    /// The new content is written to a sibling temporary file and renamed over
    /// the old one.
    pub fn save(&self, data: &WorldData) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let tmp = self.path.with_extension("dat.tmp");
        let result = std::fs::write(&tmp, data.to_bytes())
            .map_err(|e| StorageError::io(&tmp, e))
            .and_then(|()| {
                std::fs::rename(&tmp, &self.path).map_err(|e| StorageError::io(&self.path, e))
            });
        result.inspect_err(|e| tracing::error!("failed to save world data: {e}"))
    }

    /// Loads the world state, or `Ok(None)` if no file exists yet.
    pub fn load(&self) -> Result<Option<WorldData>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };
        WorldData::from_bytes(&bytes, &self.path)
            .map(Some)
            .inspect_err(|e| tracing::error!("failed to load world data: {e}"))
    }
}

fn write_str(buf: &mut Vec<u8>, s: &str) {
    // Longer strings are cut at a char boundary to fit the u16 length.
    let mut end = s.len().min(u16::MAX as usize);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    buf.extend_from_slice(&(end as u16).to_be_bytes());
    buf.extend_from_slice(&s.as_bytes()[..end]);
}

fn write_field(buf: &mut Vec<u8>, name: &str, value: &FieldValue) {
    buf.push(value.tag());
    write_str(buf, name);
    match value {
        FieldValue::Bool(v) => buf.push(u8::from(*v)),
        FieldValue::Int(v) => buf.extend_from_slice(&v.to_be_bytes()),
        FieldValue::Double(v) => buf.extend_from_slice(&v.to_be_bytes()),
        FieldValue::Str(v) => write_str(buf, v),
    }
}

/// Reads one tagged field. `Ok(None)` at the end tag or when the bytes run out.
fn read_field(reader: &mut Reader<'_>) -> Result<Option<TaggedField>, StorageError> {
    let Some(tag) = reader.u8() else {
        return Ok(None);
    };
    if tag == TAG_END {
        return Ok(None);
    }
    let Some(name) = reader.string() else {
        return Ok(None);
    };
    let name = name.map_err(|()| StorageError::InvalidString {
        name: "<name>".to_string(),
    })?;

    let value = match tag {
        TAG_BOOL => reader.u8().map(|b| FieldValue::Bool(b != 0)),
        TAG_INT => reader.i32().map(FieldValue::Int),
        TAG_DOUBLE => reader.f64().map(FieldValue::Double),
        TAG_STRING => match reader.string() {
            Some(Ok(s)) => Some(FieldValue::Str(s)),
            Some(Err(())) => return Err(StorageError::InvalidString { name }),
            None => None,
        },
        _ => return Err(StorageError::UnknownFieldType { tag, name }),
    };
    Ok(value.map(|value| TaggedField { name, value }))
}

/// Big-endian reader yielding `None` once the input runs out.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        let slice = self.data.get(self.pos..self.pos.checked_add(n)?)?;
        self.pos += n;
        Some(slice)
    }

    fn array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.bytes(N)?.try_into().ok()
    }

    fn u8(&mut self) -> Option<u8> {
        self.array::<1>().map(|[b]| b)
    }

    fn u32(&mut self) -> Option<u32> {
        self.array().map(u32::from_be_bytes)
    }

    fn i32(&mut self) -> Option<i32> {
        self.array().map(i32::from_be_bytes)
    }

    fn f64(&mut self) -> Option<f64> {
        self.array().map(f64::from_be_bytes)
    }

    /// `None` if truncated, `Some(Err(()))` if the bytes are not UTF-8.
    fn string(&mut self) -> Option<Result<String, ()>> {
        let len = self.array().map(u16::from_be_bytes)?;
        let bytes = self.bytes(len as usize)?;
        Some(String::from_utf8(bytes.to_vec()).map_err(|_| ()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WorldData {
        WorldData {
            debug_fly: true,
            debug_xray: true,
            game_time: 18.25,
            day_counter: 41,
            local_dimension: "nether".to_string(),
            ..WorldData::new(-123_456, [10.5, 70.0, -3.25, 1.5, -0.25])
        }
    }

    fn legacy_bytes(seed: i32, pose: [f64; 5], noclip: Option<bool>) -> Vec<u8> {
        let mut buf = seed.to_be_bytes().to_vec();
        for v in pose {
            buf.extend_from_slice(&v.to_be_bytes());
        }
        if let Some(noclip) = noclip {
            buf.push(u8::from(noclip));
        }
        buf
    }

    #[test]
    fn test_roundtrip_current_format() {
        let data = sample();
        let bytes = data.to_bytes();
        assert_eq!(&bytes[..4], &MAGIC.to_be_bytes());
        assert_eq!(&bytes[4..8], &FORMAT_VERSION.to_be_bytes());
        assert_eq!(*bytes.last().unwrap(), TAG_END);

        let restored = WorldData::from_bytes(&bytes, Path::new("world.dat")).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn test_unknown_field_skipped_without_desync() {
        // A newer writer adds "futureField" between two known fields.
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC.to_be_bytes());
        buf.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        buf.extend_from_slice(&7i32.to_be_bytes());
        for _ in 0..5 {
            buf.extend_from_slice(&0f64.to_be_bytes());
        }
        write_field(&mut buf, FIELD_DAY_COUNTER, &FieldValue::Int(9));
        write_field(&mut buf, "futureField", &FieldValue::Str("payload".into()));
        write_field(&mut buf, FIELD_GAME_TIME, &FieldValue::Double(3.5));
        buf.push(TAG_END);

        let data = WorldData::from_bytes(&buf, Path::new("world.dat")).unwrap();
        assert_eq!(data.seed, 7);
        assert_eq!(data.day_counter, 9);
        assert_eq!(data.game_time, 3.5);
        assert_eq!(
            data.extra_fields,
            vec![TaggedField {
                name: "futureField".into(),
                value: FieldValue::Str("payload".into()),
            }]
        );
    }

    #[test]
    fn test_extra_fields_written_back() {
        let mut data = sample();
        data.extra_fields.push(TaggedField {
            name: "weather".into(),
            value: FieldValue::Int(3),
        });
        let restored = WorldData::from_bytes(&data.to_bytes(), Path::new("w")).unwrap();
        assert_eq!(restored.extra_fields, data.extra_fields);
    }

    #[test]
    fn test_legacy_format_reads_seed_and_noclip() {
        let bytes = legacy_bytes(99, [1.0, 2.0, 3.0, 0.5, -0.5], Some(true));
        let data = WorldData::from_bytes(&bytes, Path::new("world.dat")).unwrap();
        assert_eq!(data.seed, 99);
        assert_eq!([data.x, data.y, data.z, data.yaw, data.pitch], [1.0, 2.0, 3.0, 0.5, -0.5]);
        assert!(data.debug_noclip);
        assert!(!data.debug_fly);
        assert_eq!(data.game_time, 12.0);
        assert_eq!(data.day_counter, 0);
        assert_eq!(data.local_dimension, "overworld");
        assert!(data.extra_fields.is_empty());
    }

    #[test]
    fn test_legacy_without_trailing_bool() {
        let bytes = legacy_bytes(5, [0.0; 5], None);
        let data = WorldData::from_bytes(&bytes, Path::new("world.dat")).unwrap();
        assert_eq!(data.seed, 5);
        assert!(!data.debug_noclip);
    }

    #[test]
    fn test_missing_end_tag_is_clean_eof() {
        let mut bytes = sample().to_bytes();
        bytes.pop();
        let data = WorldData::from_bytes(&bytes, Path::new("world.dat")).unwrap();
        assert_eq!(data, sample());
    }

    #[test]
    fn test_field_cut_mid_value_stops_cleanly() {
        let mut bytes = WorldData::default().to_bytes();
        bytes.pop();
        // Drop part of the trailing "localDimension" string value.
        bytes.truncate(bytes.len() - 3);
        let data = WorldData::from_bytes(&bytes, Path::new("world.dat")).unwrap();
        assert_eq!(data.local_dimension, DEFAULT_DIMENSION);
        assert_eq!(data.day_counter, 0);
    }

    #[test]
    fn test_unknown_type_tag_is_error() {
        let mut bytes = WorldData::default().to_bytes();
        bytes.pop();
        bytes.push(9);
        write_str(&mut bytes, "mystery");
        bytes.extend_from_slice(&[1, 2, 3]);
        let result = WorldData::from_bytes(&bytes, Path::new("world.dat"));
        assert!(matches!(
            result,
            Err(StorageError::UnknownFieldType { tag: 9, ref name }) if name == "mystery"
        ));
    }

    #[test]
    fn test_known_name_with_wrong_type_is_ignored() {
        let mut bytes = WorldData::default().to_bytes();
        bytes.pop();
        write_field(&mut bytes, FIELD_DAY_COUNTER, &FieldValue::Str("oops".into()));
        write_field(&mut bytes, FIELD_FLY, &FieldValue::Bool(true));
        bytes.push(TAG_END);
        let data = WorldData::from_bytes(&bytes, Path::new("world.dat")).unwrap();
        assert_eq!(data.day_counter, 0);
        assert!(data.debug_fly);
        assert!(data.extra_fields.is_empty());
    }

    #[test]
    fn test_truncated_header_is_error() {
        let bytes = sample().to_bytes();
        let result = WorldData::from_bytes(&bytes[..20], Path::new("world.dat"));
        assert!(matches!(result, Err(StorageError::Io { .. })));
    }

    #[test]
    fn test_store_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let world = WorldDirectory::open(dir.path(), "w").unwrap();
        let store = WorldMetadataStore::new(&world);

        assert!(store.load().unwrap().is_none());
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
        assert!(!store.path().with_extension("dat.tmp").exists());
    }
}
