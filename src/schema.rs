//! Schema-driven reading of undocumented record shapes.
//!
//! Both the replay and save formats contain dozens of sections whose byte
//! layout is known but whose meaning is only partially identified. Rather
//! than a bespoke struct per section, a section is described by a small
//! declarative schema: an ordered list of primitive field kinds with
//! diagnostic names. Reading a schema walks the cursor field by field and
//! collects the labeled values, which keeps the cursor aligned regardless of
//! whether anyone ever interprets the record.

use crate::{cursor::Cursor, errors::Error};

/// Maximum plausible element count for a length-prefixed array.
///
/// A corrupt length field must be rejected before any allocation or element
/// read is attempted.
pub const MAX_ARRAY_LEN: u32 = 100_000;

/// Primitive field kinds a schema can be built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    U16,
    U32,
    I32,
    F32,
    /// u32 length prefix followed by that many raw bytes
    VarString,
    /// Fixed-size opaque block
    Bytes(usize),
}

/// A single schema entry: a primitive kind plus a diagnostic name
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub kind: FieldKind,
    pub name: &'static str,
}

impl Field {
    pub const fn u8(name: &'static str) -> Field {
        Field {
            kind: FieldKind::U8,
            name,
        }
    }

    pub const fn u16(name: &'static str) -> Field {
        Field {
            kind: FieldKind::U16,
            name,
        }
    }

    pub const fn u32(name: &'static str) -> Field {
        Field {
            kind: FieldKind::U32,
            name,
        }
    }

    pub const fn i32(name: &'static str) -> Field {
        Field {
            kind: FieldKind::I32,
            name,
        }
    }

    pub const fn f32(name: &'static str) -> Field {
        Field {
            kind: FieldKind::F32,
            name,
        }
    }

    pub const fn var_string(name: &'static str) -> Field {
        Field {
            kind: FieldKind::VarString,
            name,
        }
    }

    pub const fn bytes(len: usize, name: &'static str) -> Field {
        Field {
            kind: FieldKind::Bytes(len),
            name,
        }
    }
}

/// A decoded field value, tagged by kind
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    I32(i32),
    F32(f32),
    String(String),
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// The value widened to `i64`, if numeric
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            FieldValue::U8(x) => Some(i64::from(x)),
            FieldValue::U16(x) => Some(i64::from(x)),
            FieldValue::U32(x) => Some(i64::from(x)),
            FieldValue::I32(x) => Some(i64::from(x)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(x) => Some(x),
            _ => None,
        }
    }
}

/// The labeled values produced by reading one schema
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<(&'static str, FieldValue)>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(FieldValue::as_int)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    pub fn fields(&self) -> &[(&'static str, FieldValue)] {
        &self.fields
    }
}

/// Reads each field of `schema` in order, collecting the labeled values
pub fn read_record(
    cursor: &mut Cursor,
    section: &'static str,
    schema: &[Field],
) -> Result<Record, Error> {
    let mut fields = Vec::with_capacity(schema.len());
    for field in schema {
        let value = match field.kind {
            FieldKind::U8 => FieldValue::U8(cursor.read_u8().map_err(|e| e.in_section(section))?),
            FieldKind::U16 => {
                FieldValue::U16(cursor.read_u16().map_err(|e| e.in_section(section))?)
            }
            FieldKind::U32 => {
                FieldValue::U32(cursor.read_u32().map_err(|e| e.in_section(section))?)
            }
            FieldKind::I32 => {
                FieldValue::I32(cursor.read_i32().map_err(|e| e.in_section(section))?)
            }
            FieldKind::F32 => {
                FieldValue::F32(cursor.read_f32().map_err(|e| e.in_section(section))?)
            }
            FieldKind::VarString => FieldValue::String(
                cursor
                    .read_var_string()
                    .map_err(|e| e.in_section(section))?,
            ),
            FieldKind::Bytes(len) => FieldValue::Bytes(
                cursor
                    .read_bytes(len)
                    .map_err(|e| e.in_section(section))?
                    .to_vec(),
            ),
        };
        fields.push((field.name, value));
    }
    Ok(Record { fields })
}

/// Reads a `u32` element count capped at [`MAX_ARRAY_LEN`]
pub fn read_count(cursor: &mut Cursor, section: &'static str) -> Result<u32, Error> {
    let offset = cursor.position();
    let count = cursor.read_u32().map_err(|e| e.in_section(section))?;
    if count > MAX_ARRAY_LEN {
        return Err(Error::malformed_count(section, count, offset));
    }
    Ok(count)
}

/// Reads a capped `u32` count followed by that many repetitions of `schema`
pub fn read_array(
    cursor: &mut Cursor,
    section: &'static str,
    schema: &[Field],
) -> Result<Vec<Record>, Error> {
    let count = read_count(cursor, section)?;
    let mut records = Vec::new();
    for _ in 0..count {
        records.push(read_record(cursor, section, schema)?);
    }
    Ok(records)
}
