//! Binary encoding of an interface schema.
//!
//! The chain stores schemas in a compact binary form rather than JSON. The
//! layout is deterministic:
//!
//! - varuint: ULEB128 (7 bits per byte, LSB first, high bit = continuation)
//! - string: varuint byte length, then UTF-8 bytes
//! - sequence: varuint element count, then the elements in order
//!
//! A schema encodes as: version string, struct sequence (name, base, field
//! sequence of name + type), table sequence (name, index type, record type).

use super::InterfaceSchema;

/// Serialize a schema into the chain's binary schema encoding.
pub fn encode_schema(schema: &InterfaceSchema) -> Vec<u8> {
    let mut out = Vec::new();
    write_str(&mut out, &schema.version);

    write_varuint(&mut out, schema.structs.len() as u64);
    for record in &schema.structs {
        write_str(&mut out, &record.name);
        write_str(&mut out, &record.base);
        write_varuint(&mut out, record.fields.len() as u64);
        for field in &record.fields {
            write_str(&mut out, &field.name);
            write_str(&mut out, &field.type_name);
        }
    }

    write_varuint(&mut out, schema.tables.len() as u64);
    for table in &schema.tables {
        write_str(&mut out, &table.name);
        write_str(&mut out, &table.index_type);
        write_str(&mut out, &table.record_type);
    }

    out
}

fn write_varuint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    write_varuint(out, s.len() as u64);
    out.extend_from_slice(s.as_bytes());
}
