//! On-disk encoding of key-value records.
//!
//! Records are stored as JSON Lines: one `{"Key":..,"Value":..}` object per
//! line. Files can be appended to record by record and read back as a stream
//! until a clean end of input.

pub mod encode_decode;

pub use encode_decode::{decode_all, RecordReader, RecordWriter};
