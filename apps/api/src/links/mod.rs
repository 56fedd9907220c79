//! Dashboard deep links: grouping roster rows, encoding/decoding links and
//! shaping the generated link set.

pub mod codec;
pub mod generator;
pub mod grouping;
