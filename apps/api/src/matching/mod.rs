//! Name normalisation, recipient derivation and recipient-to-link matching.

pub mod matcher;
pub mod normalize;
pub mod recipients;
