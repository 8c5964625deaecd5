//! Wire format for scores.
//!
//! Scores are carried as `f64` so that fractional provider values reach the
//! merger intact and are rounded once, after averaging. On the way out they
//! are always whole numbers.

use serde::Serializer;

pub(crate) fn rounded<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_i64(v.round() as i64),
        None => serializer.serialize_none(),
    }
}
