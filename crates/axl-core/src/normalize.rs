//! Reply normalization
//!
//! AXL collapses a one-element result set to a bare object instead of a
//! one-element list, so a `listPhone` reply looks different depending on how
//! many phones matched. [`normalize`] flattens both shapes into a plain
//! `Vec<FlatRecord>` so nothing downstream has to care.

use crate::error::{AxlError, Result};
use crate::value::{AxlValue, FlatRecord};

/// Field every AXL response wraps its payload in
pub const RETURN_FIELD: &str = "return";

/// Convert a decoded reply envelope into an ordered sequence of records
pub fn normalize(envelope: &AxlValue) -> Result<Vec<FlatRecord>> {
    let envelope = envelope
        .as_record()
        .ok_or_else(|| AxlError::malformed("reply is not an object"))?;
    let ret = envelope
        .get(RETURN_FIELD)
        .ok_or_else(|| AxlError::malformed("reply does not have the property return"))?;

    let inner = match ret {
        AxlValue::Record(fields) => match fields.first() {
            Some((_, value)) => value,
            None => return Ok(Vec::new()),
        },
        // `<return/>`: the search matched nothing
        AxlValue::Scalar(s) if s.is_empty() => return Ok(Vec::new()),
        AxlValue::Scalar(_) => {
            return Err(AxlError::malformed("return holds a bare value, not objects"));
        }
        AxlValue::List(_) => {
            return Err(AxlError::malformed("return element is repeated"));
        }
    };

    match inner {
        AxlValue::Record(single) => Ok(vec![single.clone()]),
        AxlValue::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_record().cloned().ok_or_else(|| {
                    AxlError::malformed(format!("result {} is not an object", i))
                })
            })
            .collect(),
        // A matched object with no returned tags decodes as empty text
        AxlValue::Scalar(s) if s.is_empty() => Ok(vec![FlatRecord::new()]),
        AxlValue::Scalar(_) => Err(AxlError::malformed("result is not an object")),
    }
}

/// First property of a reply, used for add/update acknowledgements
///
/// `addPhoneResponse` carries `{return: "{uuid}"}`; the caller wants the uuid.
pub fn first_property(reply: &AxlValue) -> Result<AxlValue> {
    reply
        .as_record()
        .and_then(|r| r.first())
        .map(|(_, v)| v.clone())
        .ok_or_else(|| AxlError::malformed("acknowledgement reply is empty"))
}
