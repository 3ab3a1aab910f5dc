//! Effective-id arithmetic.
//!
//! An effective id names one live instance of a statically defined element:
//!
//! ```text
//! outer≡inner≡static-id⊙1-3
//! └─ prefix ──┘└ static ┘ └ repeat indexes
//! ```
//!
//! The prefix locates the element inside nested components, the suffix
//! selects an iteration of every enclosing repeat.

use smallvec::SmallVec;

pub const COMPONENT_SEPARATOR: char = '\u{2261}';
pub const REPEAT_SEPARATOR: char = '\u{2299}';
pub const REPEAT_INDEX_SEPARATOR: char = '-';

pub type RepeatIndexes = SmallVec<[u32; 4]>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("invalid repeat index `{token}` in `{text}`")]
    InvalidRepeatIndex { text: String, token: String },
}

/// The id without its repeat suffix.
pub fn prefixed_id(effective_id: &str) -> &str {
    effective_id.split_once(REPEAT_SEPARATOR).map_or(effective_id, |(prefixed, _)| prefixed)
}

/// The static id: no component prefix, no repeat suffix.
pub fn static_id(effective_id: &str) -> &str {
    let prefixed = prefixed_id(effective_id);
    prefixed.rsplit_once(COMPONENT_SEPARATOR).map_or(prefixed, |(_, local)| local)
}

/// Component prefix including its trailing separator, or `""` at top level.
pub fn effective_id_prefix(effective_id: &str) -> &str {
    let prefixed = prefixed_id(effective_id);
    match prefixed.rfind(COMPONENT_SEPARATOR) {
        Some(pos) => &prefixed[..pos + COMPONENT_SEPARATOR.len_utf8()],
        None => "",
    }
}

/// Repeat suffix without the leading separator, or `""` outside repeats.
pub fn effective_id_suffix(effective_id: &str) -> &str {
    effective_id.split_once(REPEAT_SEPARATOR).map_or("", |(_, suffix)| suffix)
}

/// Id of the element with `static_id` living in the same component and
/// repeat iteration as `base_effective_id`.
pub fn related_effective_id(base_effective_id: &str, static_id: &str) -> String {
    let prefix = effective_id_prefix(base_effective_id);
    let suffix = effective_id_suffix(base_effective_id);
    let mut out = String::with_capacity(prefix.len() + static_id.len() + suffix.len() + 3);
    out.push_str(prefix);
    out.push_str(static_id);
    if !suffix.is_empty() {
        out.push(REPEAT_SEPARATOR);
        out.push_str(suffix);
    }
    out
}

/// Parse a whitespace-separated list of 1-based repeat indexes.
pub fn parse_repeat_indexes(text: &str) -> Result<RepeatIndexes, IdError> {
    text.split_whitespace()
        .map(|token| match token.parse::<u32>() {
            Ok(index) if index > 0 => Ok(index),
            _ => Err(IdError::InvalidRepeatIndex { text: text.to_string(), token: token.to_string() }),
        })
        .collect()
}

pub fn effective_id_with_indexes(prefixed_id: &str, indexes: &[u32]) -> String {
    if indexes.is_empty() {
        return prefixed_id.to_string();
    }
    let mut out = String::from(prefixed_id);
    out.push(REPEAT_SEPARATOR);
    for (i, index) in indexes.iter().enumerate() {
        if i > 0 {
            out.push(REPEAT_INDEX_SEPARATOR);
        }
        out.push_str(&index.to_string());
    }
    out
}
