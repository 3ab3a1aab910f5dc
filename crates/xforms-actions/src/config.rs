use crate::node::QName;

pub const XXFORMS_NAMESPACE_URI: &str = "http://orbeon.org/oxf/xml/xforms";
pub const XXFORMS_PREFIX: &str = "xxf";

/// Interpreter settings shared by every action of one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Attribute holding explicit repeat indexes for target resolution.
    pub repeat_indexes_attribute: QName,
    /// Attribute that can switch off deferred updates with `"false"`.
    pub deferred_updates_attribute: QName,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            repeat_indexes_attribute: QName::ns(XXFORMS_NAMESPACE_URI, XXFORMS_PREFIX, "repeat-indexes"),
            deferred_updates_attribute: QName::ns(
                XXFORMS_NAMESPACE_URI,
                XXFORMS_PREFIX,
                "deferred-updates",
            ),
        }
    }
}

impl InterpreterConfig {
    pub fn with_repeat_indexes_attribute(mut self, name: QName) -> Self {
        self.repeat_indexes_attribute = name;
        self
    }

    pub fn with_deferred_updates_attribute(mut self, name: QName) -> Self {
        self.deferred_updates_attribute = name;
        self
    }
}
