use std::collections::HashMap;

/// Resolves localization keys to display strings.
pub trait TextLookup {
    fn get_string(&self, key: &str) -> String;
}

/// In-memory string table. Unknown keys resolve to the key itself, so a
/// missing translation shows up as its raw identifier rather than blank text.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    strings: HashMap<String, String>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.strings.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl FromIterator<(String, String)> for StringTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            strings: iter.into_iter().collect(),
        }
    }
}

impl TextLookup for StringTable {
    fn get_string(&self, key: &str) -> String {
        self.strings
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
