use std::collections::BTreeMap;

/// Incoming request metadata, keyed by lowercase name. A key may repeat.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: BTreeMap<String, Vec<String>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .entry(key.as_ref().to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(key.as_ref().to_ascii_lowercase(), vec![value.into()]);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |v| (key.as_str(), v.as_str())))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Metadata
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Metadata::new();
        for (key, value) in iter {
            metadata.append(key, value);
        }
        metadata
    }
}
