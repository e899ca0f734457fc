// ── Response sentences and rows ──
//
// Every router reply is a sentence: `!re` carries one data row, `!done`
// terminates a command successfully, `!trap` and `!fatal` report failure.

use std::fmt;

use indexmap::IndexMap;

/// Attribute map of a single reply, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    attributes: IndexMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an attribute. Later values replace earlier ones.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Owned string value, or `None` when the attribute is absent.
    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_owned)
    }

    /// Boolean value. The router spells booleans `true`/`false` or `yes`/`no`;
    /// anything else reads as absent.
    pub fn boolean(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            attributes: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Typed view over a [`Row`].
///
/// Implementations read every field as optional; presence checks belong
/// to the consumer, which knows which fields it requires.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Self;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> Self {
        row.clone()
    }
}

/// One discrete response unit from the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sentence {
    /// `!done` — the command completed successfully.
    Done(Row),
    /// `!re` — one data row.
    Reply(Row),
    /// `!trap` — the command failed.
    Trap(Row),
    /// `!fatal` — the session is being torn down.
    Fatal(String),
}

impl Sentence {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Reply word without the leading `!`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Done(_) => "done",
            Self::Reply(_) => "re",
            Self::Trap(_) => "trap",
            Self::Fatal(_) => "fatal",
        }
    }

    /// Human-readable body of the sentence.
    pub fn text(&self) -> String {
        match self {
            Self::Fatal(message) => message.clone(),
            Self::Trap(row) => row
                .get("message")
                .map_or_else(|| render_attributes(row), str::to_owned),
            Self::Done(row) | Self::Reply(row) => render_attributes(row),
        }
    }
}

fn render_attributes(row: &Row) -> String {
    row.iter()
        .map(|(k, v)| format!("={k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{}", self.kind())?;
        let text = self.text();
        if !text.is_empty() {
            write!(f, " {text}")?;
        }
        Ok(())
    }
}
