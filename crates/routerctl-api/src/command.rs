// ── Command builder ──
//
// Router API commands are a path word (`/interface/set`) followed by
// attribute words (`=key=value`) and query words (`?key=value`, `?#|`).
// Commands are assembled with `CommandBuilder` and are immutable once built.

use std::fmt;

/// One word following the command path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    /// `=key=value` — an argument to the command.
    Attribute { key: String, value: String },
    /// `?key=value` — a filter pushed onto the query stack.
    Query { key: String, value: String },
    /// `?#<ops>` — a query stack operation such as `|` (or).
    QueryOperation(String),
}

impl Parameter {
    /// Render the parameter as it appears on the wire.
    pub fn to_word(&self) -> String {
        match self {
            Self::Attribute { key, value } => format!("={key}={value}"),
            Self::Query { key, value } => format!("?{key}={value}"),
            Self::QueryOperation(ops) => format!("?#{ops}"),
        }
    }
}

/// An immutable, fully built router API command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    path: String,
    parameters: Vec<Parameter>,
}

impl Command {
    /// Start building a command for the given path.
    pub fn builder(path: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            path: path.into(),
            parameters: Vec::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Look up the value of an `=key=value` attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.parameters.iter().find_map(|p| match p {
            Parameter::Attribute { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// All words of the sentence: the path followed by every parameter.
    pub fn words(&self) -> Vec<String> {
        std::iter::once(self.path.clone())
            .chain(self.parameters.iter().map(Parameter::to_word))
            .collect()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.words().join(" "))
    }
}

/// Builder for [`Command`]. Parameters keep insertion order.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    path: String,
    parameters: Vec<Parameter>,
}

impl CommandBuilder {
    /// Append an `=key=value` attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(Parameter::Attribute {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Restrict the returned properties (`=.proplist=a,b,c`).
    pub fn proplist(self, properties: &[&str]) -> Self {
        self.attribute(".proplist", properties.join(","))
    }

    /// Append a `?key=value` query word.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(Parameter::Query {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Append a `?#<ops>` query stack operation.
    pub fn query_operation(mut self, ops: impl Into<String>) -> Self {
        self.parameters.push(Parameter::QueryOperation(ops.into()));
        self
    }

    pub fn build(self) -> Command {
        Command {
            path: self.path,
            parameters: self.parameters,
        }
    }
}
