/// A property parameter such as `TZID=Europe/Lisbon` or `VALUE=DATE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Upper-cased.
    pub name: String,
    /// Unquoted, in order; usually a single value.
    pub values: Vec<String>,
}

impl Parameter {
    #[must_use]
    pub fn with_values(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// One unfolded line of a feed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Upper-cased property name, e.g. `DTSTART`.
    pub name: String,
    pub params: Vec<Parameter>,
    /// Everything after the first unquoted colon, unescaped later per type.
    pub raw_value: String,
}

impl ContentLine {
    /// First value of parameter `name`, compared case-insensitively.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .and_then(|p| p.values.first())
            .map(String::as_str)
    }
}
