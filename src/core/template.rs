/// Typed `{{slot}}` template binding.
///
/// Replaces the ad hoc string-replace filling of the original design
/// with a named-slot map, so a missing binding is an explicit error and
/// no marker can survive into final output.
use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unbound slot: {0}")]
    UnboundSlot(String),
    #[error("unclosed slot marker")]
    UnclosedMarker,
}

/// Named slot bindings for one fill pass.
#[derive(Debug, Clone, Default)]
pub struct Slots {
    values: FxHashMap<String, String>,
}

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|s| s.as_str())
    }
}

/// Fill every `{{slot}}` marker in `template` from `slots`.
///
/// Errors on a slot with no binding and on an unclosed marker, so the
/// output is guaranteed marker-free.
pub fn fill(template: &str, slots: &Slots) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or(TemplateError::UnclosedMarker)?;
        let name = after[..end].trim();
        let value = slots
            .get(name)
            .ok_or_else(|| TemplateError::UnboundSlot(name.to_string()))?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Remove any leftover `{{...}}` marker, including unclosed ones.
///
/// Last-resort pass over synthesized output; [`fill`] should already
/// have consumed every marker.
pub fn strip_unresolved(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("}}") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
