//! The engine's window onto the outside world
//!
//! A template never touches a socket or a file directly. It writes text and
//! reads or changes string-keyed parameters through a [`Context`]:
//!
//! - request parameters are read-only (`@paramGet`)
//! - persistent parameters survive between requests (`@pparamGet`, `@pparamSet`, `@pparamDel`)
//! - temporary parameters live for one request (`@tparamGet`, `@tparamSet`, `@tparamDel`)
//!
//! [`RequestContext`] is an in-memory implementation over any [`Write`] sink,
//! used by the CLI and tests.

use crate::interpreter::constants::DEFAULT_MIME_TYPE;
use rustc_hash::FxHashMap;
use std::io::{self, Write};

pub trait Context {
    /// Append text to the response
    fn write(&mut self, text: &str) -> io::Result<()>;

    fn parameter(&self, name: &str) -> Option<String>;

    fn persistent_parameter(&self, name: &str) -> Option<String>;
    fn set_persistent_parameter(&mut self, name: &str, value: String);
    fn remove_persistent_parameter(&mut self, name: &str);

    fn temporary_parameter(&self, name: &str) -> Option<String>;
    fn set_temporary_parameter(&mut self, name: &str, value: String);
    fn remove_temporary_parameter(&mut self, name: &str);

    fn set_mime_type(&mut self, mime_type: &str);
}

/// String maps plus a mime type, writing to `W`
#[derive(Debug)]
pub struct RequestContext<W: Write> {
    output: W,
    mime_type: String,
    parameters: FxHashMap<String, String>,
    persistent_parameters: FxHashMap<String, String>,
    temporary_parameters: FxHashMap<String, String>,
}

impl<W: Write> RequestContext<W> {
    pub fn new(output: W) -> Self {
        RequestContext {
            output,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            parameters: FxHashMap::default(),
            persistent_parameters: FxHashMap::default(),
            temporary_parameters: FxHashMap::default(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_persistent_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.persistent_parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_temporary_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.temporary_parameters.insert(name.into(), value.into());
        self
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Persistent store sorted by name
    pub fn persistent_parameters(&self) -> Vec<(&str, &str)> {
        sorted_entries(&self.persistent_parameters)
    }

    /// Temporary store sorted by name
    pub fn temporary_parameters(&self) -> Vec<(&str, &str)> {
        sorted_entries(&self.temporary_parameters)
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

impl RequestContext<Vec<u8>> {
    /// Context collecting output in memory
    pub fn buffered() -> Self {
        Self::new(Vec::new())
    }

    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

fn sorted_entries(store: &FxHashMap<String, String>) -> Vec<(&str, &str)> {
    let mut entries: Vec<(&str, &str)> = store
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    entries.sort_unstable();
    entries
}

impl<W: Write> Context for RequestContext<W> {
    fn write(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes())
    }

    fn parameter(&self, name: &str) -> Option<String> {
        self.parameters.get(name).cloned()
    }

    fn persistent_parameter(&self, name: &str) -> Option<String> {
        self.persistent_parameters.get(name).cloned()
    }

    fn set_persistent_parameter(&mut self, name: &str, value: String) {
        self.persistent_parameters.insert(name.to_string(), value);
    }

    fn remove_persistent_parameter(&mut self, name: &str) {
        self.persistent_parameters.remove(name);
    }

    fn temporary_parameter(&self, name: &str) -> Option<String> {
        self.temporary_parameters.get(name).cloned()
    }

    fn set_temporary_parameter(&mut self, name: &str, value: String) {
        self.temporary_parameters.insert(name.to_string(), value);
    }

    fn remove_temporary_parameter(&mut self, name: &str) {
        self.temporary_parameters.remove(name);
    }

    fn set_mime_type(&mut self, mime_type: &str) {
        self.mime_type = mime_type.to_string();
    }
}
