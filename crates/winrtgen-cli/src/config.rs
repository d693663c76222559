//! XML configuration file reader
//!
//! The config file supplies include/exclude prefixes:
//!
//! ```xml
//! <configuration>
//!   <include><prefix>Windows.Foundation</prefix></include>
//!   <exclude><prefix>Windows.Foundation.Metadata</prefix></exclude>
//! </configuration>
//! ```
//!
//! Prefix values must be ASCII; a file without a `<configuration>` root is
//! rejected.

use std::collections::BTreeSet;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config file: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed config file: missing <configuration> root element")]
    MissingRoot,

    #[error("malformed config file: <prefix> values must be ASCII")]
    NonAsciiPrefix,
}

/// Parsed prefix sets, include first.
pub type Prefixes = (BTreeSet<String>, BTreeSet<String>);

pub fn read_config_file(path: &Path) -> Result<Prefixes, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Result<Prefixes, ConfigError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut include = BTreeSet::new();
    let mut exclude = BTreeSet::new();
    let mut saw_configuration = false;
    let mut in_include = false;
    let mut in_exclude = false;
    let mut in_prefix = false;

    loop {
        match reader.read_event()? {
            Event::Start(element) => match element.local_name().as_ref() {
                b"configuration" => saw_configuration = true,
                b"include" => {
                    in_include = true;
                    in_exclude = false;
                }
                b"exclude" => {
                    in_exclude = true;
                    in_include = false;
                }
                b"prefix" => in_prefix = in_include || in_exclude,
                _ => {}
            },
            Event::Empty(element) => {
                if element.local_name().as_ref() == b"configuration" {
                    saw_configuration = true;
                }
            }
            Event::End(element) => match element.local_name().as_ref() {
                b"include" => in_include = false,
                b"exclude" => in_exclude = false,
                b"prefix" => in_prefix = false,
                _ => {}
            },
            Event::Text(text) => {
                if !in_prefix {
                    continue;
                }

                let value = text.unescape().map_err(quick_xml::Error::from)?;
                let value = value.trim();
                if !value.is_ascii() {
                    return Err(ConfigError::NonAsciiPrefix);
                }
                if !value.is_empty() {
                    if in_include {
                        include.insert(value.to_string());
                    } else {
                        exclude.insert(value.to_string());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_configuration {
        return Err(ConfigError::MissingRoot);
    }

    Ok((include, exclude))
}
