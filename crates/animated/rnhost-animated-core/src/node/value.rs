use crate::error::Result;
use rnhost_api_core::Tag;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use super::{parse_config, NodeKind};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ValueConfig {
    value: f64,
    #[serde(default)]
    offset: f64,
}

/// Externally writable number. The resolved value is `value + offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueNode {
    pub value: f64,
    pub offset: f64,
}

impl ValueNode {
    pub fn new(value: f64) -> Self {
        Self { value, offset: 0.0 }
    }

    pub(crate) fn from_config(tag: Tag, config: &Map<String, JsonValue>) -> Result<Self> {
        let cfg: ValueConfig = parse_config(tag, NodeKind::Value, config)?;
        Ok(Self {
            value: cfg.value,
            offset: cfg.offset,
        })
    }

    #[inline]
    pub fn get(&self) -> f64 {
        self.value + self.offset
    }

    /// Merge the offset into the value and reset the offset.
    pub fn flatten_offset(&mut self) {
        self.value += self.offset;
        self.offset = 0.0;
    }

    /// Move the value into the offset and reset the value.
    pub fn extract_offset(&mut self) {
        self.offset += self.value;
        self.value = 0.0;
    }
}
