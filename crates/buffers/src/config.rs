//! Write buffer capacity settings.

use serde::{Deserialize, Serialize};

/// Capacity settings for a [`WriteBuffer`](crate::WriteBuffer).
///
/// Deserializable so that hosts can keep it next to their own settings:
///
/// ```
/// use fbe_buffers::BufferConfig;
///
/// let config: BufferConfig = toml::from_str("initial_capacity = 256").unwrap();
/// assert_eq!(config.initial_capacity, 256);
/// assert_eq!(config.max_capacity, BufferConfig::default().max_capacity);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Bytes reserved when the buffer is created.
    pub initial_capacity: usize,
    /// Hard upper bound on capacity. Pointers are 32-bit, so anything above
    /// `u32::MAX` could not be addressed anyway.
    pub max_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            max_capacity: u32::MAX as usize,
        }
    }
}

impl BufferConfig {
    /// Config with the given initial capacity and the default limit.
    pub fn with_initial_capacity(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            ..Self::default()
        }
    }

    /// Capacity to grow to so that at least `required` bytes fit.
    pub(crate) fn grow(&self, capacity: usize, required: usize) -> Option<usize> {
        if required > self.max_capacity {
            return None;
        }
        Some(capacity.saturating_mul(2).max(required).min(self.max_capacity))
    }
}
