//! Tunables for compilation and descriptor accounting.

/// Sizing preferences handed to materializers through the compile context. Materializers that sub-allocate
/// buffers or device memory should never create blocks smaller than these.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BufferPreferences {
    /// Minimum size in bytes of a buffer block.
    pub minimum_buffer_size: u64,
    /// Minimum size in bytes of a device memory block.
    pub minimum_device_memory_size: u64,
}

impl Default for BufferPreferences {
    fn default() -> Self {
        Self {
            minimum_buffer_size: 16 * 1024 * 1024,
            minimum_device_memory_size: 16 * 1024 * 1024,
        }
    }
}

impl BufferPreferences {
    /// Set the minimum buffer block size.
    pub fn minimum_buffer_size(mut self, size: impl Into<u64>) -> Self {
        self.minimum_buffer_size = size.into();
        self
    }

    /// Set the minimum device memory block size.
    pub fn minimum_device_memory_size(mut self, size: impl Into<u64>) -> Self {
        self.minimum_device_memory_size = size.into();
        self
    }
}

/// Settings for [`CollectDescriptorStats`](crate::traversal::descriptor_stats::CollectDescriptorStats).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DescriptorStatsSettings {
    /// Hints that declare no pool sizes only contribute their set count when it is strictly larger than this value.
    pub hint_set_baseline: u32,
}

impl Default for DescriptorStatsSettings {
    fn default() -> Self {
        Self {
            hint_set_baseline: 9,
        }
    }
}

impl DescriptorStatsSettings {
    /// Set the hint set baseline.
    pub fn hint_set_baseline(mut self, baseline: u32) -> Self {
        self.hint_set_baseline = baseline;
        self
    }
}
