/// Usage report for a byte memory or value memory.
///
/// `used_bytes + free_bytes == total_bytes` always holds; the figures count
/// whole blocks, not payload bytes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MemoryInfo {
    pub total_bytes: usize,
    pub used_bytes: usize,
    pub free_bytes: usize,
}
