use rand::Rng;

/// Chooses which acknowledgement remark to speak.
pub trait RemarkPicker: Send {
    /// Returns an index in `0..count`. `count` is never zero.
    fn pick(&mut self, count: usize) -> usize;
}

/// Uniform random choice.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl RemarkPicker for RandomPicker {
    fn pick(&mut self, count: usize) -> usize {
        rand::thread_rng().gen_range(0..count)
    }
}

/// Always picks the same slot (modulo the set size).
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedPicker(pub usize);

impl RemarkPicker for FixedPicker {
    fn pick(&mut self, count: usize) -> usize {
        self.0 % count
    }
}
