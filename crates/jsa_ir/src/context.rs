//! Per-run generation counters.

use crate::quad::Operand;

/// Temporary and label counters for one generation run. Every run starts
/// from a fresh context, so names never leak between runs.
#[derive(Debug, Clone, Default)]
pub struct GenContext {
    temps: u32,
    labels: u32,
}

impl GenContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A temporary that has never been handed out in this run.
    pub fn new_temp(&mut self) -> Operand {
        self.temps += 1;
        Operand::Temp(self.temps)
    }

    /// A label id that has never been handed out in this run.
    pub fn new_label(&mut self) -> u32 {
        self.labels += 1;
        self.labels
    }

    pub fn temp_count(&self) -> u32 {
        self.temps
    }

    pub fn label_count(&self) -> u32 {
        self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_one() {
        let mut ctx = GenContext::new();
        assert_eq!(ctx.new_temp(), Operand::Temp(1));
        assert_eq!(ctx.new_temp(), Operand::Temp(2));
        assert_eq!(ctx.new_label(), 1);
        assert_eq!((ctx.temp_count(), ctx.label_count()), (2, 1));
    }
}
