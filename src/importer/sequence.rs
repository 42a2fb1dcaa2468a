// ==========================================
// mHealth Barangay San Cristobal - Identifier Sequence
// ==========================================

/// Batch-local identifier allocator, seeded once from the store's
/// current maximum. Only consumed when a row actually creates a record,
/// so updated and failed rows leave no gaps.
///
/// Two batches running against the same table can seed the same value;
/// the loser's insert then fails on the primary key and is reported as
/// a per-row failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSequence {
    next: i64,
}

impl IdSequence {
    pub fn starting_at(next: i64) -> Self {
        Self { next }
    }

    /// Seed from `MAX(id)`; an empty table starts at 1.
    pub fn seeded_from_max(max: Option<i64>) -> Self {
        Self {
            next: max.unwrap_or(0) + 1,
        }
    }

    /// The identifier the next create will receive.
    pub fn peek(&self) -> i64 {
        self.next
    }

    /// Consume and return the next identifier.
    pub fn advance(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_from_max() {
        assert_eq!(IdSequence::seeded_from_max(None).peek(), 1);
        assert_eq!(IdSequence::seeded_from_max(Some(41)).peek(), 42);
    }

    #[test]
    fn test_advance_is_contiguous() {
        let mut seq = IdSequence::seeded_from_max(Some(41));
        assert_eq!(seq.advance(), 42);
        assert_eq!(seq.advance(), 43);
        assert_eq!(seq.peek(), 44);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut seq = IdSequence::starting_at(7);
        assert_eq!(seq.peek(), 7);
        assert_eq!(seq.peek(), 7);
        assert_eq!(seq.advance(), 7);
    }
}
