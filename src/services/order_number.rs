use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

/// Source of batch order numbers.
///
/// `attempt` is the zero-based attempt index within one checkout; a generator
/// must return different numbers for different attempts of the same checkout.
pub trait OrderNumberGenerator: Send + Sync {
    fn generate(&self, attempt: u32) -> String;
}

/// Order numbers built from the wall clock, a v4 UUID and a random numeral.
///
/// Layout: `ORD` + `YYYYMMDDHHMMSS` + 6-digit microseconds + 12 hex chars
/// + 10-digit random + 2-digit attempt + 4-digit sub-second tail.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntropyOrderNumbers;

impl OrderNumberGenerator for EntropyOrderNumbers {
    fn generate(&self, attempt: u32) -> String {
        let now = Utc::now();
        let token = Uuid::new_v4().simple().to_string();
        let random: u64 = rand::thread_rng().gen_range(0..10_000_000_000);
        format!(
            "ORD{}{:06}{}{:010}{:02}{:04}",
            now.format("%Y%m%d%H%M%S"),
            now.timestamp_subsec_micros() % 1_000_000,
            &token[..12],
            random,
            attempt % 100,
            now.timestamp_subsec_nanos() % 10_000,
        )
    }
}

/// Order number of one line item: the batch number itself for a single-item
/// checkout, `<batch>-NN` (1-based) otherwise.
pub fn line_order_number(batch: &str, index: usize, total: usize) -> String {
    if total == 1 {
        batch.to_string()
    } else {
        format!("{}-{:02}", batch, index + 1)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn generated_numbers_have_fixed_shape() {
        let number = EntropyOrderNumbers.generate(3);
        assert!(number.starts_with("ORD"));
        assert_eq!(number.len(), 51);
        assert_eq!(&number[45..47], "03");
        assert!(number[3..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn attempts_of_one_checkout_diverge() {
        let generator = EntropyOrderNumbers;
        let first = generator.generate(0);
        let second = generator.generate(1);
        assert_ne!(first, second);
    }

    #[test]
    fn burst_of_numbers_is_collision_free() {
        let generator = EntropyOrderNumbers;
        let numbers: HashSet<String> = (0..10_000).map(|_| generator.generate(0)).collect();
        assert_eq!(numbers.len(), 10_000);
    }

    #[test]
    fn single_item_uses_batch_number() {
        assert_eq!(line_order_number("ORDX", 0, 1), "ORDX");
    }

    #[test]
    fn multi_item_numbers_are_suffixed_in_order() {
        let numbers: Vec<String> = (0..3).map(|i| line_order_number("B", i, 3)).collect();
        assert_eq!(numbers, vec!["B-01", "B-02", "B-03"]);
    }
}
