pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Split `links` into consecutive batches of at most `batch_size` links.
///
/// A size of 0 is treated as 1.
pub fn chunk(links: &[String], batch_size: usize) -> Vec<Vec<String>> {
    links
        .chunks(batch_size.max(1))
        .map(|batch| batch.to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("https://example.org/{i}")).collect()
    }

    #[test]
    fn last_batch_may_be_short() {
        let batches = chunk(&links(12), 5);
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![5, 5, 2]);
        assert_eq!(batches[2][1], "https://example.org/12");
    }

    #[test]
    fn zero_size_means_one_per_batch() {
        assert_eq!(chunk(&links(3), 0).len(), 3);
    }

    #[test]
    fn no_links_no_batches() {
        assert!(chunk(&[], 5).is_empty());
    }
}
