use rand::Rng;

/// Uniformly random element, `None` for an empty slice
pub fn random_element<'a, T, R: Rng + ?Sized>(items: &'a [T], rng: &mut R) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.gen_range(0..items.len()))
}

/// Round-robin cursor over a list whose length may change between calls
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobin {
    next: usize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the next element, wrapping at `len`
    pub fn next_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let index = self.next % len;
        self.next = index + 1;
        Some(index)
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_element_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let items: [u32; 0] = [];
        assert!(random_element(&items, &mut rng).is_none());
    }

    #[test]
    fn test_random_element_in_slice() {
        let mut rng = StdRng::seed_from_u64(1);
        let items = [3, 5, 7];
        for _ in 0..20 {
            let picked = random_element(&items, &mut rng).unwrap();
            assert!(items.contains(picked));
        }
    }

    #[test]
    fn test_round_robin_wraps() {
        let mut cursor = RoundRobin::new();
        let picks: Vec<_> = (0..5).filter_map(|_| cursor.next_index(3)).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_round_robin_shrinking_list() {
        let mut cursor = RoundRobin::new();
        cursor.next_index(5);
        cursor.next_index(5);
        cursor.next_index(5);
        assert_eq!(cursor.next_index(2), Some(1));
        assert_eq!(cursor.next_index(0), None);

        cursor.reset();
        assert_eq!(cursor.next_index(2), Some(0));
    }
}
