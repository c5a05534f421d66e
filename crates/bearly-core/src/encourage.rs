use rand::Rng;

pub const UPLIFTING_MESSAGES: [&str; 4] = [
    "You are amazing! Keep up the great work.",
    "Every small step towards better sleep is a victory.",
    "Remember to be kind to yourself. You're doing great.",
    "Your well-being is worth the effort.",
];

/// Pick one of [`UPLIFTING_MESSAGES`] using the caller's random source.
pub fn pick_uplifting_message<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    UPLIFTING_MESSAGES[rng.gen_range(0..UPLIFTING_MESSAGES.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_same_seed_same_message() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);

        for _ in 0..10 {
            assert_eq!(pick_uplifting_message(&mut a), pick_uplifting_message(&mut b));
        }
    }

    #[test]
    fn test_every_message_is_reachable() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();

        for _ in 0..200 {
            seen.insert(pick_uplifting_message(&mut rng));
        }

        assert_eq!(seen.len(), UPLIFTING_MESSAGES.len());
    }
}
