use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Where the payload bits of a run come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitSource {
    /// Uniform random bits from a seeded ChaCha8 stream
    Random { seed: u64 },
    /// PRBS-15 sequence, x^15 + x^14 + 1
    Prbs15 { seed: u16 },
}

impl BitSource {
    /// Generate `num_bits` bits, one per byte
    pub fn generate(&self, num_bits: usize) -> Vec<u8> {
        match *self {
            BitSource::Random { seed } => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                (0..num_bits).map(|_| rng.random::<bool>() as u8).collect()
            }
            BitSource::Prbs15 { seed } => {
                let mut out = vec![0u8; num_bits];
                Prbs15::new(seed).fill(&mut out);
                out
            }
        }
    }
}

/// 15-bit Fibonacci LFSR, feedback from stages 15 and 14.
pub struct Prbs15 {
    state: u16,
}

impl Prbs15 {
    pub const PERIOD: usize = (1 << 15) - 1;
    const MASK: u16 = 0x7FFF;

    /// A zero seed would lock the register, it is replaced by all ones
    pub fn new(seed: u16) -> Self {
        let state = match seed & Self::MASK {
            0 => Self::MASK,
            s => s,
        };
        Self { state }
    }

    #[inline]
    pub fn next_bit(&mut self) -> u8 {
        let s = self.state;
        let bit = ((s >> 14) ^ (s >> 13)) & 1;
        self.state = ((s << 1) | bit) & Self::MASK;
        bit as u8
    }

    pub fn fill(&mut self, out: &mut [u8]) {
        for slot in out.iter_mut() {
            *slot = self.next_bit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prbs15_first_bits() {
        let bits = BitSource::Prbs15 { seed: 0x7FFF }.generate(16);
        assert_eq!(bits, vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn test_prbs15_zero_seed_is_all_ones() {
        assert_eq!(
            BitSource::Prbs15 { seed: 0 }.generate(100),
            BitSource::Prbs15 { seed: 0x7FFF }.generate(100)
        );
    }

    #[test]
    fn test_prbs15_period_and_balance() {
        let bits = BitSource::Prbs15 { seed: 0x1234 }.generate(2 * Prbs15::PERIOD);
        let (first, second) = bits.split_at(Prbs15::PERIOD);
        assert_eq!(first, second);
        // Maximal-length sequence: one more one than zeros
        assert_eq!(first.iter().filter(|&&b| b == 1).count(), 16384);
    }

    #[test]
    fn test_random_bits_are_seeded() {
        let a = BitSource::Random { seed: 42 }.generate(1024);
        let b = BitSource::Random { seed: 42 }.generate(1024);
        let c = BitSource::Random { seed: 43 }.generate(1024);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|&x| x <= 1));
        let ones = a.iter().filter(|&&x| x == 1).count();
        assert!(ones > 400 && ones < 624, "ones = {}", ones);
    }
}
