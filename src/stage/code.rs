//! Twelve-digit stage codes
//!
//! A stage code is a reversible encoding of a stage number in
//! `[1, 2^27]`. The 39-bit code value carries a scrambled copy of the
//! stage number plus twelve pseudo-random check bits derived from the
//! number minus one; the off-by-one between the payload source and the
//! check-bit source makes a mistyped digit overwhelmingly likely to
//! fail validation.

use std::fmt;
use std::str::FromStr;

/// Additive mask applied to the stage number before bit-scattering
const PAYLOAD_OFFSET: u64 = 19_088_742;

/// Largest valid stage number (2^27)
pub const MAX_STAGE_NUMBER: u32 = 1 << 27;

/// Why a code failed to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeError {
    /// Not twelve decimal digits
    Malformed,
    /// Digits parse but check bits do not validate
    Invalid,
}

impl fmt::Display for CodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeError::Malformed => write!(f, "stage code must be twelve decimal digits"),
            CodeError::Invalid => write!(f, "stage code failed validation"),
        }
    }
}

impl std::error::Error for CodeError {}

/// Twelve decimal digits, most significant first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageCode([u8; 12]);

impl StageCode {
    /// Build from a raw code value; fails above `10^12 - 1`
    pub fn from_number(mut value: u64) -> Option<Self> {
        if value >= 1_000_000_000_000 {
            return None;
        }
        let mut digits = [0u8; 12];
        for d in digits.iter_mut().rev() {
            *d = (value % 10) as u8;
            value /= 10;
        }
        Some(Self(digits))
    }

    /// Code for a stage number. Panics outside `[1, 2^27]`.
    pub fn for_stage(stage: u32) -> Self {
        Self::from_number(encode_stage(stage)).expect("encoded codes fit in twelve digits")
    }

    /// Big-endian place value of the digits
    pub fn to_number(self) -> u64 {
        self.0.iter().fold(0u64, |acc, &d| acc * 10 + d as u64)
    }

    /// Decode back to a stage number, validating the check bits
    pub fn stage_number(self) -> Result<u32, CodeError> {
        decode_stage(self.to_number())
    }

    /// The individual digits, most significant first
    pub fn digits(&self) -> &[u8; 12] {
        &self.0
    }

    /// Build from individual digits; each must be in `[0, 9]`
    pub fn from_digits(digits: [u8; 12]) -> Option<Self> {
        if digits.iter().all(|&d| d <= 9) {
            Some(Self(digits))
        } else {
            None
        }
    }
}

impl fmt::Display for StageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.0;
        write!(
            f,
            "{}{}{}{}-{}{}{}{}-{}{}{}{}",
            d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7], d[8], d[9], d[10], d[11]
        )
    }
}

impl FromStr for StageCode {
    type Err = CodeError;

    /// Accepts `DDDD-DDDD-DDDD` or twelve bare digits
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut digits = [0u8; 12];
        let mut n = 0;
        for c in s.chars() {
            if c == '-' {
                continue;
            }
            let d = c.to_digit(10).ok_or(CodeError::Malformed)?;
            if n == 12 {
                return Err(CodeError::Malformed);
            }
            digits[n] = d as u8;
            n += 1;
        }
        if n != 12 {
            return Err(CodeError::Malformed);
        }
        Ok(Self(digits))
    }
}

/// Encode a stage number in `[1, 2^27]` into its 39-bit code value
pub fn encode_stage(stage: u32) -> u64 {
    debug_assert!((1..=MAX_STAGE_NUMBER).contains(&stage));
    let mut ca = [false; 39];
    ca[38] = true;

    // Scatter the offset payload: low six bits land high, the rest low
    let payload = stage as u64 + PAYLOAD_OFFSET;
    for i in 0..6 {
        ca[26 + i] = (payload >> i) & 1 == 1;
    }
    for i in 0..21 {
        ca[i] = (payload >> (6 + i)) & 1 == 1;
    }

    // Check bits come from stage-1, so the two sources disagree by one
    let b = (stage - 1) as u64;
    let bit = |i: u32| (b >> i) & 1 == 1;
    ca[37] = true ^ bit(6) ^ bit(23);
    ca[36] = true ^ bit(5) ^ bit(22) ^ bit(17) ^ bit(0);
    ca[35] = true ^ bit(4) ^ bit(21) ^ bit(16);
    ca[34] = true ^ bit(3) ^ bit(20);
    ca[33] = true ^ bit(2) ^ bit(19);
    ca[32] = true ^ bit(1) ^ bit(18);
    ca[25] = bit(11) ^ bit(16);
    ca[24] = bit(10);
    ca[23] = bit(9) ^ bit(26);
    ca[22] = bit(8) ^ bit(25);
    ca[21] = bit(7) ^ bit(24);

    // Invert every odd bit
    for i in (1..38).step_by(2) {
        ca[i] = !ca[i];
    }

    ca.iter()
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | ((b as u64) << i))
}

/// Decode a code value; valid iff re-encoding reproduces it exactly
pub fn decode_stage(code: u64) -> Result<u32, CodeError> {
    if code >= (1 << 39) || (code >> 38) & 1 == 0 {
        return Err(CodeError::Invalid);
    }
    let mut ca = [false; 39];
    for (i, b) in ca.iter_mut().enumerate() {
        *b = (code >> i) & 1 == 1;
    }
    for i in (1..38).step_by(2) {
        ca[i] = !ca[i];
    }

    let mut payload = 0u64;
    for i in 0..6 {
        payload |= (ca[26 + i] as u64) << i;
    }
    for i in 0..21 {
        payload |= (ca[i] as u64) << (6 + i);
    }

    // The payload only keeps 27 bits, so reduce modulo 2^27; a zero
    // residue corresponds to stage 2^27, not stage zero
    let candidate =
        (payload as i64 - PAYLOAD_OFFSET as i64).rem_euclid(1 << 27) as u32;
    let candidate = if candidate == 0 {
        MAX_STAGE_NUMBER
    } else {
        candidate
    };

    if encode_stage(candidate) == code {
        Ok(candidate)
    } else {
        Err(CodeError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(encode_stage(1), 365_989_603_263);
        assert_eq!(encode_stage(2), 296_531_929_023);
        assert_eq!(encode_stage(3), 361_023_547_327);
        assert_eq!(encode_stage(1234), 469_419_042_690);
        assert_eq!(encode_stage(MAX_STAGE_NUMBER), 400_299_009_983);
    }

    #[test]
    fn test_stage_one_round_trip() {
        let code = StageCode::for_stage(1);
        assert_eq!(code.to_string(), "3659-8960-3263");
        assert_eq!(code.stage_number(), Ok(1));
    }

    #[test]
    fn test_single_digit_error_rejected() {
        // Stage 1's code with the last digit bumped
        let code: StageCode = "3659-8960-3264".parse().unwrap();
        assert_eq!(code.stage_number(), Err(CodeError::Invalid));
    }

    #[test]
    fn test_extreme_stage_numbers() {
        for s in [1, 2, MAX_STAGE_NUMBER - 1, MAX_STAGE_NUMBER] {
            assert_eq!(decode_stage(encode_stage(s)), Ok(s), "stage {s}");
        }
    }

    #[test]
    fn test_parse_dashed_and_bare() {
        let a: StageCode = "3659-8960-3263".parse().unwrap();
        let b: StageCode = "365989603263".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_number(), 365_989_603_263);

        assert!("3659-8960-326".parse::<StageCode>().is_err());
        assert!("3659-8960-32634".parse::<StageCode>().is_err());
        assert!("3659-8960-326x".parse::<StageCode>().is_err());
    }

    #[test]
    fn test_leading_zeros_significant() {
        let code = StageCode::from_number(12).unwrap();
        assert_eq!(code.to_string(), "0000-0000-0012");
        assert_eq!(code.to_number(), 12);
    }

    #[test]
    fn test_from_digits_validation() {
        assert!(StageCode::from_digits([0; 12]).is_some());
        assert!(StageCode::from_digits([10, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]).is_none());
    }

    #[test]
    fn test_random_values_overwhelmingly_rejected() {
        // Fixed-seed xorshift keeps the sample deterministic. Valid
        // codes cover 2^27 of the 10^12 values, so acceptance should
        // stay far below the 5% allowance.
        let mut x: u64 = 0x9E37_79B9_7F4A_7C15;
        const SAMPLES: u32 = 20_000;
        let mut rejected = 0u32;
        for _ in 0..SAMPLES {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            if decode_stage(x % 1_000_000_000_000).is_err() {
                rejected += 1;
            }
        }
        assert!(
            rejected as f64 / SAMPLES as f64 > 0.95,
            "only {rejected}/{SAMPLES} values rejected"
        );
    }

    proptest! {
        #[test]
        fn prop_round_trip(stage in 1u32..=MAX_STAGE_NUMBER) {
            prop_assert_eq!(decode_stage(encode_stage(stage)), Ok(stage));
        }

        #[test]
        fn prop_random_strings_mostly_rejected(value in 0u64..1_000_000_000_000) {
            // Either invalid, or a genuine code that reproduces itself
            if let Ok(stage) = decode_stage(value) {
                prop_assert_eq!(encode_stage(stage), value);
            }
        }
    }
}
