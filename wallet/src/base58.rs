use crate::types::DecodeError;

/// The Bitcoin base58 alphabet. Excludes `0`, `O`, `I` and `l`.
pub const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

const INVALID: u8 = 0xff;

/// ASCII byte -> digit value, `INVALID` for bytes outside the alphabet.
const DIGITS: [u8; 128] = build_digit_table();

const fn build_digit_table() -> [u8; 128] {
    let mut table = [INVALID; 128];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Digit value of a base58 symbol, or `None` if it is not in the alphabet.
pub fn digit_value(ch: char) -> Option<u8> {
    if !ch.is_ascii() {
        return None;
    }
    match DIGITS[ch as usize] {
        INVALID => None,
        digit => Some(digit),
    }
}

pub fn is_base58_byte(b: u8) -> bool {
    b.is_ascii() && DIGITS[b as usize] != INVALID
}

/// Decode a base58 string into bytes.
///
/// Each leading `'1'` becomes a leading zero byte. The rest of the string is
/// read as a big-endian base-58 integer, accumulated in a growable base-256
/// digit array so arbitrarily long inputs never overflow.
pub fn decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    if input.is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    let leading_zeros = input.bytes().take_while(|&b| b == ALPHABET[0]).count();

    // Little-endian; the most significant byte is always non-zero.
    let mut acc: Vec<u8> = Vec::with_capacity(input.len());
    for (position, ch) in input.chars().enumerate() {
        let digit = digit_value(ch).ok_or(DecodeError::InvalidCharacter { ch, position })?;

        let mut carry = u32::from(digit);
        for byte in acc.iter_mut() {
            carry += u32::from(*byte) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            acc.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let mut bytes = Vec::with_capacity(leading_zeros + acc.len());
    bytes.resize(leading_zeros, 0);
    bytes.extend(acc.iter().rev());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode(""), Err(DecodeError::EmptyInput));
    }

    #[test]
    fn test_decode_single_one_is_zero_byte() {
        assert_eq!(decode("1").unwrap(), vec![0x00]);
        assert_eq!(decode("111").unwrap(), vec![0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_decode_excluded_symbols() {
        assert_eq!(
            decode("0"),
            Err(DecodeError::InvalidCharacter { ch: '0', position: 0 })
        );
        assert_eq!(
            decode("abcO"),
            Err(DecodeError::InvalidCharacter { ch: 'O', position: 3 })
        );
        assert!(matches!(
            decode("2I"),
            Err(DecodeError::InvalidCharacter { ch: 'I', position: 1 })
        ));
        assert!(matches!(
            decode("2l"),
            Err(DecodeError::InvalidCharacter { ch: 'l', position: 1 })
        ));
        assert!(matches!(
            decode("2é"),
            Err(DecodeError::InvalidCharacter { ch: 'é', position: 1 })
        ));
    }

    #[test]
    fn test_decode_known_values() {
        assert_eq!(decode("2").unwrap(), vec![1]);
        assert_eq!(decode("z").unwrap(), vec![57]);
        assert_eq!(decode("21").unwrap(), vec![58]);
        // 4 * 58 + 24 = 256
        assert_eq!(decode("5R").unwrap(), vec![1, 0]);
        assert_eq!(decode("1112").unwrap(), vec![0, 0, 0, 1]);
        assert_eq!(decode("StV1DL6CwTryKyV").unwrap(), b"hello world".to_vec());
    }

    #[test]
    fn test_decode_matches_reference_encoder() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let len = rng.gen_range(1..=64);
            let mut bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            // Exercise the leading-zero path on a share of the samples.
            let zeros = rng.gen_range(0..4).min(bytes.len());
            bytes[..zeros].fill(0);

            let encoded = bs58::encode(&bytes).into_string();
            assert_eq!(decode(&encoded).unwrap(), bytes, "input {encoded}");
        }
    }

    #[test]
    fn test_leading_ones_prefix_zero_bytes() {
        let tail = "3yZe7d";
        let tail_bytes = decode(tail).unwrap();
        for k in 0..6 {
            let input = format!("{}{tail}", "1".repeat(k));
            let decoded = decode(&input).unwrap();
            assert_eq!(decoded.len(), k + tail_bytes.len());
            assert!(decoded[..k].iter().all(|&b| b == 0));
            assert_eq!(&decoded[k..], tail_bytes.as_slice());
        }
    }

    #[test]
    fn test_long_input_exceeds_machine_width() {
        let bytes = [0xffu8; 40];
        let encoded = bs58::encode(bytes).into_string();
        assert!(encoded.len() > 44);
        assert_eq!(decode(&encoded).unwrap(), bytes.to_vec());
    }

    #[test]
    fn test_alphabet_table() {
        assert_eq!(digit_value('1'), Some(0));
        assert_eq!(digit_value('z'), Some(57));
        assert_eq!(digit_value('0'), None);
        assert!(is_base58_byte(b'k'));
        assert!(!is_base58_byte(b'l'));
        assert!(!is_base58_byte(0xc3));
    }
}
