//! Address normalization.

use alloy_primitives::Address;

/// Parses an any-case hex address and re-encodes it in EIP-55 form.
///
/// Mixed-case inputs are not required to carry a valid checksum; only inputs
/// that fail to parse as a 20-byte hex address are rejected.
pub fn checksum_address(address: &str) -> Option<String> {
    address.parse::<Address>().ok().map(|parsed| parsed.to_checksum(None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recases_known_vectors() {
        assert_eq!(
            checksum_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").as_deref(),
            Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"),
        );
        assert_eq!(
            checksum_address("0xFB6916095CA1DF60BB79CE92CE3EA74C37C5D359").as_deref(),
            Some("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"),
        );
    }

    #[test]
    fn mixed_case_input_is_accepted_and_recased() {
        // wrong checksum in, correct checksum out
        assert_eq!(
            checksum_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1BEAED").as_deref(),
            Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"),
        );
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        assert!(checksum_address("0x123").is_none());
        assert!(checksum_address("not-an-address").is_none());
        assert!(checksum_address("").is_none());
    }
}
