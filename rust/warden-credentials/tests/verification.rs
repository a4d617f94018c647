//! Tamper-resistance of offline verification.

use pretty_assertions::assert_eq;
use testresult::TestResult;
use warden_common::Keccak256Hash;
use warden_credentials::{AddressVerifier, RecoverableSignature, Secp256k1Signer};

type Signed = (Secp256k1Signer, Keccak256Hash, RecoverableSignature);

fn signed(message: &[u8]) -> Result<Signed, Box<dyn std::error::Error>> {
    let signer = Secp256k1Signer::import(&[0x11; 32])?;
    let digest = Keccak256Hash::hash(message);
    let signature = signer.sign_prehash(&digest)?;
    Ok((signer, digest, signature))
}

#[test]
fn it_accepts_an_untouched_signature() -> TestResult {
    let (signer, digest, signature) = signed(b"hello world")?;
    let verifier = AddressVerifier::new(signer.address());
    assert_eq!(verifier.verify(&digest, &signature)?, signer.address());
    Ok(())
}

#[test]
fn it_rejects_any_single_bit_flip_in_s() -> TestResult {
    let (signer, digest, signature) = signed(b"hello world")?;
    let verifier = AddressVerifier::new(signer.address());

    for byte in 0..32 {
        for bit in 0..8 {
            let mut tampered = signature;
            tampered.s[byte] ^= 1 << bit;
            assert!(
                verifier.verify(&digest, &tampered).is_err(),
                "flipping bit {bit} of s[{byte}] must not verify"
            );
        }
    }
    Ok(())
}

#[test]
fn it_rejects_a_signature_over_a_different_digest() -> TestResult {
    let (signer, _, signature) = signed(b"hello world")?;
    let verifier = AddressVerifier::new(signer.address());
    let other = Keccak256Hash::hash(b"hello worle");
    assert!(verifier.verify(&other, &signature).is_err());
    Ok(())
}
