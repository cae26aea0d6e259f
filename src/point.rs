//! Minimal secp256k1 point operations used by key tweaking
//!
//! Thin layer over the `secp256k1` crate: lift an x coordinate to the
//! even-y point, add points, multiply by scalars, and read parity.
//! Every operation is total except `lift_x`, which rejects x values that
//! are not on the curve.

use crate::error::{Result, TaprootError};
use crate::types::{Hash, Parity, XOnlyKeyBytes};
use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey, XOnlyPublicKey};

/// Compressed encoding of the secp256k1 generator point G
const GENERATOR_BYTES: [u8; 33] = [
    0x02, 0x79, 0xbe, 0x66, 0x7e, 0xf9, 0xdc, 0xbb, 0xac, 0x55, 0xa0, 0x62, 0x95, 0xce, 0x87,
    0x0b, 0x07, 0x02, 0x9b, 0xfc, 0xdb, 0x2d, 0xce, 0x28, 0xd9, 0x59, 0xf2, 0x81, 0x5b, 0x16,
    0xf8, 0x17, 0x98,
];

/// The curve generator G
pub fn generator() -> PublicKey {
    // The constant is a valid point, parsing cannot fail
    PublicKey::from_slice(&GENERATOR_BYTES).expect("generator constant is a valid point")
}

/// Lift a 32-byte x coordinate to the curve point with even y (BIP340)
///
/// Fails with `InvalidPoint` if `x³ + 7` is not a quadratic residue mod p,
/// i.e. no curve point has this x coordinate.
pub fn lift_x(x: &Hash) -> Result<PublicKey> {
    let xonly = XOnlyPublicKey::from_slice(x).map_err(|_| TaprootError::InvalidPoint)?;
    Ok(PublicKey::from_x_only_public_key(xonly, Parity::Even))
}

/// Point addition: `P + Q`
///
/// Fails with `InvalidPoint` if the result is the point at infinity
/// (only possible for `Q = -P`).
pub fn point_add(p: &PublicKey, q: &PublicKey) -> Result<PublicKey> {
    p.combine(q).map_err(|_| TaprootError::InvalidPoint)
}

/// Scalar multiplication: `k·P`
pub fn scalar_mul(k: &Scalar, p: &PublicKey) -> Result<PublicKey> {
    let secp = Secp256k1::new();
    p.mul_tweak(&secp, k).map_err(|_| TaprootError::InvalidPoint)
}

/// Scalar-times-generator: `k·G`
///
/// Fails with `InvalidPoint` for `k = 0` (the result would be infinity).
pub fn scalar_base_mul(k: &Scalar) -> Result<PublicKey> {
    let secp = Secp256k1::new();
    let sk = SecretKey::from_slice(&k.to_be_bytes()).map_err(|_| TaprootError::InvalidPoint)?;
    Ok(sk.public_key(&secp))
}

/// Point negation: `-P`
pub fn negate(p: &PublicKey) -> PublicKey {
    let secp = Secp256k1::new();
    p.negate(&secp)
}

/// True iff the point's y coordinate is even
pub fn is_even(p: &PublicKey) -> bool {
    let (_, parity) = p.x_only_public_key();
    parity == Parity::Even
}

/// Drop a point to its x-only form, returning the discarded parity
pub fn x_only(p: &PublicKey) -> (XOnlyKeyBytes, Parity) {
    let (xonly, parity) = p.x_only_public_key();
    (xonly.serialize(), parity)
}
