use super::*;
use crate::algebra::{Field, Number, NumberBase, Ring};
use crate::util::Prg;

type F = Secp256k1Field;
type S = Secp256k1Scalar;

fn field_axioms<T: Field>(prg: &mut Prg) {
    for _ in 0..25 {
        let a = T::random(prg);
        let b = T::random(prg);
        assert_eq!(a + b, b + a);
        assert_eq!(a * b, b * a);
        assert_eq!(a * T::one(), a);
        assert_eq!(a + T::zero(), a);
        assert_eq!(a + (-a), T::zero());
        if a != T::zero() {
            assert_eq!(a * a.invert().unwrap(), T::one());
        }

        let mut buf = [0u8; 32];
        a.write_le(&mut buf);
        assert_eq!(T::read_le(&buf), a);
    }
}

#[test]
fn base_field_axioms() {
    let mut prg = Prg::from_seed(b"secp-field");
    field_axioms::<F>(&mut prg);
}

#[test]
fn scalar_field_axioms() {
    let mut prg = Prg::from_seed(b"secp-scalar");
    field_axioms::<S>(&mut prg);
}

#[test]
fn field_zero_has_no_inverse() {
    assert!(F::zero().invert().is_err());
    assert!(S::zero().invert().is_err());
}

#[test]
fn field_string_roundtrip() {
    let mut prg = Prg::from_seed(b"secp-string");
    for _ in 0..10 {
        let a = F::random(&mut prg);
        let s = a.to_string();
        assert_eq!(F::from_string(&s).unwrap(), a);
    }
}

#[test]
fn field_known_values() {
    // p - 1 printed as reduced hex.
    let m1 = -F::one();
    assert_eq!(
        m1.to_string(),
        "fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2e"
    );
    assert_eq!(F::zero().to_string(), "0");
    assert_eq!(F::from_int(255).to_string(), "ff");
}

#[test]
fn generator_is_on_curve() {
    let g = EcPoint::generator();
    let (x, y) = g.to_affine().unwrap();
    assert_eq!(EcPoint::from_affine(x, y).unwrap(), g);
}

#[test]
fn from_affine_rejects_bad_points() {
    let r = EcPoint::from_affine(F::from_int(1), F::from_int(1));
    assert_eq!(r.unwrap_err(), crate::Error::NotOnCurve);
}

#[test]
fn group_laws() {
    let g = EcPoint::generator();
    let inf = EcPoint::infinity();

    assert_eq!(g + (-g), inf);
    assert_eq!(g + inf, g);
    assert_eq!(inf + g, g);
    assert_eq!(inf + inf, inf);
    assert_eq!(g + g, g.double());
    assert_eq!(-inf, inf);
}

#[test]
fn doubling_matches_known_vector() {
    let two_g = EcPoint::generator().double();
    let x = F::from_string("c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5")
        .unwrap();
    let y = F::from_string("1ae168fea63dc339a3c58419466ceaeef7f632653266d0e1236431a950cfe52a")
        .unwrap();
    assert_eq!(two_g, EcPoint::from_affine(x, y).unwrap());
}

#[test]
fn scalar_multiplication() {
    let g = EcPoint::generator();

    assert_eq!(S::zero() * g, EcPoint::infinity());
    assert_eq!(S::one() * g, g);
    assert_eq!(S::from_int(2) * g, g.double());
    assert_eq!(S::from_int(5) * g, g + g + g + g + g);

    // NAF actually exercises subtraction for scalars with 3 mod 4 digits.
    assert_eq!(S::from_int(7) * g, g + g + g + g + g + g + g);

    // scalar times infinity stays infinity.
    assert_eq!(S::from_int(123) * EcPoint::infinity(), EcPoint::infinity());
}

#[test]
fn scalar_mul_distributes() {
    let mut prg = Prg::from_seed(b"distribute");
    let g = EcPoint::generator();
    for _ in 0..5 {
        let n = S::random(&mut prg);
        let m = S::random(&mut prg);
        assert_eq!((n + m) * g, n * g + m * g);
    }
}

#[test]
fn number_scalar_mul_matches_field_scalar_mul() {
    let g = EcPoint::generator();
    let k = Number::from_int(71);
    assert_eq!(g.mul_number(&k), S::from_int(71) * g);
    assert_eq!(EcPoint::infinity().mul_number(&k), EcPoint::infinity());
}

#[test]
fn serialize_compressed_roundtrip() {
    let g = EcPoint::generator();
    let mut buf = [0u8; EcPoint::COMPRESSED_BYTE_SIZE];
    g.write(&mut buf, true);

    // flag byte plus the little-endian x coordinate.
    let (x, _) = g.to_affine().unwrap();
    let mut x_bytes = [0u8; 32];
    x.write_le(&mut x_bytes);
    assert_eq!(&buf[1..], &x_bytes);
    assert_eq!(buf[0] & 0x04, 0);

    assert_eq!(EcPoint::read(&buf).unwrap(), g);
}

#[test]
fn serialize_full_roundtrip() {
    let p = EcPoint::generator().double();
    let mut buf = [0u8; EcPoint::FULL_BYTE_SIZE];
    p.write(&mut buf, false);
    assert_eq!(buf[0], 0x04);
    assert_eq!(EcPoint::read(&buf).unwrap(), p);
}

#[test]
fn serialize_negated_points() {
    // y and -y land on the two sides of the select-smaller flag.
    let p = EcPoint::generator();
    let q = -p;
    let mut bp = [0u8; EcPoint::COMPRESSED_BYTE_SIZE];
    let mut bq = [0u8; EcPoint::COMPRESSED_BYTE_SIZE];
    p.write(&mut bp, true);
    q.write(&mut bq, true);
    assert_eq!(&bp[1..], &bq[1..]);
    assert_ne!(bp[0] & 0x01, bq[0] & 0x01);
    assert_eq!(EcPoint::read(&bp).unwrap(), p);
    assert_eq!(EcPoint::read(&bq).unwrap(), q);
}

#[test]
fn serialize_infinity() {
    let inf = EcPoint::infinity();
    let mut buf = [0u8; EcPoint::COMPRESSED_BYTE_SIZE];
    inf.write(&mut buf, true);
    assert_eq!(buf[0] & 0x02, 0x02);
    assert!(buf[1..].iter().all(|&b| b == 0));

    // the infinity flag wins and trailing bytes are tolerated.
    assert_eq!(EcPoint::read(&[0x02]).unwrap(), inf);
    assert_eq!(EcPoint::read(&buf).unwrap(), inf);
}

#[test]
fn display_forms() {
    assert_eq!(EcPoint::infinity().to_string(), "EC{POINT_AT_INFINITY}");
    let g = EcPoint::generator();
    assert!(g.to_string().starts_with("EC{79be667e"));
}

#[test]
fn hex_parse_respects_size() {
    assert!(F::from_string_base(&"f".repeat(65), NumberBase::Hex).is_err());
}
