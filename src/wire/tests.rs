use sha2::Sha256;

use super::*;
use crate::algebra::{Array, EcPoint, Matrix, Mersenne61, Ring, Secp256k1Scalar, Vector, Z2k};
use crate::util::{Bitmap, MerkleTree, Prg};

fn roundtrip<T: Serializable + PartialEq + std::fmt::Debug>(v: &T) {
    let mut buf = vec![0u8; v.size_of()];
    let written = v.write_into(&mut buf);
    assert_eq!(written, v.size_of());

    let (back, consumed) = T::read_from(&buf).unwrap();
    assert_eq!(&back, v);
    assert_eq!(consumed, written);

    // re-encoding reproduces the exact bytes.
    let mut buf2 = vec![0u8; back.size_of()];
    back.write_into(&mut buf2);
    assert_eq!(buf, buf2);
}

#[test]
fn integers() {
    roundtrip(&0x42u8);
    roundtrip(&0x4243u16);
    roundtrip(&0xdeadbeefu32);
    roundtrip(&0x0123456789abcdefu64);
    roundtrip(&-7i32);
    roundtrip(&-7i64);
    roundtrip(&true);

    assert_eq!(0u32.size_of(), 4);
    assert!(u32::read_from(&[1, 2]).is_err());
}

#[test]
fn byte_vectors() {
    let v: Vec<u8> = vec![1, 2, 3];
    assert_eq!(v.size_of(), 4 + 3);
    roundtrip(&v);
    roundtrip(&Vec::<u8>::new());

    let mut buf = vec![0u8; v.size_of()];
    v.write_into(&mut buf);
    // 4-byte little-endian length prefix, then the payload.
    assert_eq!(buf, [3, 0, 0, 0, 1, 2, 3]);
}

#[test]
fn nested_vectors() {
    let v: Vec<Vec<u8>> = vec![vec![1], vec![2, 3]];
    roundtrip(&v);
}

#[test]
fn impossible_length_prefix() {
    // claims 1000 elements but carries none.
    let buf = [0xe8, 0x03, 0, 0];
    assert!(Vec::<u8>::read_from(&buf).is_err());
}

#[test]
fn field_elements() {
    let mut prg = Prg::from_seed(b"wire");
    roundtrip(&Mersenne61::random(&mut prg));
    roundtrip(&Secp256k1Scalar::random(&mut prg));
    roundtrip(&Z2k::<20>::random(&mut prg));
    roundtrip(&Array::<Mersenne61, 2>::random(&mut prg));
}

#[test]
fn vectors_and_matrices() {
    let mut prg = Prg::from_seed(b"wire2");
    roundtrip(&Vector::<Mersenne61>::random(5, &mut prg));
    roundtrip(&Matrix::<Mersenne61>::random(3, 4, &mut prg));
}

#[test]
fn curve_points() {
    roundtrip(&EcPoint::generator());
    roundtrip(&EcPoint::infinity());
    roundtrip(&EcPoint::generator().double());
}

#[test]
fn bitmaps() {
    roundtrip(&Bitmap::from_bools(&[true, false, true, true]));
    roundtrip(&Bitmap::new(0));
}

#[test]
fn merkle_proofs() {
    let data = ["a", "b", "c", "d"];
    let proof = MerkleTree::<Sha256, _>::prove(&data, 2);
    roundtrip(&proof);
}

#[test]
fn packet_write_read() {
    let mut packet = Packet::new();
    packet.write(&1i32);
    packet.write(&2i32);
    packet.write(&3i32);
    assert_eq!(packet.size(), 12);
    assert_eq!(packet.remaining(), 12);

    assert_eq!(packet.read::<i32>().unwrap(), 1);
    assert_eq!(packet.read::<i32>().unwrap(), 2);
    assert_eq!(packet.remaining(), 4);
    assert_eq!(packet.read::<i32>().unwrap(), 3);
    assert_eq!(packet.remaining(), 0);

    // reading past the write cursor fails.
    assert!(packet.read::<i32>().is_err());
}

#[test]
fn packet_cursors() {
    let mut packet = Packet::new();
    packet.write(&7u64);
    packet.read::<u64>().unwrap();

    packet.reset_read_ptr();
    assert_eq!(packet.read::<u64>().unwrap(), 7);

    // rewinding the write cursor clamps the read cursor.
    packet.reset_write_ptr();
    assert_eq!(packet.size(), 0);
    assert_eq!(packet.remaining(), 0);
    assert!(packet.read::<u64>().is_err());
}

#[test]
fn packet_grows() {
    let mut packet = Packet::with_capacity(4);
    for i in 0..100u32 {
        packet.write(&i);
    }
    assert_eq!(packet.size(), 400);
    for i in 0..100u32 {
        assert_eq!(packet.read::<u32>().unwrap(), i);
    }
}

#[test]
fn packet_equality() {
    let mut a = Packet::new();
    let mut b = Packet::with_capacity(1);
    a.write(&1u32);
    b.write(&1u32);
    assert_eq!(a, b);

    b.write(&2u32);
    assert_ne!(a, b);

    // only bytes up to the write cursor count.
    b.set_write_ptr(4);
    assert_eq!(a, b);
}

#[test]
fn packet_of_mixed_types() {
    let mut prg = Prg::from_seed(b"mixed");
    let x = Mersenne61::random(&mut prg);
    let v = Vector::<Mersenne61>::random(3, &mut prg);
    let p = EcPoint::generator();

    let mut packet = Packet::new();
    packet.write(&x);
    packet.write(&v);
    packet.write(&p);

    assert_eq!(packet.read::<Mersenne61>().unwrap(), x);
    assert_eq!(packet.read::<Vector<Mersenne61>>().unwrap(), v);
    assert_eq!(packet.read::<EcPoint>().unwrap(), p);
}

#[test]
fn packet_as_payload() {
    let mut inner = Packet::new();
    inner.write(&1u32);
    inner.write(&2u32);

    let mut outer = Packet::new();
    outer.write(&inner);
    assert_eq!(outer.size(), 4 + 8);

    let mut back = outer.read::<Packet>().unwrap();
    assert_eq!(back, inner);
    assert_eq!(back.read::<u32>().unwrap(), 1);

    // raw append, by contrast, carries no prefix.
    let mut raw = Packet::new();
    raw.write_packet(&inner);
    assert_eq!(raw.size(), 8);
    assert_eq!(raw.read::<u32>().unwrap(), 1);
}
