//! Byte-accurate, type-directed serialization.
//!
//! Every wire-visible type implements [`Serializable`]: it knows its
//! encoded size, writes itself into a byte buffer and reads itself back
//! out, reporting how many bytes it consumed. Variable-length containers
//! carry a 4-byte little-endian length prefix. The encoding of a value is
//! a bijection: `read_from` after `write_into` yields the value back, and
//! re-encoding reproduces the exact bytes.

use digest::Digest;

use crate::algebra::{
    Array, EcPoint, Matrix, Mersenne127, Mersenne61, Ring, Secp256k1Field, Secp256k1Scalar,
    Vector, Z2k,
};
use crate::util::{Bitmap, MerkleProof};
use crate::{Error, Result};

mod packet;

pub use packet::Packet;

/// The integer type used for length prefixes.
pub type SizeType = u32;

/// Number of bytes of a length prefix.
pub const SIZE_PREFIX_BYTES: usize = std::mem::size_of::<SizeType>();

/// A type with a byte-accurate wire encoding.
pub trait Serializable: Sized {
    /// Number of bytes `write_into` will produce for this value.
    fn size_of(&self) -> usize;

    /// Encodes the value into the front of `buf`, returning the number of
    /// bytes written. The buffer must hold at least [`Serializable::size_of`]
    /// bytes.
    fn write_into(&self, buf: &mut [u8]) -> usize;

    /// Decodes a value from the front of `buf`, returning it along with
    /// the number of bytes consumed.
    ///
    /// Fails with [`Error::Malformed`] on truncated input or impossible
    /// length prefixes.
    fn read_from(buf: &[u8]) -> Result<(Self, usize)>;
}

macro_rules! impl_serializable_int {
    ($($t:ty),*) => {
        $(
            impl Serializable for $t {
                fn size_of(&self) -> usize {
                    std::mem::size_of::<$t>()
                }

                fn write_into(&self, buf: &mut [u8]) -> usize {
                    let bytes = self.to_le_bytes();
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    bytes.len()
                }

                fn read_from(buf: &[u8]) -> Result<(Self, usize)> {
                    const N: usize = std::mem::size_of::<$t>();
                    if buf.len() < N {
                        return Err(Error::Malformed("truncated integer"));
                    }
                    let mut bytes = [0u8; N];
                    bytes.copy_from_slice(&buf[..N]);
                    Ok((<$t>::from_le_bytes(bytes), N))
                }
            }
        )*
    };
}

impl_serializable_int!(u8, u16, u32, u64, i8, i16, i32, i64);

impl Serializable for bool {
    fn size_of(&self) -> usize {
        1
    }

    fn write_into(&self, buf: &mut [u8]) -> usize {
        buf[0] = *self as u8;
        1
    }

    fn read_from(buf: &[u8]) -> Result<(Self, usize)> {
        if buf.is_empty() {
            return Err(Error::Malformed("truncated bool"));
        }
        Ok((buf[0] != 0, 1))
    }
}

fn write_length_prefix(len: usize, buf: &mut [u8]) -> usize {
    (len as SizeType).write_into(buf)
}

fn read_length_prefix(buf: &[u8]) -> Result<(usize, usize)> {
    let (len, consumed) = SizeType::read_from(buf)?;
    let len = len as usize;
    // each encoded element takes at least one byte, so a prefix larger
    // than the rest of the buffer cannot be honest.
    if len > buf.len() - consumed {
        return Err(Error::Malformed("impossible length prefix"));
    }
    Ok((len, consumed))
}

impl<T: Serializable> Serializable for Vec<T> {
    fn size_of(&self) -> usize {
        SIZE_PREFIX_BYTES + self.iter().map(Serializable::size_of).sum::<usize>()
    }

    fn write_into(&self, buf: &mut [u8]) -> usize {
        let mut offset = write_length_prefix(self.len(), buf);
        for v in self {
            offset += v.write_into(&mut buf[offset..]);
        }
        offset
    }

    fn read_from(buf: &[u8]) -> Result<(Self, usize)> {
        let (len, mut offset) = read_length_prefix(buf)?;
        let mut vec = Vec::with_capacity(len);
        for _ in 0..len {
            let (v, consumed) = T::read_from(&buf[offset..])?;
            vec.push(v);
            offset += consumed;
        }
        Ok((vec, offset))
    }
}

impl<T: Serializable> Serializable for Vector<T> {
    fn size_of(&self) -> usize {
        SIZE_PREFIX_BYTES + self.iter().map(Serializable::size_of).sum::<usize>()
    }

    fn write_into(&self, buf: &mut [u8]) -> usize {
        let mut offset = write_length_prefix(self.len(), buf);
        for v in self {
            offset += v.write_into(&mut buf[offset..]);
        }
        offset
    }

    fn read_from(buf: &[u8]) -> Result<(Self, usize)> {
        let (vec, consumed) = Vec::<T>::read_from(buf)?;
        Ok((Vector::from(vec), consumed))
    }
}

/// Fixed-size encodings for ring elements go through the ring's byte IO.
macro_rules! impl_serializable_ring {
    ($($t:ty),*) => {
        $(
            impl Serializable for $t {
                fn size_of(&self) -> usize {
                    <$t as Ring>::BYTE_SIZE
                }

                fn write_into(&self, buf: &mut [u8]) -> usize {
                    self.write_le(buf);
                    <$t as Ring>::BYTE_SIZE
                }

                fn read_from(buf: &[u8]) -> Result<(Self, usize)> {
                    if buf.len() < <$t as Ring>::BYTE_SIZE {
                        return Err(Error::Malformed("truncated ring element"));
                    }
                    Ok((<$t as Ring>::read_le(buf), <$t as Ring>::BYTE_SIZE))
                }
            }
        )*
    };
}

impl_serializable_ring!(Mersenne61, Mersenne127, Secp256k1Field, Secp256k1Scalar);

impl<const K: usize> Serializable for Z2k<K> {
    fn size_of(&self) -> usize {
        Self::BYTE_SIZE
    }

    fn write_into(&self, buf: &mut [u8]) -> usize {
        self.write_le(buf);
        Self::BYTE_SIZE
    }

    fn read_from(buf: &[u8]) -> Result<(Self, usize)> {
        if buf.len() < Self::BYTE_SIZE {
            return Err(Error::Malformed("truncated ring element"));
        }
        Ok((Self::read_le(buf), Self::BYTE_SIZE))
    }
}

impl<T: Ring, const N: usize> Serializable for Array<T, N> {
    fn size_of(&self) -> usize {
        Self::BYTE_SIZE
    }

    fn write_into(&self, buf: &mut [u8]) -> usize {
        self.write_le(buf);
        Self::BYTE_SIZE
    }

    fn read_from(buf: &[u8]) -> Result<(Self, usize)> {
        if buf.len() < Self::BYTE_SIZE {
            return Err(Error::Malformed("truncated array"));
        }
        Ok((Self::read_le(buf), Self::BYTE_SIZE))
    }
}

impl<T: Ring + Serializable> Serializable for Matrix<T> {
    fn size_of(&self) -> usize {
        let mut size = 2 * SIZE_PREFIX_BYTES;
        for i in 0..self.rows() {
            size += self.row(i).iter().map(Serializable::size_of).sum::<usize>();
        }
        size
    }

    fn write_into(&self, buf: &mut [u8]) -> usize {
        let mut offset = write_length_prefix(self.cols(), buf);
        offset += write_length_prefix(self.rows(), &mut buf[offset..]);
        for i in 0..self.rows() {
            for v in self.row(i) {
                offset += v.write_into(&mut buf[offset..]);
            }
        }
        offset
    }

    fn read_from(buf: &[u8]) -> Result<(Self, usize)> {
        let (cols, n0) = SizeType::read_from(buf)?;
        let (rows, n1) = SizeType::read_from(&buf[n0..])?;
        let (rows, cols) = (rows as usize, cols as usize);
        if rows == 0 || cols == 0 {
            return Err(Error::Malformed("matrix without dimensions"));
        }
        if rows.saturating_mul(cols) > buf.len() {
            return Err(Error::Malformed("impossible length prefix"));
        }

        let mut offset = n0 + n1;
        let mut values = Vec::with_capacity(rows * cols);
        for _ in 0..rows * cols {
            let (v, consumed) = T::read_from(&buf[offset..])?;
            values.push(v);
            offset += consumed;
        }
        let mat = Matrix::from_vector(rows, cols, Vector::from(values))
            .expect("element count matches the dimensions");
        Ok((mat, offset))
    }
}

impl Serializable for Bitmap {
    fn size_of(&self) -> usize {
        SIZE_PREFIX_BYTES + self.number_of_blocks()
    }

    fn write_into(&self, buf: &mut [u8]) -> usize {
        let mut offset = write_length_prefix(self.number_of_blocks(), buf);
        buf[offset..offset + self.number_of_blocks()].copy_from_slice(self.blocks());
        offset += self.number_of_blocks();
        offset
    }

    fn read_from(buf: &[u8]) -> Result<(Self, usize)> {
        let (len, offset) = read_length_prefix(buf)?;
        let blocks = buf[offset..offset + len].to_vec();
        Ok((Bitmap::from_blocks(blocks), offset + len))
    }
}

impl Serializable for EcPoint {
    fn size_of(&self) -> usize {
        EcPoint::COMPRESSED_BYTE_SIZE
    }

    fn write_into(&self, buf: &mut [u8]) -> usize {
        self.write(buf, true);
        EcPoint::COMPRESSED_BYTE_SIZE
    }

    fn read_from(buf: &[u8]) -> Result<(Self, usize)> {
        if buf.is_empty() {
            return Err(Error::Malformed("empty point encoding"));
        }
        // the flag byte decides how wide the frame is.
        let consumed = if buf[0] & 0x04 != 0 {
            EcPoint::FULL_BYTE_SIZE
        } else {
            EcPoint::COMPRESSED_BYTE_SIZE
        };
        if buf.len() < consumed {
            return Err(Error::Malformed("truncated point encoding"));
        }
        let point = EcPoint::read(buf)?;
        Ok((point, consumed))
    }
}

impl<D: Digest> Serializable for MerkleProof<D> {
    fn size_of(&self) -> usize {
        SIZE_PREFIX_BYTES
            + self.path.len() * <D as Digest>::output_size()
            + self.direction.size_of()
    }

    fn write_into(&self, buf: &mut [u8]) -> usize {
        let mut offset = write_length_prefix(self.path.len(), buf);
        for digest in &self.path {
            buf[offset..offset + digest.len()].copy_from_slice(digest);
            offset += digest.len();
        }
        offset + self.direction.write_into(&mut buf[offset..])
    }

    fn read_from(buf: &[u8]) -> Result<(Self, usize)> {
        let (len, mut offset) = read_length_prefix(buf)?;
        let digest_size = <D as Digest>::output_size();
        let mut path = Vec::with_capacity(len);
        for _ in 0..len {
            if buf.len() < offset + digest_size {
                return Err(Error::Malformed("truncated digest"));
            }
            path.push(digest::Output::<D>::clone_from_slice(
                &buf[offset..offset + digest_size],
            ));
            offset += digest_size;
        }
        let (direction, consumed) = Bitmap::read_from(&buf[offset..])?;
        Ok((
            Self { path, direction },
            offset + consumed,
        ))
    }
}

#[cfg(test)]
mod tests;
