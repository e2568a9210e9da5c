//! A pseudorandom generator built from AES-128 in counter mode.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

/// The fixed nonce occupying the high half of every counter block.
const PRG_NONCE: u64 = 0x9a3c_77e1_52b4_08fd;

const INITIAL_COUNTER: u64 = 0;
const BLOCK_SIZE: usize = 16;

/// A deterministic pseudorandom generator.
///
/// The stream is AES-128-CTR: block `i` of output is the encryption of the
/// 128-bit value `(nonce || initial_counter + i)` under the seed. Two
/// generators created from the same seed produce the same stream, which is
/// what the secret sharing tests and any party wanting reproducible
/// randomness rely on.
///
/// The seed is wiped from memory when the generator is dropped. `Prg` also
/// implements [`rand::RngCore`], so it plugs into anything written against
/// the rand traits.
pub struct Prg {
    seed: [u8; Prg::SEED_SIZE],
    cipher: Aes128,
    counter: u64,
}

impl Prg {
    /// Number of bytes of a seed.
    pub const SEED_SIZE: usize = 16;

    /// A generator with a fresh random seed from the operating system.
    pub fn new() -> Self {
        let mut seed = [0u8; Self::SEED_SIZE];
        OsRng.fill_bytes(&mut seed);
        Self::from_seed(&seed)
    }

    /// A generator with the given seed.
    ///
    /// Seeds longer than [`Prg::SEED_SIZE`] are truncated, shorter ones
    /// zero-padded.
    pub fn from_seed(seed: &[u8]) -> Self {
        let mut s = [0u8; Self::SEED_SIZE];
        let n = seed.len().min(Self::SEED_SIZE);
        s[..n].copy_from_slice(&seed[..n]);
        let cipher = Aes128::new(GenericArray::from_slice(&s));
        Self {
            seed: s,
            cipher,
            counter: INITIAL_COUNTER,
        }
    }

    /// The seed this generator was created from.
    pub fn seed(&self) -> &[u8] {
        &self.seed
    }

    /// Rewinds the stream to its beginning.
    pub fn reset(&mut self) {
        self.counter = INITIAL_COUNTER;
    }

    /// Fills `buf` with the next bytes of the stream.
    ///
    /// Always consumes whole blocks: asking for 1 byte advances the
    /// counter by one block.
    pub fn next(&mut self, buf: &mut [u8]) {
        let mut offset = 0;
        while offset < buf.len() {
            let mut block = [0u8; BLOCK_SIZE];
            block[..8].copy_from_slice(&self.counter.to_le_bytes());
            block[8..].copy_from_slice(&PRG_NONCE.to_le_bytes());
            self.counter += 1;

            let ga = GenericArray::from_mut_slice(&mut block);
            self.cipher.encrypt_block(ga);

            let n = BLOCK_SIZE.min(buf.len() - offset);
            buf[offset..offset + n].copy_from_slice(&block[..n]);
            offset += n;
        }
    }
}

impl Default for Prg {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Prg {
    fn drop(&mut self) {
        self.seed.zeroize();
    }
}

impl RngCore for Prg {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.next(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.next(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.next(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.next(dest);
        Ok(())
    }
}
