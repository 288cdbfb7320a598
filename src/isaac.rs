use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

// log2 of the pool size, the indexing arithmetic below depends on it
const SIZE_LOG: usize = 8;
// number of words in the pool and in one result block
const SIZE: usize = 1 << SIZE_LOG;
// the golden ratio, starting value for the mixing scalars
const RATIO: u32 = 0x9e3779b9;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
	#[error("seed has {len} words, the pool only holds {SIZE}")]
	TooLong { len: usize },
}

/// The ISAAC pseudorandom generator, used as a keystream for obfuscating
/// integer fields in the game protocol. Both endpoints construct one from the
/// shared session seed and draw values in lockstep, so any deviation in the
/// mixing arithmetic desynchronizes the connection.
#[derive(Clone)]
pub struct Isaac {
	// the internal entropy pool, doubles as the indirection lookup table
	mem: [u32; SIZE],
	// the most recently generated block of results
	rsl: [u32; SIZE],
	a: u32,
	b: u32,
	c: u32,
	// how many words of rsl are still unconsumed
	count: usize,
}

impl Isaac {
	/// Creates a generator with the full two-pass seeding. This is the variant
	/// the session path uses.
	///
	/// The seed is at most 256 words, the rest of the pool is zero-filled.
	/// Longer seeds are rejected rather than truncated, a truncated seed would
	/// silently produce a keystream the peer does not expect.
	pub fn new(seed: &[u32]) -> Result<Self, SeedError> {
		if seed.len() > SIZE {
			return Err(SeedError::TooLong { len: seed.len() });
		}

		let mut isaac = Self::empty();
		isaac.rsl[..seed.len()].copy_from_slice(seed);
		isaac.init(true);

		// seed words themselves are key material, only log the length
		debug!(seed_words = seed.len(), "isaac generator seeded");

		Ok(isaac)
	}

	/// Creates a generator with the faster single-pass mixing and no seed.
	/// Its output only depends on the algorithm constants, so it is only good
	/// for auxiliary state construction, never for the session path.
	pub fn new_unseeded() -> Self {
		let mut isaac = Self::empty();
		isaac.init(false);

		debug!("unseeded isaac generator initialized");

		isaac
	}

	fn empty() -> Self {
		Self {
			mem: [0; SIZE],
			rsl: [0; SIZE],
			a: 0,
			b: 0,
			c: 0,
			count: 0,
		}
	}

	/// Draws the next 32-bit value of the keystream.
	///
	/// Values are consumed from the end of the current block backward, after
	/// 256 draws a fresh block is generated in place.
	pub fn next_value(&mut self) -> u32 {
		if self.count == 0 {
			self.regenerate();
		}
		self.count -= 1;

		self.rsl[self.count]
	}

	fn init(&mut self, seeded: bool) {
		let mut s = [RATIO; 8];
		for _ in 0..4 {
			mix(&mut s);
		}

		for i in (0..SIZE).step_by(8) {
			// the seeded variant folds the seed block into the scalars
			if seeded {
				for k in 0..8 {
					s[k] = s[k].wrapping_add(self.rsl[i + k]);
				}
			}
			mix(&mut s);
			self.mem[i..i + 8].copy_from_slice(&s);
		}

		if seeded {
			// second sweep, folds the half-mixed pool back into itself
			for i in (0..SIZE).step_by(8) {
				for k in 0..8 {
					s[k] = s[k].wrapping_add(self.mem[i + k]);
				}
				mix(&mut s);
				self.mem[i..i + 8].copy_from_slice(&s);
			}
		}

		self.regenerate();
	}

	// Refills rsl with 256 fresh values and advances a/b/c, leaving mem
	// scrambled for the next round. The shift amounts, their rotation order
	// and the double indirection through mem are all load-bearing, as is the
	// wrapping arithmetic.
	fn regenerate(&mut self) {
		trace!("regenerating result block");

		self.c = self.c.wrapping_add(1);
		let mut a = self.a;
		let mut b = self.b.wrapping_add(self.c);

		for i in 0..SIZE {
			let x = self.mem[i];

			// one of 4 bit operations, fixed by slot position
			a = match i & 3 {
				0 => a ^ (a << 13),
				1 => a ^ (a >> 6),
				2 => a ^ (a << 2),
				_ => a ^ (a >> 16),
			};
			// partner slot from the opposite half of the pool
			a = a.wrapping_add(self.mem[(i + SIZE / 2) & (SIZE - 1)]);

			let y = self.mem[(x as usize >> 2) & (SIZE - 1)]
				.wrapping_add(a)
				.wrapping_add(b);
			self.mem[i] = y;

			b = self.mem[(y as usize >> (SIZE_LOG + 2)) & (SIZE - 1)].wrapping_add(x);
			self.rsl[i] = b;
		}

		self.a = a;
		self.b = b;
		self.count = SIZE;
	}
}

// keystream state must not end up in logs
impl fmt::Debug for Isaac {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Isaac")
			.field("count", &self.count)
			.finish_non_exhaustive()
	}
}

// One application of the shift/xor/add mixing step to the 8 working scalars.
#[rustfmt::skip]
fn mix(s: &mut [u32; 8]) {
	let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *s;

	a ^= b << 11;  d = d.wrapping_add(a); b = b.wrapping_add(c);
	b ^= c >> 2;   e = e.wrapping_add(b); c = c.wrapping_add(d);
	c ^= d << 8;   f = f.wrapping_add(c); d = d.wrapping_add(e);
	d ^= e >> 16;  g = g.wrapping_add(d); e = e.wrapping_add(f);
	e ^= f << 10;  h = h.wrapping_add(e); f = f.wrapping_add(g);
	f ^= g >> 4;   a = a.wrapping_add(f); g = g.wrapping_add(h);
	g ^= h << 8;   b = b.wrapping_add(g); h = h.wrapping_add(a);
	h ^= a >> 9;   c = c.wrapping_add(h); a = a.wrapping_add(b);

	*s = [a, b, c, d, e, f, g, h];
}
