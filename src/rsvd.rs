// Randomized singular value decomposition (RSVD)

use log::debug;
use ndarray::{s, Array1, Array2};
use ndarray_rand::RandomExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::Uniform;

use crate::linalg_backends::{BackendQR, BackendSVD, NdarrayLinAlgBackend, ThinSvdOutput};

const MIN_RANK: usize = 1;

/// Randomized singular value decomposition (RSVD) of a dense matrix.
///
/// The factorization approximates the top `rank` singular triplets of an
/// `m × n` matrix by sketching its column space with a random projection,
/// orthonormalizing the sketch, and running an exact thin SVD on the much
/// smaller projected matrix. It trades exactness for speed: the approximation
/// improves as `rank` approaches `min(m, n)`, and is exact (up to rounding)
/// when the input's numerical rank is at most `rank`.
///
/// A `Rsvd` value is reusable: each call to [`factorize`](Rsvd::factorize)
/// fully replaces the stored factorization. Accessors read the committed
/// state and panic if no successful factorization is present.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use rsvd::Rsvd;
///
/// // Rank-2 matrix: the third column is the sum of the first two.
/// let a = array![
///     [1.0, 0.0, 1.0],
///     [0.0, 2.0, 2.0],
///     [1.0, 0.0, 1.0],
///     [0.0, 2.0, 2.0],
/// ];
///
/// let mut rsvd = Rsvd::with_seed(42);
/// assert!(rsvd.factorize(&a, 2));
/// assert_eq!(rsvd.values().len(), 2);
/// ```
pub struct Rsvd {
    backend: NdarrayLinAlgBackend,
    rng: ChaCha8Rng,
    state: Option<Factorization>,
}

/// State committed by a `factorize` call. `reduced` is present only when the
/// thin SVD of the projected matrix succeeded.
struct Factorization {
    rank: usize,
    m: usize,
    n: usize,
    q: Array2<f64>,
    reduced: Option<ThinSvdOutput>,
}

impl Default for Rsvd {
    fn default() -> Self {
        Self::new()
    }
}

impl Rsvd {
    /// Creates an unfactorized `Rsvd` whose random projector is seeded from
    /// the operating system's entropy source.
    pub fn new() -> Self {
        Self::from_rng(ChaCha8Rng::from_entropy())
    }

    /// Creates an unfactorized `Rsvd` with a fixed random seed.
    ///
    /// Two instances built from the same seed produce bit-identical
    /// factorizations for the same inputs.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(rng: ChaCha8Rng) -> Self {
        Self {
            backend: NdarrayLinAlgBackend,
            rng,
            state: None,
        }
    }

    /// Computes the randomized singular value decomposition of `a`,
    /// approximating its top `rank` singular triplets.
    ///
    /// Returns whether the decomposition succeeded; routines that require a
    /// successful factorization will panic if it did not. Any previously
    /// stored factorization is replaced, on failure as well as on success.
    ///
    /// No upper bound is enforced on `rank`: values at or beyond
    /// `min(m, n)` are accepted but yield no computational benefit and may
    /// expose degeneracies in the reduced SVD step.
    ///
    /// # Panics
    ///
    /// Panics if `rank` is less than 1, before any stored state is touched —
    /// a prior successful factorization stays readable after the abort.
    pub fn factorize(&mut self, a: &Array2<f64>, rank: usize) -> bool {
        if rank < MIN_RANK {
            panic!("rank {} must be at least {}", rank, MIN_RANK);
        }

        // Dimensions of input matrix:
        // [A] = m × n
        let (m, n) = a.dim();
        debug!("factorizing {}x{} matrix at target rank {}", m, n, rank);

        // Random projector, i.i.d. uniform over [0, 1):
        // [P] = n × rank
        let p = Array2::random_using((n, rank), Uniform::new(0.0, 1.0), &mut self.rng);

        // Sketch of A's column space:
        // [Z] = [A · P] = (m × n) · (n × rank) = m × rank
        let z = a.dot(&p);

        // Orthonormal basis for the sketch: the orthogonal factor of Z's QR
        // decomposition, truncated to its leading `rank` columns.
        // [Q] = m × rank
        let q = match self.backend.qr_q_factor(&z) {
            Ok(q_full) => q_full.slice_move(s![.., ..rank]),
            Err(err) => {
                debug!("QR factorization of the sketch failed: {}", err);
                self.state = None;
                return false;
            }
        };

        // Project A into the basis:
        // [Y] = [Qᵀ · A] = (rank × m) · (m × n) = rank × n
        let y = q.t().dot(a);

        // Exact thin SVD of the reduced matrix:
        // [Y] = [Uy · Σ · Vyᵀ] = (rank × rank) · (rank × rank) · (rank × n)
        let reduced = match self.backend.thin_svd(&y) {
            Ok(out) => Some(out),
            Err(err) => {
                debug!("thin SVD of the reduced matrix failed: {}", err);
                None
            }
        };

        let succeeded = reduced.is_some();
        self.state = Some(Factorization {
            rank,
            m,
            n,
            q,
            reduced,
        });
        succeeded
    }

    /// Returns the singular values of the factorized matrix in descending
    /// order.
    ///
    /// # Panics
    ///
    /// Panics if the receiver does not contain a successful factorization.
    pub fn values(&self) -> Array1<f64> {
        let (_, reduced) = self.committed();
        reduced.s.clone()
    }

    /// Stores the singular values of the factorized matrix into `dst` in
    /// descending order. An empty `dst` is resized to the reduced problem's
    /// dimension.
    ///
    /// # Panics
    ///
    /// Panics if a non-empty `dst` does not have exactly one slot per
    /// singular value, or if the receiver does not contain a successful
    /// factorization.
    pub fn values_into(&self, dst: &mut Array1<f64>) {
        let (_, reduced) = self.committed();
        if dst.is_empty() {
            *dst = reduced.s.clone();
            return;
        }
        if dst.len() != reduced.s.len() {
            panic!(
                "destination length {} does not match the {} singular values",
                dst.len(),
                reduced.s.len()
            );
        }
        dst.assign(&reduced.s);
    }

    /// Extracts the left singular vectors `U` of the factorized matrix into
    /// `dst`.
    ///
    /// The reduced factorization's left vectors live in the sketch basis, so
    /// they are lifted back into the original `m`-dimensional space first.
    /// An empty `dst` is resized to `m × rank`.
    ///
    /// # Panics
    ///
    /// Panics if a non-empty `dst` is not `m × rank`, if left singular
    /// vectors were not computed, or if the receiver does not contain a
    /// successful factorization. The destination is not written before any
    /// of these checks.
    pub fn u_to(&self, dst: &mut Array2<f64>) {
        let (fact, reduced) = self.committed();
        let uy = match &reduced.u {
            Some(uy) => uy,
            None => panic!("left singular vectors were not computed during factorization"),
        };

        // Lift the reduced left vectors back into the original row space:
        // [U] = [Q · Uy] = (m × rank) · (rank × rank) = m × rank
        let u = fact.q.dot(uy);

        if dst.is_empty() {
            *dst = u;
            return;
        }
        if dst.dim() != (fact.m, fact.rank) {
            panic!(
                "destination shape {:?} does not match U's shape ({}, {})",
                dst.dim(),
                fact.m,
                fact.rank
            );
        }
        dst.assign(&u);
    }

    /// Extracts the right singular vectors `V` of the factorized matrix into
    /// `dst`.
    ///
    /// `V` already lives in the original `n`-dimensional column space, so no
    /// back-projection is needed; the reduced factorization hands back `Vᵀ`
    /// and only a transpose is applied. An empty `dst` is resized to
    /// `n × rank`.
    ///
    /// # Panics
    ///
    /// Panics if a non-empty `dst` does not match `V`'s shape, if right
    /// singular vectors were not computed, or if the receiver does not
    /// contain a successful factorization. The destination is not written
    /// before any of these checks.
    pub fn v_to(&self, dst: &mut Array2<f64>) {
        let (fact, reduced) = self.committed();
        let vt = match &reduced.vt {
            Some(vt) => vt,
            None => panic!("right singular vectors were not computed during factorization"),
        };

        // [V] = Vyᵀ transposed: n × rank
        let v = vt.t();

        if dst.is_empty() {
            *dst = v.to_owned();
            return;
        }
        if dst.dim() != (fact.n, fact.rank) {
            panic!(
                "destination shape {:?} does not match V's shape ({}, {})",
                dst.dim(),
                fact.n,
                fact.rank
            );
        }
        dst.assign(&v);
    }

    /// Returns the rank-limited reconstruction `U · Σ · Vᵀ` of the
    /// factorized matrix, an `m × n` approximation of the input.
    ///
    /// # Panics
    ///
    /// Panics if the receiver does not contain a successful factorization,
    /// or if singular vectors were not computed.
    pub fn reconstruct(&self) -> Array2<f64> {
        let (fact, reduced) = self.committed();
        let uy = match &reduced.u {
            Some(uy) => uy,
            None => panic!("left singular vectors were not computed during factorization"),
        };
        let vt = match &reduced.vt {
            Some(vt) => vt,
            None => panic!("right singular vectors were not computed during factorization"),
        };

        let u = fact.q.dot(uy);
        let sigma = Array2::from_diag(&reduced.s);
        u.dot(&sigma).dot(vt)
    }

    /// Returns the target rank of the most recent factorization attempt.
    ///
    /// # Panics
    ///
    /// Panics if `factorize` has never been called on the receiver.
    pub fn rank(&self) -> usize {
        self.factorization().rank
    }

    fn factorization(&self) -> &Factorization {
        match &self.state {
            Some(fact) => fact,
            None => panic!("matrix has not been factorized"),
        }
    }

    fn committed(&self) -> (&Factorization, &ThinSvdOutput) {
        let fact = self.factorization();
        match &fact.reduced {
            Some(reduced) => (fact, reduced),
            None => panic!("no successful factorization is stored"),
        }
    }
}
