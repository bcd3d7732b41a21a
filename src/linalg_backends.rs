// src/linalg_backends.rs

//! Capability seam over the LAPACK-backed factorizations the randomized SVD
//! chains together: orthogonal-factor extraction from a QR decomposition and
//! an exact thin SVD. The core algorithm only talks to these traits, so the
//! concrete backend can be swapped without touching the projection logic.

use ndarray::{Array1, Array2};
use ndarray_linalg::svddc::{JobSvd, SVDDC};
use ndarray_linalg::QR;
use std::error::Error;

/// A thread-safe wrapper for standard dynamic errors,
/// so they implement `Send` and `Sync`.
pub type ThreadSafeStdError = Box<dyn Error + Send + Sync + 'static>;

/// Output of an exact thin Singular Value Decomposition.
///
/// Singular values are in descending order. `u` and `vt` are present when the
/// backend was asked to compute the corresponding vectors.
#[derive(Debug, Clone)]
pub struct ThinSvdOutput {
    pub u: Option<Array2<f64>>,
    pub s: Array1<f64>,
    pub vt: Option<Array2<f64>>,
}

/// Trait for QR decomposition, focusing on retrieving the Q factor.
pub trait BackendQR {
    /// Returns the orthogonal factor of `matrix`'s QR decomposition, with
    /// `min(nrows, ncols)` orthonormal columns.
    fn qr_q_factor(&self, matrix: &Array2<f64>) -> Result<Array2<f64>, ThreadSafeStdError>;
}

/// Trait for an exact thin Singular Value Decomposition.
pub trait BackendSVD {
    /// Computes `matrix = U · Σ · Vᵀ` with reduced (thin) `U` and `Vᵀ`.
    fn thin_svd(&self, matrix: &Array2<f64>) -> Result<ThinSvdOutput, ThreadSafeStdError>;
}

/// LAPACK-backed implementation of the factorization traits via
/// `ndarray-linalg`.
#[derive(Debug, Default, Copy, Clone)]
pub struct NdarrayLinAlgBackend;

// Helper to convert ndarray-linalg's error to Box<dyn Error + Send + Sync>
fn to_dyn_error<E: Error + Send + Sync + 'static>(e: E) -> ThreadSafeStdError {
    Box::new(e)
}

impl BackendQR for NdarrayLinAlgBackend {
    fn qr_q_factor(&self, matrix: &Array2<f64>) -> Result<Array2<f64>, ThreadSafeStdError> {
        let (q_factor, _r) = matrix.qr().map_err(to_dyn_error)?;
        Ok(q_factor)
    }
}

impl BackendSVD for NdarrayLinAlgBackend {
    fn thin_svd(&self, matrix: &Array2<f64>) -> Result<ThinSvdOutput, ThreadSafeStdError> {
        let (u, s, vt) = matrix.svddc(JobSvd::Some).map_err(to_dyn_error)?;
        Ok(ThinSvdOutput { u, s, vt })
    }
}

#[cfg(test)]
mod backend_tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn qr_q_factor_has_orthonormal_columns() {
        let m = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let q = NdarrayLinAlgBackend.qr_q_factor(&m).unwrap();
        assert_eq!(q.dim(), (3, 2));
        let qtq = q.t().dot(&q);
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(qtq[[i, j]], expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn thin_svd_reconstructs_wide_matrix() {
        let m = array![[2.0, 0.0, 1.0], [0.0, -3.0, 1.0]];
        let out = NdarrayLinAlgBackend.thin_svd(&m).unwrap();
        let u = out.u.unwrap();
        let vt = out.vt.unwrap();
        assert_eq!(u.dim(), (2, 2));
        assert_eq!(out.s.len(), 2);
        assert_eq!(vt.dim(), (2, 3));
        assert!(out.s[0] >= out.s[1]);
        let reconstructed = u.dot(&Array2::from_diag(&out.s)).dot(&vt);
        for i in 0..2 {
            for j in 0..3 {
                assert_abs_diff_eq!(reconstructed[[i, j]], m[[i, j]], epsilon = 1e-10);
            }
        }
    }
}
