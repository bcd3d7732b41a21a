// Randomized singular value decomposition (RSVD)

#![doc = include_str!("../README.md")]

pub mod linalg_backends;
mod rsvd;

pub use crate::linalg_backends::{
    BackendQR, BackendSVD, NdarrayLinAlgBackend, ThinSvdOutput, ThreadSafeStdError,
};
pub use crate::rsvd::Rsvd;
