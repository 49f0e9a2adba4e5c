//! Cycle finder module root.
//!
//! Two closure algorithms over the residue: the four-point method and
//! the HCM (Clormann–Seeger) three-point method.

pub mod four_point;
pub mod hcm;
