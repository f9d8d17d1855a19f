//! Provides input/output functionality for structure and reference files.
//!
//! Structures are read and written as VASP POSCAR files through the
//! [`StructureFile`](traits::StructureFile) trait, accepted steps are appended to
//! an XDATCAR trajectory, and the experimental G(r) target is loaded from a plain
//! two-column text file.

pub mod poscar;
pub mod reference;
pub mod traits;
pub mod xdatcar;
