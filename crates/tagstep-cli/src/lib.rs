//! Reusable pieces of the `tagstep` binary.

pub mod crm;
