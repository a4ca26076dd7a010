//! Services for the solver domain

pub mod boundary;
pub mod solver;
