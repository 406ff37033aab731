//! Unimock mock API for the [`Net`](crate::Net) trait, for use in
//! downstream crate tests. Enabled with the `mock` feature.

pub use crate::traits::NetMock;
