//! Unit test tree mirroring the crate's module layout

mod analysis;
mod io;
mod math;
mod spatial;
