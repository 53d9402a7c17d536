#![deny(warnings, clippy::all, clippy::pedantic)]

#[cfg(test)]
mod spin_lock;
#[cfg(test)]
mod tree;
