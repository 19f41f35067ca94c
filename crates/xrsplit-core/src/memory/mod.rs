pub mod deep_pointer;

pub use deep_pointer::{DeepPointer, HopStrategy};
