//! Multi-hop pointer chains through remote memory.
//!
//! The community-documented chains for this game are ambiguous about whether a
//! hop adds before or after dereferencing, so a chain is resolved with each
//! [`HopStrategy`] in turn until one yields a readable address.

use strum::{Display, EnumIter, IntoStaticStr};
use tracing::trace;

use crate::error::{Error, Result};
use crate::process::ReadMemory;

/// Order in which offsets and dereferences are applied along a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum HopStrategy {
    /// Add the offset, then dereference; the final hop is not dereferenced.
    AddThenDeref,
    /// Same arithmetic as `AddThenDeref`, tried separately to match LiveSplit ASL semantics.
    LiveSplitCompat,
    /// Dereference, then add the offset, on every hop.
    DerefThenAdd,
}

impl HopStrategy {
    /// Candidates in the order they are attempted.
    pub const ORDER: [HopStrategy; 3] = [
        HopStrategy::AddThenDeref,
        HopStrategy::LiveSplitCompat,
        HopStrategy::DerefThenAdd,
    ];

    /// Walk `offsets` from `base`. Returns `None` if any dereference fails.
    pub fn resolve<R: ReadMemory + ?Sized>(
        self,
        reader: &R,
        base: u64,
        offsets: &[u64],
    ) -> Option<u64> {
        let mut address = base;
        match self {
            HopStrategy::AddThenDeref | HopStrategy::LiveSplitCompat => {
                for (i, offset) in offsets.iter().enumerate() {
                    address = address.wrapping_add(*offset);
                    if i + 1 < offsets.len() {
                        address = reader.read_pointer(address).ok()?;
                    }
                }
            }
            HopStrategy::DerefThenAdd => {
                for offset in offsets {
                    address = reader.read_pointer(address).ok()?.wrapping_add(*offset);
                }
            }
        }
        Some(address)
    }
}

/// A base address plus an ordered offset chain. Holds no per-read state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepPointer {
    pub base: u64,
    pub offsets: Vec<u64>,
}

impl DeepPointer {
    pub fn new(base: u64, offsets: Vec<u64>) -> Self {
        Self { base, offsets }
    }

    /// Fill `buf` from the end of the chain.
    ///
    /// Each strategy's address is read directly first; if that fails the value
    /// there is treated as one more pointer. Returns the strategy that succeeded.
    pub fn read_into<R: ReadMemory + ?Sized>(
        &self,
        reader: &R,
        buf: &mut [u8],
    ) -> Result<HopStrategy> {
        for strategy in HopStrategy::ORDER {
            let Some(address) = strategy.resolve(reader, self.base, &self.offsets) else {
                continue;
            };
            if address == 0 {
                continue;
            }

            if reader.read_into(address, buf).is_ok() {
                return Ok(strategy);
            }

            if let Ok(target) = reader.read_pointer(address) {
                if target != 0 && reader.read_into(target, buf).is_ok() {
                    return Ok(strategy);
                }
            }

            trace!(
                "Deep pointer {:#x}: {} candidate {:#x} unreadable",
                self.base, strategy, address
            );
        }

        Err(Error::DeepPointerUnresolved { base: self.base })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{MockMemoryBuilder, PointerWidth};

    #[test]
    fn test_add_then_deref_chain() {
        // base+0x10 -> 0x2000, 0x2000+0x8 -> 0x3000, final address 0x3000+0x4
        let memory = MockMemoryBuilder::new()
            .write_pointer(0x1010, 0x2000)
            .write_pointer(0x2008, 0x3000)
            .build();

        let address = HopStrategy::AddThenDeref.resolve(&memory, 0x1000, &[0x10, 0x8, 0x4]);
        assert_eq!(address, Some(0x3004));
        assert_eq!(
            HopStrategy::LiveSplitCompat.resolve(&memory, 0x1000, &[0x10, 0x8, 0x4]),
            address
        );
    }

    #[test]
    fn test_deref_then_add_chain() {
        let memory = MockMemoryBuilder::new()
            .write_pointer(0x1000, 0x2000)
            .write_pointer(0x2010, 0x3000)
            .build();

        let address = HopStrategy::DerefThenAdd.resolve(&memory, 0x1000, &[0x10, 0x4]);
        assert_eq!(address, Some(0x3004));
    }

    #[test]
    fn test_null_dereference_fails() {
        let memory = MockMemoryBuilder::new().write_pointer(0x1010, 0).build();

        assert_eq!(
            HopStrategy::AddThenDeref.resolve(&memory, 0x1000, &[0x10, 0x0, 0x4]),
            None
        );
    }

    #[test]
    fn test_empty_chain_is_base() {
        let memory = MockMemoryBuilder::new().build();

        assert_eq!(HopStrategy::AddThenDeref.resolve(&memory, 0x1234, &[]), Some(0x1234));
    }

    #[test]
    fn test_read_prefers_first_strategy() {
        let memory = MockMemoryBuilder::new()
            .write_pointer(0x1010, 0x2000)
            .write_bytes(0x2004, b"final")
            .build();
        let pointer = DeepPointer::new(0x1000, vec![0x10, 0x4]);

        let mut buf = [0u8; 5];
        let strategy = pointer.read_into(&memory, &mut buf).unwrap();
        assert_eq!(strategy, HopStrategy::AddThenDeref);
        assert_eq!(&buf, b"final");
    }

    #[test]
    fn test_read_falls_back_to_deref_then_add() {
        // Only the deref-first walk lands on mapped memory.
        let memory = MockMemoryBuilder::new()
            .write_pointer(0x1000, 0x5000)
            .write_pointer(0x5010, 0x6000)
            .write_bytes(0x6004, b"mar_k")
            .build();
        let pointer = DeepPointer::new(0x1000, vec![0x10, 0x4]);

        let mut buf = [0u8; 5];
        assert_eq!(pointer.read_into(&memory, &mut buf).unwrap(), HopStrategy::DerefThenAdd);
        assert_eq!(&buf, b"mar_k");
    }

    #[test]
    fn test_read_takes_extra_hop() {
        // The final address holds a pointer to the bytes rather than the bytes.
        let memory = MockMemoryBuilder::new()
            .pointer_width(PointerWidth::Four)
            .write_pointer(0x1010, 0x2000)
            .write_pointer(0x2004, 0x7000)
            .write_bytes(0x7000, b"final")
            .build();
        memory.unmap(0x2008, 1);
        let pointer = DeepPointer::new(0x1000, vec![0x10, 0x4]);

        let mut buf = [0u8; 5];
        assert_eq!(pointer.read_into(&memory, &mut buf).unwrap(), HopStrategy::AddThenDeref);
        assert_eq!(&buf, b"final");
    }

    #[test]
    fn test_unresolved_reports_base() {
        let memory = MockMemoryBuilder::new().build();
        let pointer = DeepPointer::new(0x1000, vec![0x10, 0x4]);

        let mut buf = [0u8; 5];
        match pointer.read_into(&memory, &mut buf) {
            Err(Error::DeepPointerUnresolved { base }) => assert_eq!(base, 0x1000),
            other => panic!("expected DeepPointerUnresolved, got {:?}", other),
        }
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(HopStrategy::AddThenDeref.to_string(), "add-then-deref");
        assert_eq!(HopStrategy::ORDER[2], HopStrategy::DerefThenAdd);
    }
}
