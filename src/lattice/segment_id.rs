use serde::{Deserialize, Serialize};

use crate::error::LatticeError;

/// Range of raw component labels consumed by one lattice transition.
///
/// Packed as a `u32` transition input: bits 31..16 hold `start`, bits 15..0
/// hold `end`. Both ends are inclusive component labels; `0` marks a
/// transition that owns no components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SegmentId {
    pub start: u16,
    pub end: u16,
}

impl SegmentId {
    pub const NONE: SegmentId = SegmentId { start: 0, end: 0 };

    pub fn new(start: u32, end: u32) -> Result<Self, LatticeError> {
        Ok(Self {
            start: narrow(start)?,
            end: narrow(end)?,
        })
    }

    pub fn pack(self) -> u32 {
        ((self.start as u32) << 16) | self.end as u32
    }

    pub fn unpack(packed: u32) -> Self {
        Self {
            start: (packed >> 16) as u16,
            end: (packed & 0xFFFF) as u16,
        }
    }

    /// True when the range names real components on both ends.
    pub fn is_assigned(self) -> bool {
        self.start != 0 && self.end != 0
    }
}

fn narrow(label: u32) -> Result<u16, LatticeError> {
    u16::try_from(label).map_err(|_| LatticeError::SegmentOverflow { label })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_recovers_fields() {
        for (start, end) in [(1, 1), (3, 7), (0, 0), (65535, 65535), (256, 65535)] {
            let id = SegmentId::new(start, end).expect("fits");
            let packed = id.pack();
            assert_eq!(packed >> 16, start);
            assert_eq!(packed & 0xFFFF, end);
            assert_eq!(SegmentId::unpack(packed), id);
        }
    }

    #[test]
    fn overflow_is_an_error() {
        let err = SegmentId::new(1, 65536).unwrap_err();
        assert!(matches!(err, LatticeError::SegmentOverflow { label: 65536 }));
    }

    #[test]
    fn none_is_unassigned() {
        assert_eq!(SegmentId::NONE.pack(), 0);
        assert!(!SegmentId::NONE.is_assigned());
        assert!(!SegmentId::unpack(5).is_assigned());
        assert!(SegmentId::unpack((2 << 16) | 3).is_assigned());
    }
}
