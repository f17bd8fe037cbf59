//! Segmented addresses and their translation to file offsets.
use std::io::{Read, Seek};

use binrw::{BinRead, BinResult};

use crate::error::AddressError;

/// A 32-bit address with an 8-bit segment and 24-bit offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SegmentedAddress {
    pub segment: u8,
    /// The offset within the segment in the range `0..=0xFFFFFF`.
    pub offset: u32,
}

impl SegmentedAddress {
    pub const NULL: Self = Self {
        segment: 0,
        offset: 0,
    };

    pub fn new(segment: u8, offset: u32) -> Self {
        Self {
            segment,
            offset: offset & 0x00FFFFFF,
        }
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// The packed value as it appears in the binary.
    pub fn raw(&self) -> u32 {
        (u32::from(self.segment) << 24) | self.offset
    }
}

impl From<u32> for SegmentedAddress {
    fn from(value: u32) -> Self {
        Self::new((value >> 24) as u8, value)
    }
}

impl std::fmt::Display for SegmentedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08X}", self.raw())
    }
}

impl BinRead for SegmentedAddress {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: binrw::Endian,
        args: Self::Args<'_>,
    ) -> BinResult<Self> {
        u32::read_options(reader, endian, args).map(Self::from)
    }
}

/// The segment currently being decoded and where its data starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SegmentContext {
    pub segment: u8,
    pub base_address: u32,
}

impl SegmentContext {
    pub fn new(segment: u8, base_address: u32) -> Self {
        Self {
            segment,
            base_address,
        }
    }

    /// Pointers in other segments are defined elsewhere and not followed.
    pub fn is_local(&self, address: SegmentedAddress) -> bool {
        !address.is_null() && address.segment == self.segment
    }

    /// The file offset for `address` relative to the base address.
    ///
    /// Only the offset bits are used, so this works for any segment.
    pub fn file_offset(&self, address: SegmentedAddress) -> Result<u32, AddressError> {
        let base_offset = self.base_address & 0x00FFFFFF;
        address
            .offset
            .checked_sub(base_offset)
            .ok_or(AddressError::BelowBaseAddress {
                address,
                base_address: self.base_address,
            })
    }

    /// The file offset for `address` if it points to non null data in this segment.
    pub fn local_offset(&self, address: SegmentedAddress) -> Result<Option<u32>, AddressError> {
        if self.is_local(address) {
            self.file_offset(address).map(Some)
        } else {
            Ok(None)
        }
    }
}
