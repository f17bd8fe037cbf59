use thiserror::Error;
use zskin_decl::DeclarationError;

use crate::segment::SegmentedAddress;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address {address} is below the base address 0x{base_address:08X}")]
    BelowBaseAddress {
        address: SegmentedAddress,
        base_address: u32,
    },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("error reading data: {0}")]
    Binrw(#[from] binrw::Error),

    #[error("error reading data: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DisplayListError {
    #[error("display list at 0x{offset:06X} has no end command before the end of the data")]
    MissingEndCommand { offset: u32 },
}

#[derive(Debug, Error)]
pub enum DeclareError {
    #[error("error registering declaration")]
    Declaration(#[from] DeclarationError),

    #[error("error translating address")]
    Address(#[from] AddressError),

    #[error("error extracting display list")]
    DisplayList(#[from] DisplayListError),
}
