//! A library for decompiling skinned limb animation data into source declarations.
//!
//! # Getting Started
//! Decode the root [SkinAnimatedLimbData](crate::skin::SkinAnimatedLimbData) at a known file offset
//! and then declare its pointed to arrays and display lists.
//!
//! ```rust no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use zskin_decl::Declarations;
//! use zskin_lib::{
//!     gfx::{Game, RawDisplayLists},
//!     segment::SegmentContext,
//!     skin::SkinAnimatedLimbData,
//!     DeclareContext, SkinResource,
//! };
//!
//! let bytes = std::fs::read("object_link_child")?;
//! let segment = SegmentContext::new(6, 0);
//! let limb = SkinAnimatedLimbData::decode(&bytes, 0x1230, segment)?;
//!
//! let mut declarations = Declarations::new();
//! let mut display_lists = RawDisplayLists::new();
//! let mut ctx = DeclareContext::new(
//!     &bytes,
//!     segment,
//!     Game::Ocarina,
//!     &mut declarations,
//!     &mut display_lists,
//! );
//! limb.declare_references(&mut ctx, "gLinkChild")?;
//! println!("{}", declarations.to_source());
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! Each record is a plain Rust type read with binrw from big endian data.
//! Pointers to data in the same segment as the record are followed while reading,
//! so decoding produces the entire tree of records without any side effects.
//! Pointers to other segments or null pointers produce empty arrays
//! since the data is declared elsewhere.
//!
//! Emitting source is a separate pass over the decoded tree
//! that registers declarations in an explicit [Declarations] value.
//! Running the pass again replaces the bodies of existing declarations.
use std::io::{Cursor, Read, Seek, SeekFrom};

use binrw::{BinRead, BinResult, Endian, VecArgs};
use log::{debug, trace};
use zskin_decl::{Declaration, Declarations};

use error::{DecodeError, DeclareError};
use gfx::{DisplayLists, Game};
use names::PointerNames;
use segment::{SegmentContext, SegmentedAddress};

pub mod error;
pub mod gfx;
pub mod names;
pub mod offset;
pub mod segment;
pub mod skin;

/// Common operations for all decompiled record types.
pub trait SkinResource: Sized + for<'a> BinRead<Args<'a> = SegmentContext> + 'static {
    /// The type name used for declarations in the generated source.
    const TYPE_NAME: &'static str;

    /// The size in bytes of the record in the binary.
    const SIZE: u32;

    const ALIGNMENT: u32 = 4;

    /// Read the record at `offset` and any pointed to data in the same segment.
    fn decode(bytes: &[u8], offset: u32, segment: SegmentContext) -> Result<Self, DecodeError> {
        let span = tracing::trace_span!("decode", type_name = Self::TYPE_NAME);
        let _enter = span.enter();

        let mut reader = Cursor::new(bytes);
        reader.seek(SeekFrom::Start(offset.into()))?;
        let value = Self::read_options(&mut reader, Endian::Big, segment)?;

        tracing::trace!(
            type_name = Self::TYPE_NAME,
            start = u64::from(offset),
            end = reader.stream_position()?
        );
        Ok(value)
    }

    /// Register declarations for any pointed to data.
    fn declare_references<D: DisplayLists>(
        &self,
        _ctx: &mut DeclareContext<'_, D>,
        _prefix: &str,
    ) -> Result<(), DeclareError> {
        Ok(())
    }

    /// The initializer text for the fields of this record without the outer braces.
    fn body_source<N>(&self, names: &N, segment: &SegmentContext) -> String
    where
        N: PointerNames + ?Sized;

    fn default_name(prefix: &str, offset: u32) -> String {
        format!("{prefix}{}_{offset:06X}", Self::TYPE_NAME)
    }
}

/// Shared state for the declaration pass over a decoded tree.
pub struct DeclareContext<'a, D> {
    /// The data for the entire file.
    pub bytes: &'a [u8],
    pub segment: SegmentContext,
    pub game: Game,
    pub declarations: &'a mut Declarations,
    /// Extracts display lists and owns the resulting resources.
    pub display_lists: &'a mut D,
}

impl<'a, D: DisplayLists> DeclareContext<'a, D> {
    pub fn new(
        bytes: &'a [u8],
        segment: SegmentContext,
        game: Game,
        declarations: &'a mut Declarations,
        display_lists: &'a mut D,
    ) -> Self {
        Self {
            bytes,
            segment,
            game,
            declarations,
            display_lists,
        }
    }
}

// Pointed to arrays use a count from a sibling field.
fn parse_segmented_vec<T, R>(
    reader: &mut R,
    endian: Endian,
    args: (SegmentedAddress, u16, SegmentContext),
) -> BinResult<Vec<T>>
where
    T: SkinResource,
    R: Read + Seek,
{
    let (address, count, segment) = args;

    let pos = reader.stream_position()?;
    let offset = match segment.local_offset(address) {
        Ok(Some(offset)) => offset,
        Ok(None) => {
            debug!(
                "Skipping {} array at {address} outside segment 0x{:02X}",
                T::TYPE_NAME,
                segment.segment
            );
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(binrw::Error::AssertFail {
                pos,
                message: e.to_string(),
            });
        }
    };

    if count == 0 {
        debug!("Skipping {} array at {address} with count 0", T::TYPE_NAME);
        return Ok(Vec::new());
    }

    let span = tracing::trace_span!("parse_segmented_vec", type_name = T::TYPE_NAME);
    let _enter = span.enter();

    reader.seek(SeekFrom::Start(offset.into()))?;
    trace!("{}: {:?}", T::TYPE_NAME, reader.stream_position()?);

    let values = Vec::<T>::read_options(
        reader,
        endian,
        VecArgs {
            count: count.into(),
            inner: segment,
        },
    )?;

    tracing::trace!(
        type_name = T::TYPE_NAME,
        start = u64::from(offset),
        end = u64::from(offset) + u64::from(count) * u64::from(T::SIZE)
    );

    reader.seek(SeekFrom::Start(pos))?;

    Ok(values)
}

// Declare an array pointed to by address after declaring its elements.
fn declare_array<T, D>(
    ctx: &mut DeclareContext<'_, D>,
    prefix: &str,
    address: SegmentedAddress,
    items: &[T],
) -> Result<(), DeclareError>
where
    T: SkinResource,
    D: DisplayLists,
{
    let Some(offset) = ctx.segment.local_offset(address)? else {
        return Ok(());
    };

    // Pointers with a count of 0 have nothing to declare.
    if items.is_empty() {
        debug!(
            "Skipping declaration for empty {} array at 0x{offset:06X}",
            T::TYPE_NAME
        );
        return Ok(());
    }

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        item.declare_references(ctx, prefix)?;
        let body = item.body_source(&*ctx.declarations, &ctx.segment);
        entries.push(format!("\t{{ {body} }},"));
    }

    let size = items.len() as u32 * T::SIZE;
    ctx.declarations.declare(
        offset,
        Declaration::array(
            T::ALIGNMENT,
            size,
            T::TYPE_NAME,
            T::default_name(prefix, offset),
            items.len(),
            entries.join("\n"),
        ),
    )?;

    Ok(())
}
