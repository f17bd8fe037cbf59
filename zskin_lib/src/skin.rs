//! Skinned limb animation data referenced by skin limbs.
//!
//! The root of the data is [SkinAnimatedLimbData].
//! Each [SkinLimbModif] points to arrays of [SkinVertex] and [SkinTransformation].
use binrw::BinRead;

use crate::{
    declare_array,
    error::DeclareError,
    gfx::{DisplayList, DisplayLists},
    names::PointerNames,
    parse_segmented_vec,
    segment::{SegmentContext, SegmentedAddress},
    DeclareContext, SkinResource,
};

// TODO: Find what the unk fields control from the skinning code in the game.
#[derive(Debug, BinRead, PartialEq, Eq, Clone)]
#[br(import_raw(_segment: SegmentContext))]
pub struct SkinVertex {
    pub unk_0: u16,
    pub unk_2: i16,
    pub unk_4: i16,
    pub unk_6: i8,
    pub unk_7: i8,
    pub unk_8: i8,
    pub unk_9: u8,
}

#[derive(Debug, BinRead, PartialEq, Eq, Clone)]
#[br(import_raw(_segment: SegmentContext))]
pub struct SkinTransformation {
    #[br(pad_after = 1)]
    pub unk_0: u8,
    pub x: i16,
    pub y: i16,
    pub z: i16,
    #[br(pad_after = 1)]
    pub unk_8: u8,
}

#[derive(Debug, BinRead, PartialEq, Eq, Clone)]
#[br(import_raw(segment: SegmentContext))]
pub struct SkinLimbModif {
    pub vertex_count: u16,
    pub transform_count: u16,
    #[br(pad_after = 2)]
    pub unk_4: u16,
    pub vertices_address: SegmentedAddress,
    pub transforms_address: SegmentedAddress,

    /// Empty unless [Self::vertices_address] points to data in the current segment.
    #[br(parse_with = parse_segmented_vec)]
    #[br(args_raw = (vertices_address, vertex_count, segment))]
    pub vertices: Vec<SkinVertex>,

    /// Empty unless [Self::transforms_address] points to data in the current segment.
    #[br(parse_with = parse_segmented_vec)]
    #[br(args_raw = (transforms_address, transform_count, segment))]
    pub transforms: Vec<SkinTransformation>,
}

#[derive(Debug, BinRead, PartialEq, Eq, Clone)]
#[br(import_raw(segment: SegmentContext))]
pub struct SkinAnimatedLimbData {
    pub unk_0: u16,
    pub limb_modif_count: u16,
    pub limb_modifications_address: SegmentedAddress,
    /// The display list for the limb.
    /// The length isn't known until the list is extracted while declaring references.
    pub dlist_address: SegmentedAddress,

    #[br(parse_with = parse_segmented_vec)]
    #[br(args_raw = (limb_modifications_address, limb_modif_count, segment))]
    pub limb_modifications: Vec<SkinLimbModif>,
}

impl SkinResource for SkinVertex {
    const TYPE_NAME: &'static str = "SkinVertex";
    const SIZE: u32 = 0x0A;

    fn body_source<N>(&self, _names: &N, _segment: &SegmentContext) -> String
    where
        N: PointerNames + ?Sized,
    {
        format!(
            "0x{:02X}, {}, {}, {}, {}, {}, 0x{:02X}",
            self.unk_0, self.unk_2, self.unk_4, self.unk_6, self.unk_7, self.unk_8, self.unk_9
        )
    }
}

impl SkinResource for SkinTransformation {
    const TYPE_NAME: &'static str = "SkinTransformation";
    const SIZE: u32 = 0x0A;

    fn body_source<N>(&self, _names: &N, _segment: &SegmentContext) -> String
    where
        N: PointerNames + ?Sized,
    {
        format!(
            "0x{:02X}, {}, {}, {}, 0x{:02X}",
            self.unk_0, self.x, self.y, self.z, self.unk_8
        )
    }
}

impl SkinResource for SkinLimbModif {
    const TYPE_NAME: &'static str = "SkinLimbModif";
    const SIZE: u32 = 0x10;

    fn declare_references<D: DisplayLists>(
        &self,
        ctx: &mut DeclareContext<'_, D>,
        prefix: &str,
    ) -> Result<(), DeclareError> {
        declare_array(ctx, prefix, self.vertices_address, &self.vertices)?;
        declare_array(ctx, prefix, self.transforms_address, &self.transforms)?;
        Ok(())
    }

    fn body_source<N>(&self, names: &N, segment: &SegmentContext) -> String
    where
        N: PointerNames + ?Sized,
    {
        let vertices = names.pointer_name(self.vertices_address, segment, SkinVertex::TYPE_NAME);
        let transforms = names.pointer_name(
            self.transforms_address,
            segment,
            SkinTransformation::TYPE_NAME,
        );

        format!(
            "\n\t\tARRAY_COUNTU({vertices}), ARRAY_COUNTU({transforms}),\n\t\t{}, {vertices}, {transforms}\n\t",
            self.unk_4
        )
    }
}

impl SkinResource for SkinAnimatedLimbData {
    const TYPE_NAME: &'static str = "SkinAnimatedLimbData";
    const SIZE: u32 = 0x0C;

    fn declare_references<D: DisplayLists>(
        &self,
        ctx: &mut DeclareContext<'_, D>,
        prefix: &str,
    ) -> Result<(), DeclareError> {
        declare_array(
            ctx,
            prefix,
            self.limb_modifications_address,
            &self.limb_modifications,
        )?;

        // The display list is extracted separately since it isn't a fixed size record.
        if let Some(offset) = ctx.segment.local_offset(self.dlist_address)? {
            let dlist_type = ctx.game.dlist_type();
            let length = ctx
                .display_lists
                .dlist_length(ctx.bytes, offset, dlist_type)?;

            let mut dlist = ctx.display_lists.extract(ctx.bytes, offset, length)?;
            dlist.set_name(format!("{prefix}SkinLimbDL_{offset:06X}"));
            dlist.declare_var(ctx.declarations, prefix)?;
            dlist.declare_references(ctx.declarations, prefix)?;
            ctx.display_lists.add_resource(dlist);
        }

        Ok(())
    }

    fn body_source<N>(&self, names: &N, segment: &SegmentContext) -> String
    where
        N: PointerNames + ?Sized,
    {
        let limb_modifications = names.pointer_name(
            self.limb_modifications_address,
            segment,
            SkinLimbModif::TYPE_NAME,
        );
        let dlist = names.pointer_name(self.dlist_address, segment, "Gfx");

        format!(
            "\n\t{}, ARRAY_COUNTU({limb_modifications}),\n\t{limb_modifications}, {dlist}\n",
            self.unk_0
        )
    }
}
