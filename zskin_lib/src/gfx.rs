//! Display list extraction for limbs with a rendering command list.
//!
//! Decoding individual commands is handled by the [DisplayLists] implementation.
//! [RawDisplayLists] only finds the length of each list and declares the raw command words.
use indexmap::IndexMap;
use log::trace;
use zskin_decl::{Declaration, Declarations};

use crate::error::{DeclareError, DisplayListError};

/// The size in bytes of a single display list command.
pub const COMMAND_SIZE: u32 = 8;

/// The game version being extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Game {
    #[default]
    Ocarina,
    /// The Ocarina of Time Spaceworld 1997 demo.
    OcarinaSw97,
    Majora,
}

impl Game {
    /// The microcode variant used for display lists.
    pub fn dlist_type(&self) -> DListType {
        match self {
            Game::OcarinaSw97 => DListType::F3dex,
            Game::Ocarina | Game::Majora => DListType::F3dzex,
        }
    }
}

/// The graphics microcode instruction set for display list commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DListType {
    F3dex,
    F3dzex,
}

impl DListType {
    /// The opcode for `G_ENDDL`.
    pub fn end_opcode(&self) -> u8 {
        match self {
            DListType::F3dex => 0xB8,
            DListType::F3dzex => 0xDF,
        }
    }

    /// The opcode for `G_DL`.
    pub fn dl_opcode(&self) -> u8 {
        match self {
            DListType::F3dex => 0x06,
            DListType::F3dzex => 0xDE,
        }
    }
}

/// Extracts display lists and stores them with the other resources for the file.
pub trait DisplayLists {
    type DisplayList: DisplayList;

    /// The length in bytes of the display list starting at `offset`.
    fn dlist_length(
        &self,
        bytes: &[u8],
        offset: u32,
        dlist_type: DListType,
    ) -> Result<u32, DisplayListError>;

    /// Create a display list resource for `length` bytes starting at `offset`.
    fn extract(
        &self,
        bytes: &[u8],
        offset: u32,
        length: u32,
    ) -> Result<Self::DisplayList, DisplayListError>;

    /// Add `dlist` to the resources for the file.
    fn add_resource(&mut self, dlist: Self::DisplayList);
}

/// A single extracted display list resource.
pub trait DisplayList {
    fn offset(&self) -> u32;

    fn set_name(&mut self, name: String);

    /// Declare the display list itself.
    fn declare_var(
        &self,
        declarations: &mut Declarations,
        prefix: &str,
    ) -> Result<(), DeclareError>;

    /// Declare any data referenced by the display list commands.
    fn declare_references(
        &self,
        declarations: &mut Declarations,
        prefix: &str,
    ) -> Result<(), DeclareError>;
}

/// Display lists declared as raw command words without decoding the commands.
#[derive(Debug, Default)]
pub struct RawDisplayLists {
    /// Extracted display lists keyed by file offset.
    pub dlists: IndexMap<u32, RawDisplayList>,
}

impl RawDisplayLists {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDisplayList {
    pub offset: u32,
    pub name: String,
    /// The two 32-bit words for each command.
    pub commands: Vec<[u32; 2]>,
}

impl DisplayLists for RawDisplayLists {
    type DisplayList = RawDisplayList;

    fn dlist_length(
        &self,
        bytes: &[u8],
        offset: u32,
        dlist_type: DListType,
    ) -> Result<u32, DisplayListError> {
        let start = offset as usize;
        let commands = bytes
            .get(start..)
            .ok_or(DisplayListError::MissingEndCommand { offset })?
            .chunks_exact(COMMAND_SIZE as usize);

        for (i, command) in commands.enumerate() {
            let opcode = command[0];
            // Branching without pushing the return address ends the list.
            let is_branch = opcode == dlist_type.dl_opcode() && command[1] == 0x01;
            if opcode == dlist_type.end_opcode() || is_branch {
                return Ok((i as u32 + 1) * COMMAND_SIZE);
            }
        }

        Err(DisplayListError::MissingEndCommand { offset })
    }

    fn extract(
        &self,
        bytes: &[u8],
        offset: u32,
        length: u32,
    ) -> Result<Self::DisplayList, DisplayListError> {
        let start = offset as usize;
        let end = start + length as usize;
        let commands = bytes
            .get(start..end)
            .ok_or(DisplayListError::MissingEndCommand { offset })?
            .chunks_exact(COMMAND_SIZE as usize)
            .map(|c| {
                [
                    u32::from_be_bytes([c[0], c[1], c[2], c[3]]),
                    u32::from_be_bytes([c[4], c[5], c[6], c[7]]),
                ]
            })
            .collect();

        Ok(RawDisplayList {
            offset,
            name: String::new(),
            commands,
        })
    }

    fn add_resource(&mut self, dlist: Self::DisplayList) {
        // Declaring the same data again replaces the previous list.
        self.dlists.insert(dlist.offset(), dlist);
    }
}

impl DisplayList for RawDisplayList {
    fn offset(&self) -> u32 {
        self.offset
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn declare_var(
        &self,
        declarations: &mut Declarations,
        _prefix: &str,
    ) -> Result<(), DeclareError> {
        let body = self
            .commands
            .iter()
            .map(|[w0, w1]| format!("\t{{ 0x{w0:08X}, 0x{w1:08X} }},"))
            .collect::<Vec<_>>()
            .join("\n");

        declarations.declare(
            self.offset,
            Declaration::array(
                8,
                self.commands.len() as u32 * COMMAND_SIZE,
                "Gfx",
                self.name.clone(),
                self.commands.len(),
                body,
            ),
        )?;
        Ok(())
    }

    fn declare_references(
        &self,
        _declarations: &mut Declarations,
        _prefix: &str,
    ) -> Result<(), DeclareError> {
        // Raw commands aren't decoded, so there are no references to follow.
        trace!("No references for raw display list {}", self.name);
        Ok(())
    }
}
