//! Source declarations keyed by file offset for the declaration pass.
//!
//! Decoding produces plain data with no side effects.
//! Emitting source happens in a separate pass that registers one [Declaration]
//! for each array found in the file.
//! Passes may run more than once over the same data,
//! so registering at an offset that is already declared replaces the body
//! instead of adding a second declaration.
use std::collections::{btree_map::Entry, BTreeMap};

use log::debug;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeclarationError {
    #[error(
        "declaration at 0x{offset:06X} has type {existing_type} with size 0x{existing_size:X} \
         but expected type {type_name} with size 0x{size:X}"
    )]
    Conflict {
        offset: u32,
        existing_type: String,
        existing_size: u32,
        type_name: String,
        size: u32,
    },
}

/// A named array definition in the generated source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// The required alignment of the start offset in bytes.
    pub alignment: u32,
    /// The total size of the array in bytes.
    pub size: u32,
    /// The element type like `SkinVertex`.
    pub type_name: String,
    pub name: String,
    /// The number of elements.
    pub count: usize,
    /// The initializer text between the outer braces.
    pub body: String,
}

impl Declaration {
    pub fn array(
        alignment: u32,
        size: u32,
        type_name: &str,
        name: String,
        count: usize,
        body: String,
    ) -> Self {
        Self {
            alignment,
            size,
            type_name: type_name.to_string(),
            name,
            count,
            body,
        }
    }

    /// The size of a single element or 0 if the array has no elements.
    pub fn element_size(&self) -> u32 {
        match u32::try_from(self.count) {
            Ok(count) if count > 0 => self.size / count,
            _ => 0,
        }
    }

    /// The full declaration like `SkinVertex name[2] = { ... };`.
    pub fn source(&self) -> String {
        format!(
            "{} {}[{}] = {{\n{}\n}};\n",
            self.type_name, self.name, self.count, self.body
        )
    }
}

/// The declarations for a single file ordered by file offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations {
    declarations: BTreeMap<u32, Declaration>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, offset: u32) -> Option<&Declaration> {
        self.declarations.get(&offset)
    }

    pub fn get_mut(&mut self, offset: u32) -> Option<&mut Declaration> {
        self.declarations.get_mut(&offset)
    }

    /// Find the declaration whose byte range contains `offset`.
    pub fn containing(&self, offset: u32) -> Option<(u32, &Declaration)> {
        self.declarations
            .range(..=offset)
            .next_back()
            .filter(|(start, d)| offset - **start < d.size)
            .map(|(start, d)| (*start, d))
    }

    /// Register `declaration` at `offset`.
    ///
    /// An existing declaration at `offset` keeps its name and only has its body replaced.
    /// Declarations with a different type or size at the same offset are an error.
    pub fn declare(
        &mut self,
        offset: u32,
        declaration: Declaration,
    ) -> Result<&Declaration, DeclarationError> {
        match self.declarations.entry(offset) {
            Entry::Occupied(entry) => {
                let existing = entry.into_mut();
                if existing.type_name != declaration.type_name || existing.size != declaration.size
                {
                    return Err(DeclarationError::Conflict {
                        offset,
                        existing_type: existing.type_name.clone(),
                        existing_size: existing.size,
                        type_name: declaration.type_name,
                        size: declaration.size,
                    });
                }

                debug!(
                    "Replacing body for {} {} at 0x{offset:06X}",
                    existing.type_name, existing.name
                );
                existing.body = declaration.body;
                Ok(existing)
            }
            Entry::Vacant(entry) => Ok(entry.insert(declaration)),
        }
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Declaration)> {
        self.declarations.iter().map(|(o, d)| (*o, d))
    }

    /// Source text for all declarations in increasing order by offset.
    pub fn to_source(&self) -> String {
        self.declarations
            .values()
            .map(Declaration::source)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
