//! Symbol names for pointer fields in generated source.
use log::debug;
use zskin_decl::Declarations;

use crate::segment::{SegmentContext, SegmentedAddress};

/// Resolve pointer values to symbol names for header fields.
pub trait PointerNames {
    /// The symbol for `address` or the raw address if there is no declaration.
    ///
    /// This does not depend on whether the pointed to data was decoded.
    fn pointer_name(
        &self,
        address: SegmentedAddress,
        segment: &SegmentContext,
        expected_type: &str,
    ) -> String;
}

impl PointerNames for Declarations {
    fn pointer_name(
        &self,
        address: SegmentedAddress,
        segment: &SegmentContext,
        expected_type: &str,
    ) -> String {
        if address.is_null() {
            return "NULL".to_string();
        }

        if address.segment == segment.segment
            && let Ok(offset) = segment.file_offset(address)
            && let Some((start, declaration)) = self.containing(offset)
        {
            if declaration.type_name != expected_type {
                debug!(
                    "Expected {expected_type} for {address} but found {} {}",
                    declaration.type_name, declaration.name
                );
            }

            if start == offset {
                return declaration.name.clone();
            }

            let element_size = declaration.element_size();
            if element_size > 0 && (offset - start) % element_size == 0 {
                let index = (offset - start) / element_size;
                return format!("&{}[{index}]", declaration.name);
            }
        }

        address.to_string()
    }
}
