//! Utilities for validating the byte ranges read while decoding.
//!
//! Decoding a record emits a tracing event with the `type_name`, `start`, and `end`
//! for the record and for each pointed to array.
//! [decode_with_offsets] collects these events into [OffsetRange] values.
use std::sync::{Arc, Mutex};

use tracing_subscriber::{Layer, layer::SubscriberExt};

use crate::{SkinResource, error::DecodeError, segment::SegmentContext};

/// Named byte range for `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetRange {
    pub start: u64,
    pub end: u64,
    pub parent_type_names: Vec<String>,
    pub type_name: String,
}

/// Unexpected cases while checking offset ranges that usually indicate some sort of error.
#[derive(Debug, PartialEq, Eq)]
pub enum OffsetValidationError<'a> {
    /// Two ranges overlap.
    ///
    /// Overlaps indicate a record size or array count is incorrect.
    OverlappingRange {
        current: OffsetRange,
        next: OffsetRange,
    },

    /// A byte between ranges is not zero.
    ///
    /// Non padding bytes between ranges are likely data that was never decoded.
    GapWithNonPaddingBytes {
        before: OffsetRange,
        after: OffsetRange,
        gap_bytes: &'a [u8],
    },
}

pub fn validate_ranges<'a>(
    ranges: &[OffsetRange],
    bytes: &'a [u8],
) -> Vec<OffsetValidationError<'a>> {
    let mut ranges = ranges.to_vec();

    // Gap detection assumes offsets are sorted.
    ranges.sort_by_key(|r| r.start);

    let mut errors = Vec::new();

    for i in 0..ranges.len().saturating_sub(1) {
        let current = ranges[i].clone();
        let next = ranges[i + 1].clone();

        if current.end > next.start {
            errors.push(OffsetValidationError::OverlappingRange { current, next });
        } else if current.end < next.start {
            let gap_bytes = bytes
                .get(current.end as usize..next.start as usize)
                .unwrap_or_default();

            if gap_bytes.iter().any(|b| *b != 0) {
                errors.push(OffsetValidationError::GapWithNonPaddingBytes {
                    before: current,
                    after: next,
                    gap_bytes,
                });
            }
        }
    }

    errors
}

pub struct OffsetLayer(pub Arc<Mutex<Vec<OffsetRange>>>);

#[derive(Debug, Default)]
struct OffsetRangeVisitor {
    start: Option<u64>,
    end: Option<u64>,
    type_name: Option<String>,
}

impl tracing::field::Visit for OffsetRangeVisitor {
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        if field.name() == "start" {
            self.start = Some(value);
        } else if field.name() == "end" {
            self.end = Some(value);
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "type_name" {
            self.type_name = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, _field: &tracing::field::Field, _value: &dyn std::fmt::Debug) {}
}

#[derive(Debug, Default)]
struct TypeNameVisitor {
    type_name: Option<String>,
}

impl tracing::field::Visit for TypeNameVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "type_name" {
            self.type_name = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, _field: &tracing::field::Field, _value: &dyn std::fmt::Debug) {}
}

struct TypeName(String);

impl<S> Layer<S> for OffsetLayer
where
    S: tracing::Subscriber,
    S: for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = OffsetRangeVisitor::default();
        event.record(&mut visitor);
        if let Some(start) = visitor.start
            && let Some(end) = visitor.end
            && let Some(type_name) = visitor.type_name
        {
            let mut parent_type_names = Vec::new();
            if let Some(scope) = ctx.event_scope(event) {
                for span in scope.from_root() {
                    // The span for an array has the same name as its events.
                    if let Some(TypeName(n)) = span.extensions().get()
                        && n != &type_name
                    {
                        parent_type_names.push(n.clone());
                    }
                }
            }

            if let Ok(mut ranges) = self.0.lock() {
                ranges.push(OffsetRange {
                    start,
                    end,
                    type_name,
                    parent_type_names,
                });
            }
        }
    }

    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = TypeNameVisitor::default();
        attrs.values().record(&mut visitor);

        if let Some(n) = visitor.type_name
            && let Some(span) = ctx.span(id)
        {
            span.extensions_mut().insert(TypeName(n));
        }
    }
}

/// Decode `T` at `offset` and return the byte ranges for all decoded data sorted by start.
pub fn decode_with_offsets<T: SkinResource>(
    bytes: &[u8],
    offset: u32,
    segment: SegmentContext,
) -> (Result<T, DecodeError>, Vec<OffsetRange>) {
    // Log offsets for just this type on this thread.
    let ranges = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(OffsetLayer(ranges.clone()));

    let result = tracing::subscriber::with_default(subscriber, || {
        T::decode(bytes, offset, segment)
    });

    let mut ranges = ranges.lock().map(|r| r.clone()).unwrap_or_default();
    // Sort to make validation easier later.
    ranges.sort_by_key(|r| r.start);

    (result, ranges)
}
