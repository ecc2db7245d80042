//! Widening of per-row type tags into a single column declaration.

use std::collections::BTreeMap;

use log::debug;

use crate::{
    catalog::{MYSQL_VARCHAR_MAX_PROPOSED_LEN, TypeName},
    classify::{Classification, SizeHint, TypeTag, classify, decimal_tier},
    declaration::ColumnTypeSpec,
    value::RawValue,
};

/// A union of tags that widens to `result` when every observed tag is a member.
#[derive(Debug, Clone, Copy)]
pub struct WideningRule {
    pub members: &'static [TypeTag],
    pub result: TypeTag,
}

impl WideningRule {
    pub fn admits(&self, tags: &[TypeTag]) -> bool {
        tags.iter().all(|tag| self.members.contains(tag))
    }
}

/// Checked in order; the first rule admitting every tag wins.
pub const WIDENING_RULES: &[WideningRule] = &[
    WideningRule {
        members: &[TypeTag::Varchar, TypeTag::Text],
        result: TypeTag::Text,
    },
    WideningRule {
        members: &[TypeTag::Integer, TypeTag::Bool],
        result: TypeTag::Integer,
    },
    WideningRule {
        members: &[TypeTag::Integer, TypeTag::BigInt],
        result: TypeTag::BigInt,
    },
    WideningRule {
        members: &[TypeTag::Integer, TypeTag::Decimal],
        result: TypeTag::Decimal,
    },
    WideningRule {
        members: &[TypeTag::Integer, TypeTag::Decimal, TypeTag::Double],
        result: TypeTag::Double,
    },
    WideningRule {
        members: &[TypeTag::Datetime, TypeTag::Date, TypeTag::Integer],
        result: TypeTag::Datetime,
    },
];

/// Size maxima gathered across a column's rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeBounds {
    pub decimal_integer_digits: u32,
    pub decimal_fractional_digits: u32,
    /// Largest bucketed varchar hint.
    pub varchar_hint: usize,
    /// Longest display text in characters, used by the text fallback.
    pub text_length: usize,
}

impl SizeBounds {
    pub fn observe(&mut self, classification: &Classification, text_length: usize) {
        match classification.hint {
            SizeHint::None => {}
            SizeHint::Length(len) => self.varchar_hint = self.varchar_hint.max(len),
            SizeHint::Digits {
                integer,
                fractional,
            } => {
                self.decimal_integer_digits = self.decimal_integer_digits.max(integer);
                self.decimal_fractional_digits = self.decimal_fractional_digits.max(fractional);
            }
        }
        self.text_length = self.text_length.max(text_length);
    }
}

/// Widens the tags of one column into a declaration; `None` when there are no tags.
pub fn reconcile(tags: &[TypeTag], bounds: &SizeBounds) -> Option<ColumnTypeSpec> {
    let first = *tags.first()?;
    if tags.iter().all(|tag| *tag == first) {
        return Some(parameterize(first, bounds));
    }
    match WIDENING_RULES.iter().find(|rule| rule.admits(tags)) {
        Some(rule) => {
            debug!("Widening {:?} to {}", distinct(tags), rule.result);
            Some(parameterize(rule.result, bounds))
        }
        None => {
            debug!(
                "No widening rule admits {:?}; using text of length {}",
                distinct(tags),
                bounds.text_length
            );
            Some(text_declaration(bounds.text_length))
        }
    }
}

/// `varchar(length)` up to the proposal limit, `text` beyond it.
pub fn text_declaration(length: usize) -> ColumnTypeSpec {
    if length <= MYSQL_VARCHAR_MAX_PROPOSED_LEN {
        ColumnTypeSpec::varchar(length)
    } else {
        ColumnTypeSpec::bare(TypeName::Text)
    }
}

fn parameterize(tag: TypeTag, bounds: &SizeBounds) -> ColumnTypeSpec {
    match tag {
        TypeTag::Varchar => ColumnTypeSpec::varchar(bounds.varchar_hint),
        TypeTag::Decimal => match decimal_tier(
            bounds.decimal_integer_digits,
            bounds.decimal_fractional_digits,
        ) {
            Some((precision, scale)) => ColumnTypeSpec::decimal(precision, scale),
            None => ColumnTypeSpec::bare(TypeName::Double),
        },
        other => ColumnTypeSpec::bare(other.type_name()),
    }
}

fn distinct(tags: &[TypeTag]) -> Vec<TypeTag> {
    let mut seen = tags.to_vec();
    seen.sort();
    seen.dedup();
    seen
}

/// Accumulates classifications for one column, row by row.
#[derive(Debug, Clone, Default)]
pub struct ColumnObservations {
    counts: BTreeMap<TypeTag, usize>,
    bounds: SizeBounds,
    overflowed: usize,
}

impl ColumnObservations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, value: &RawValue) {
        let Some(classification) = classify(value) else {
            return;
        };
        let text_length = value.as_display().chars().count();
        self.record(&classification, text_length);
    }

    pub fn record(&mut self, classification: &Classification, text_length: usize) {
        *self.counts.entry(classification.tag).or_default() += 1;
        if classification.overflow {
            self.overflowed += 1;
        }
        self.bounds.observe(classification, text_length);
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn non_null(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn overflowed(&self) -> usize {
        self.overflowed
    }

    /// Distinct tags seen so far, in tag order.
    pub fn tags(&self) -> Vec<TypeTag> {
        self.counts.keys().copied().collect()
    }

    pub fn bounds(&self) -> &SizeBounds {
        &self.bounds
    }

    pub fn decide(&self) -> Option<ColumnTypeSpec> {
        reconcile(&self.tags(), &self.bounds)
    }
}
