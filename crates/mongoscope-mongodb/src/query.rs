//! Query builder for MongoDB find operations
//!
//! A [`QueryBuilder`] describes one `find` call: filter, sort and limit.
//! [`crate::MongoCatalog`] hands it to the driver through [`QueryBuilder::find_options`],
//! while [`crate::InMemoryCatalog`] evaluates it locally with [`QueryBuilder::apply`],
//! following MongoDB's BSON comparison order so both backends agree on results.

use bson::{Bson, Document as BsonDocument};
use mongodb::options::FindOptions;
use mongoscope_common::{MongoscopeError, Result};
use std::cmp::Ordering;

/// Query builder for MongoDB find operations
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    collection_name: String,
    filter: BsonDocument,
    sort: Option<BsonDocument>,
    limit: Option<i64>,
}

impl QueryBuilder {
    /// Create a new query builder
    pub fn new(collection_name: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            filter: BsonDocument::new(),
            sort: None,
            limit: None,
        }
    }

    /// Set the filter document
    pub fn filter(mut self, filter: BsonDocument) -> Self {
        self.filter = filter;
        self
    }

    /// Set the sort order
    pub fn sort(mut self, sort: BsonDocument) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the maximum number of documents to return
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Get the collection name
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Get the filter document
    pub fn get_filter(&self) -> &BsonDocument {
        &self.filter
    }

    /// Get the sort document
    pub fn get_sort(&self) -> Option<&BsonDocument> {
        self.sort.as_ref()
    }

    /// Get the limit value
    pub fn get_limit(&self) -> Option<i64> {
        self.limit
    }

    /// Driver options carrying sort and limit
    pub fn find_options(&self) -> FindOptions {
        let mut options = FindOptions::default();
        options.sort = self.sort.clone();
        options.limit = self.limit;
        options
    }

    /// Evaluate the query against documents held in memory
    ///
    /// Supports top-level equality, `$eq` and `$in`. Any other operator is a
    /// query error.
    pub fn apply(&self, documents: Vec<BsonDocument>) -> Result<Vec<BsonDocument>> {
        let mut matched = Vec::with_capacity(documents.len());
        for doc in documents {
            if matches_filter(&doc, &self.filter)? {
                matched.push(doc);
            }
        }

        if let Some(sort) = &self.sort {
            let keys = sort_keys(sort)?;
            // Vec::sort_by is stable, so ties keep their natural order
            matched.sort_by(|a, b| {
                for (field, descending) in &keys {
                    let ordering = compare_bson(a.get(field), b.get(field));
                    let ordering = if *descending { ordering.reverse() } else { ordering };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        // Negative limits behave like their absolute value; zero means no limit
        if let Some(limit) = self.limit {
            let limit = limit.unsigned_abs() as usize;
            if limit > 0 {
                matched.truncate(limit);
            }
        }

        Ok(matched)
    }
}

fn sort_keys(sort: &BsonDocument) -> Result<Vec<(String, bool)>> {
    sort.iter()
        .map(|(field, direction)| {
            let descending = match direction {
                Bson::Int32(n) => *n < 0,
                Bson::Int64(n) => *n < 0,
                Bson::Double(n) => *n < 0.0,
                other => {
                    return Err(MongoscopeError::Query(format!(
                        "Unsupported sort direction for '{}': {}",
                        field, other
                    )))
                }
            };
            Ok((field.clone(), descending))
        })
        .collect()
}

fn matches_filter(doc: &BsonDocument, filter: &BsonDocument) -> Result<bool> {
    for (field, condition) in filter {
        let value = doc.get(field);
        let matched = match condition {
            Bson::Document(ops) if ops.keys().next().is_some_and(|k| k.starts_with('$')) => {
                matches_operators(field, value, ops)?
            }
            expected => values_equal(value, Some(expected)),
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_operators(field: &str, value: Option<&Bson>, ops: &BsonDocument) -> Result<bool> {
    for (op, operand) in ops {
        let matched = match op.as_str() {
            "$eq" => values_equal(value, Some(operand)),
            "$in" => in_array(field, value, operand)?,
            other => {
                return Err(MongoscopeError::Query(format!(
                    "Unsupported operator '{}' on field '{}'",
                    other, field
                )))
            }
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn in_array(field: &str, value: Option<&Bson>, operand: &Bson) -> Result<bool> {
    match operand {
        Bson::Array(candidates) => Ok(candidates.iter().any(|c| values_equal(value, Some(c)))),
        _ => Err(MongoscopeError::Query(format!(
            "'$in' on field '{}' requires an array",
            field
        ))),
    }
}

fn values_equal(a: Option<&Bson>, b: Option<&Bson>) -> bool {
    compare_bson(a, b) == Ordering::Equal
}

/// Canonical type rank used by MongoDB when comparing values of different types
///
/// A missing field ranks with null.
fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        Some(Bson::MinKey) => 1,
        None | Some(Bson::Null) | Some(Bson::Undefined) => 2,
        Some(Bson::Int32(_)) | Some(Bson::Int64(_)) | Some(Bson::Double(_)) | Some(Bson::Decimal128(_)) => 3,
        Some(Bson::String(_)) | Some(Bson::Symbol(_)) => 4,
        Some(Bson::Document(_)) => 5,
        Some(Bson::Array(_)) => 6,
        Some(Bson::Binary(_)) => 7,
        Some(Bson::ObjectId(_)) => 8,
        Some(Bson::Boolean(_)) => 9,
        Some(Bson::DateTime(_)) => 10,
        Some(Bson::Timestamp(_)) => 11,
        Some(Bson::RegularExpression(_)) => 12,
        Some(Bson::MaxKey) => 14,
        Some(_) => 13,
    }
}

fn numeric_value(value: &Bson) -> f64 {
    match value {
        Bson::Int32(n) => *n as f64,
        Bson::Int64(n) => *n as f64,
        Bson::Double(n) => *n,
        Bson::Decimal128(d) => d.to_string().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn compare_numbers(a: f64, b: f64) -> Ordering {
    // NaN sorts below every other number
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Compare two (possibly missing) values using MongoDB's BSON comparison order
pub fn compare_bson(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }

    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        _ => return Ordering::Equal,
    };

    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Symbol(x), Bson::Symbol(y)) => x.cmp(y),
        (Bson::String(x), Bson::Symbol(y)) | (Bson::Symbol(x), Bson::String(y)) => x.cmp(y),
        (Bson::Document(x), Bson::Document(y)) => compare_documents(x, y),
        (Bson::Array(x), Bson::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ordering = compare_bson(Some(left), Some(right));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        (Bson::Binary(x), Bson::Binary(y)) => x
            .bytes
            .len()
            .cmp(&y.bytes.len())
            .then_with(|| u8::from(x.subtype).cmp(&u8::from(y.subtype)))
            .then_with(|| x.bytes.cmp(&y.bytes)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.timestamp_millis().cmp(&y.timestamp_millis()),
        (Bson::Timestamp(x), Bson::Timestamp(y)) => {
            x.time.cmp(&y.time).then_with(|| x.increment.cmp(&y.increment))
        }
        (Bson::RegularExpression(x), Bson::RegularExpression(y)) => x
            .pattern
            .cmp(&y.pattern)
            .then_with(|| x.options.cmp(&y.options)),
        _ if type_rank(Some(a)) == 3 => compare_numbers(numeric_value(a), numeric_value(b)),
        _ => Ordering::Equal,
    }
}

fn compare_documents(x: &BsonDocument, y: &BsonDocument) -> Ordering {
    for ((key_x, value_x), (key_y, value_y)) in x.iter().zip(y.iter()) {
        let ordering = type_rank(Some(value_x))
            .cmp(&type_rank(Some(value_y)))
            .then_with(|| key_x.cmp(key_y))
            .then_with(|| compare_bson(Some(value_x), Some(value_y)));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    x.len().cmp(&y.len())
}
