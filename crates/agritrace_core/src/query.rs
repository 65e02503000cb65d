//! Predicate queries over the full keyspace.
//!
//! The ledger has no secondary indexes. Every query beyond a point lookup is
//! a full scan: entries outside the prefix are skipped, entries of another
//! kind or that fail to decode are skipped, the predicate filters the rest
//! and an optional comparator imposes a stable order.

use crate::error::CoreResult;
use crate::invocation::Invocation;
use agritrace_codec::{decode_record, Record};
use std::cmp::Ordering;
use std::marker::PhantomData;

type Predicate<'q, T> = Box<dyn Fn(&T) -> bool + 'q>;
type Comparator<'q, T> = Box<dyn Fn(&T, &T) -> Ordering + 'q>;

/// A query for records of type `T`.
///
/// # Example
///
/// ```rust
/// use agritrace_core::query::find;
/// use agritrace_core::record::{Product, ProductStatus};
/// use agritrace_core::Ledger;
///
/// let ledger = Ledger::in_memory();
/// let on_sale = ledger
///     .query(|inv| {
///         find::<Product>()
///             .filter(|p| p.status == ProductStatus::OnSale)
///             .order_by(|a, b| a.id.cmp(&b.id))
///             .run(inv)
///     })
///     .unwrap();
/// assert!(on_sale.is_empty());
/// ```
#[must_use = "queries do nothing until run"]
pub struct Query<'q, T> {
    prefix: Option<&'q str>,
    predicates: Vec<Predicate<'q, T>>,
    order: Option<Comparator<'q, T>>,
    _marker: PhantomData<fn() -> T>,
}

/// Starts a query for records of type `T`.
pub fn find<'q, T: Record>() -> Query<'q, T> {
    Query {
        prefix: None,
        predicates: Vec::new(),
        order: None,
        _marker: PhantomData,
    }
}

impl<'q, T: Record> Query<'q, T> {
    /// Only considers keys starting with `prefix`.
    pub fn with_prefix(mut self, prefix: &'q str) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Keeps records for which `predicate` holds. Filters combine with AND.
    pub fn filter(mut self, predicate: impl Fn(&T) -> bool + 'q) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// Sorts the result with a stable sort.
    pub fn order_by(mut self, compare: impl Fn(&T, &T) -> Ordering + 'q) -> Self {
        self.order = Some(Box::new(compare));
        self
    }

    /// Runs the query. No matches yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::StoreUnavailable`] if the scan fails.
    /// Decode failures are never errors here.
    pub fn run(self, inv: &mut Invocation<'_>) -> CoreResult<Vec<T>> {
        let entries = inv.scan("", "")?;
        let mut matches = Vec::new();
        let mut skipped = 0usize;

        for (key, bytes) in entries {
            if let Some(prefix) = self.prefix {
                if !key.starts_with(prefix) {
                    continue;
                }
            }
            let record: T = match decode_record(&bytes) {
                Ok(record) => record,
                Err(err) => {
                    skipped += 1;
                    tracing::trace!(%key, kind = T::KIND, error = %err, "skipping entry");
                    continue;
                }
            };
            if self.predicates.iter().all(|predicate| predicate(&record)) {
                matches.push(record);
            }
        }

        if let Some(compare) = &self.order {
            matches.sort_by(|a, b| compare(a, b));
        }

        tracing::debug!(
            kind = T::KIND,
            prefix = self.prefix.unwrap_or(""),
            matched = matches.len(),
            skipped,
            "query finished"
        );
        Ok(matches)
    }

    /// Runs the query and returns its first result.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::StoreUnavailable`] if the scan fails.
    pub fn first(self, inv: &mut Invocation<'_>) -> CoreResult<Option<T>> {
        Ok(self.run(inv)?.into_iter().next())
    }
}
