//! Compact-Table filtering of a table constraint.
//!
//! For every (scope position, value) pair the constraint keeps the bitset of rows in which the
//! variable at that position takes that value. The rows which are still valid are the
//! intersection, over all positions, of the union of the bitsets of the live values; a value is
//! supported iff its bitset intersects the valid rows. This achieves domain consistency with
//! bitwise operations proportional to the number of live values and bitset words.
//!
//! # Bibliography
//! \[1\] J. Demeulenaere, R. Hartert, C. Lecoutre, G. Perez, L. Perron, J.-C. Régin, and
//! P. Schaus, ‘Compact-table: efficiently filtering table constraints with reversible sparse
//! bit-sets’, in Principles and Practice of Constraint Programming (CP), 2016, pp. 207–223.
use fixedbitset::FixedBitSet;
use itertools::Itertools;

use super::validate_scope;
use super::Constraint;
use crate::basic_types::Inconsistency;
use crate::basic_types::ModelError;
use crate::basic_types::PropagationStatus;
use crate::engine::BeliefContext;
use crate::engine::DomainEvent;
use crate::engine::PostContext;
use crate::engine::PropagationContext;
use crate::engine::ReadDomains;
use crate::engine::VariableId;

/// Creates the constraint that the tuple of `scope` equals one of the `rows`.
///
/// The weighted counting of the belief update is exact if no row occurs twice.
pub fn table(
    scope: impl IntoIterator<Item = VariableId>,
    rows: Vec<Vec<i32>>,
) -> Result<CompactTable, ModelError> {
    let scope: Box<[VariableId]> = scope.into_iter().collect();
    validate_scope(&scope)?;

    if let Some((row, found)) = rows
        .iter()
        .map(Vec::len)
        .enumerate()
        .find(|&(_, len)| len != scope.len())
    {
        return Err(ModelError::MismatchedArity {
            row,
            expected: scope.len(),
            found,
        });
    }

    let columns: Box<[ColumnSupports]> = (0..scope.len())
        .map(|position| ColumnSupports::new(&rows, position))
        .collect();
    let unique_rows = rows.iter().all_unique();
    let sums = columns
        .iter()
        .map(|column| vec![0.0; column.values.len()].into_boxed_slice())
        .collect();

    Ok(CompactTable {
        columns,
        supported: FixedBitSet::with_capacity(rows.len()),
        union: FixedBitSet::with_capacity(rows.len()),
        values: vec![],
        prefix: vec![1.0; scope.len() + 1].into_boxed_slice(),
        suffix: vec![1.0; scope.len() + 1].into_boxed_slice(),
        sums,
        scope,
        rows: rows.into_iter().map(Vec::into_boxed_slice).collect(),
        unique_rows,
    })
}

/// The rows supporting each value of one column of the table.
#[derive(Debug, Clone)]
struct ColumnSupports {
    /// The distinct values of the column, sorted.
    values: Box<[i32]>,
    /// `supports[i]` holds the rows in which the column takes `values[i]`.
    supports: Box<[FixedBitSet]>,
}

impl ColumnSupports {
    fn new(rows: &[Vec<i32>], position: usize) -> ColumnSupports {
        let values: Box<[i32]> = rows.iter().map(|row| row[position]).sorted().dedup().collect();

        let mut supports =
            vec![FixedBitSet::with_capacity(rows.len()); values.len()].into_boxed_slice();
        for (index, row) in rows.iter().enumerate() {
            if let Ok(value_index) = values.binary_search(&row[position]) {
                supports[value_index].insert(index);
            }
        }

        ColumnSupports { values, supports }
    }

    fn index_of(&self, value: i32) -> Option<usize> {
        self.values.binary_search(&value).ok()
    }

    /// The rows in which the column takes `value`; `None` if there are none.
    fn get(&self, value: i32) -> Option<&FixedBitSet> {
        self.index_of(value).map(|index| &self.supports[index])
    }
}

#[derive(Debug, Clone)]
pub struct CompactTable {
    scope: Box<[VariableId]>,
    rows: Box<[Box<[i32]>]>,
    columns: Box<[ColumnSupports]>,
    unique_rows: bool,

    // Scratch space, recomputed on every call.
    supported: FixedBitSet,
    union: FixedBitSet,
    values: Vec<i32>,
    prefix: Box<[f64]>,
    suffix: Box<[f64]>,
    sums: Box<[Box<[f64]>]>,
}

impl CompactTable {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Computes the rows whose values are all live.
    fn compute_supported_rows(&mut self, domains: &impl ReadDomains) {
        self.supported.insert_range(..);

        for (position, &variable) in self.scope.iter().enumerate() {
            self.values.resize(domains.size(variable), 0);
            let size = domains.fill_array(variable, &mut self.values);

            self.union.clear();
            for &value in &self.values[..size] {
                if let Some(support) = self.columns[position].get(value) {
                    self.union.union_with(support);
                }
            }

            self.supported.intersect_with(&self.union);
        }
    }
}

impl Constraint for CompactTable {
    fn name(&self) -> &str {
        "Table"
    }

    fn scope(&self) -> &[VariableId] {
        &self.scope
    }

    fn post(&mut self, mut context: PostContext<'_>) {
        for &variable in self.scope.iter() {
            context.register(variable, DomainEvent::Change);
        }
    }

    fn propagate(&mut self, mut context: PropagationContext<'_>) -> PropagationStatus {
        self.compute_supported_rows(&context);
        if self.supported.ones().next().is_none() {
            return Err(Inconsistency::Constraint(context.constraint_id()));
        }

        for (position, &variable) in self.scope.iter().enumerate() {
            self.values.resize(context.size(variable), 0);
            let size = context.fill_array(variable, &mut self.values);

            for &value in &self.values[..size] {
                let is_supported = self.columns[position]
                    .get(value)
                    .is_some_and(|support| !support.is_disjoint(&self.supported));
                if !is_supported {
                    context.remove(variable, value)?;
                }
            }
        }

        Ok(())
    }

    /// The local belief of a value is the sum, over the valid rows containing it, of the product
    /// of the outside beliefs of the other values in the row.
    fn update_belief(&mut self, mut context: BeliefContext<'_>) {
        self.compute_supported_rows(&context);

        let arity = self.scope.len();
        self.sums.iter_mut().for_each(|sums| sums.fill(0.0));

        for row in self.supported.ones().map(|index| &self.rows[index]) {
            for position in 0..arity {
                self.prefix[position + 1] =
                    self.prefix[position] * context.outside_belief(position, row[position]);
            }
            for position in (0..arity).rev() {
                self.suffix[position] =
                    self.suffix[position + 1] * context.outside_belief(position, row[position]);
            }
            for position in 0..arity {
                if let Some(index) = self.columns[position].index_of(row[position]) {
                    self.sums[position][index] += self.prefix[position] * self.suffix[position + 1];
                }
            }
        }

        for (position, column) in self.columns.iter().enumerate() {
            for (&value, &sum) in column.values.iter().zip(self.sums[position].iter()) {
                if sum > 0.0 {
                    context.set_local_belief(position, value, sum);
                }
            }
        }
    }

    fn weighted_counting(&self) -> bool {
        self.unique_rows
    }
}
