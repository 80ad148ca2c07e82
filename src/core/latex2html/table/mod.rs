//! Tabular support: column specs, cells, and the grid parser

mod cell;
mod column;
mod parser;

pub use cell::{classify_cell, is_span_directive, parse_span_directive, CellKind, SpanDirective, TableCell};
pub use column::{Alignment, Column, ColumnSpec, MAX_COLUMNS};
pub use parser::{parse_table, split_cells, split_rows, Table, TableGridParser, TableIssue, TableRow};
