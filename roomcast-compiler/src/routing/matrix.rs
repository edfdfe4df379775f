use std::collections::BTreeMap;

/// Sparse gain matrix of a route device
///
/// Rows are the device's input channels, columns the slave's channels.
/// Cells never set are zero and are not rendered. A cell set to zero is
/// kept, so a muted speaker still renders its `ttable` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingMatrix {
    rows: usize,
    columns: usize,
    cells: BTreeMap<(usize, usize), f64>,
}

impl RoutingMatrix {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: BTreeMap::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Set one cell
    ///
    /// Positions outside the matrix are ignored, the compiler only produces
    /// positions it has already bounds-checked.
    pub fn set(&mut self, row: usize, column: usize, gain: f64) {
        if row >= self.rows || column >= self.columns {
            return;
        }
        self.cells.insert((row, column), gain);
    }

    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.cells.get(&(row, column)).copied().unwrap_or(0.0)
    }

    /// Assigned cells in (row, column) order
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.cells.iter().map(|(&(row, column), &gain)| (row, column, gain))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
