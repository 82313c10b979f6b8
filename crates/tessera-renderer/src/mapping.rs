// Cell buffer mapping: exclusive, scoped write access to the grid.
//
// wgpu storage buffers cannot be mapped by the host, so the grid lives in a
// host-side shadow copy. A `Mapping` takes that copy out of the store while it
// is open and hands it back (marked dirty) when it is finished or dropped; the
// renderer uploads dirty grids right before the compute pass.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use tessera_core::Cell;

use crate::RenderError;

#[derive(Debug, Default)]
struct Grid {
    /// None while a mapping holds the cells.
    cells: Option<Vec<Cell>>,
    cols: u16,
    rows: u16,
    dirty: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CellStore {
    grid: Rc<RefCell<Grid>>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mapped(&self) -> bool {
        let grid = self.grid.borrow();
        grid.cells.is_none() && grid.cols > 0
    }

    /// Fail with `MappingOpen` if a mapping is currently open.
    pub fn ensure_unmapped(&self, operation: &'static str) -> Result<(), RenderError> {
        if self.is_mapped() {
            return Err(RenderError::MappingOpen { operation });
        }
        Ok(())
    }

    /// Replace the grid with `cols * rows` blank cells.
    pub fn reset(&self, cols: u16, rows: u16) -> Result<(), RenderError> {
        self.ensure_unmapped("resize")?;
        let mut grid = self.grid.borrow_mut();
        grid.cells = Some(vec![Cell::default(); cols as usize * rows as usize]);
        grid.cols = cols;
        grid.rows = rows;
        grid.dirty = true;
        Ok(())
    }

    /// Open the grid for writing. Only one mapping may be open at a time.
    pub fn map(&self) -> Result<Mapping, RenderError> {
        let mut grid = self.grid.borrow_mut();
        if grid.cols == 0 {
            return Err(RenderError::NotSized {
                operation: "get_mapping",
            });
        }
        let Some(cells) = grid.cells.take() else {
            return Err(RenderError::MappingOpen {
                operation: "get_mapping",
            });
        };
        Ok(Mapping {
            store: self.clone(),
            cells,
            cols: grid.cols,
            rows: grid.rows,
            released: false,
        })
    }

    /// Hand the grid to `upload` if it changed since the last call.
    pub fn flush(&self, upload: impl FnOnce(&[Cell])) -> bool {
        let mut grid = self.grid.borrow_mut();
        if !grid.dirty {
            return false;
        }
        let Some(cells) = grid.cells.as_deref() else {
            return false;
        };
        upload(cells);
        grid.dirty = false;
        true
    }

    fn give_back(&self, cells: Vec<Cell>) {
        let mut grid = self.grid.borrow_mut();
        grid.cells = Some(cells);
        grid.dirty = true;
    }
}

/// Open write access to the whole grid, `cols * rows` cells in row-major order.
/// Released by `finish` or when dropped, whichever comes first.
#[derive(Debug)]
pub struct Mapping {
    store: CellStore,
    cells: Vec<Cell>,
    cols: u16,
    rows: u16,
    released: bool,
}

impl Mapping {
    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn row_mut(&mut self, row: u16) -> &mut [Cell] {
        let cols = self.cols as usize;
        let start = row as usize * cols;
        &mut self.cells[start..start + cols]
    }

    /// Release the mapping; the next draw picks up the writes.
    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.store.give_back(std::mem::take(&mut self.cells));
    }
}

impl Deref for Mapping {
    type Target = [Cell];

    fn deref(&self) -> &[Cell] {
        &self.cells
    }
}

impl DerefMut for Mapping {
    fn deref_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        self.release();
    }
}
