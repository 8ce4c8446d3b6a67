//! Placement of label blocks on a fixed grid of equally sized, square cells.
//!
//! All coordinates are in millimetres, measured from the top-left corner of the page.
use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementMode {
    /// One identifier per cell, filling each page row by row.
    #[default]
    Cell,
    /// Each identifier fills an entire row with copies of itself.
    ///
    /// This is what earlier versions of the sheet generator printed; only the first column of a
    /// row carries distinct information.
    ReplicateRow,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    pub rows: u32,
    pub cols: u32,
    pub cell_mm: f32,
    pub margin_mm: f32,
    pub page_w_mm: f32,
    pub page_h_mm: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement<'a> {
    pub id: &'a str,
    pub page: usize,
    pub row: u32,
    pub col: u32,
    pub x_mm: f32,
    pub y_mm: f32,
    pub size_mm: f32,
}

impl Grid {
    /// Check that no cell leaves the page.
    ///
    /// Cells are laid out edge to edge from the margin, so they can never overlap each other.
    pub fn validate(&self) -> Result<(), Error> {
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::invalid(format!(
                "grid needs at least one row and column, got {}x{}",
                self.rows, self.cols
            )));
        }

        if !(self.cell_mm > 0.0) {
            return Err(Error::invalid(format!(
                "cell size must be positive, got {} mm",
                self.cell_mm
            )));
        }

        if !(self.margin_mm >= 0.0) {
            return Err(Error::invalid(format!(
                "margin must be non-negative, got {} mm",
                self.margin_mm
            )));
        }

        let used_w = self.margin_mm + self.cols as f32 * self.cell_mm;
        let used_h = self.margin_mm + self.rows as f32 * self.cell_mm;

        if used_w > self.page_w_mm || used_h > self.page_h_mm {
            return Err(Error::invalid(format!(
                "{}x{} cells of {} mm need {used_w}x{used_h} mm but the page is {}x{} mm",
                self.cols, self.rows, self.cell_mm, self.page_w_mm, self.page_h_mm
            )));
        }

        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Identifiers a single page holds.
    pub fn ids_per_page(&self, mode: PlacementMode) -> usize {
        match mode {
            PlacementMode::Cell => self.capacity(),
            PlacementMode::ReplicateRow => self.rows as usize,
        }
    }

    pub fn page_count(&self, ids: usize, mode: PlacementMode) -> usize {
        ids.div_ceil(self.ids_per_page(mode).max(1))
    }

    fn cell<'a>(&self, id: &'a str, page: usize, row: u32, col: u32) -> Placement<'a> {
        Placement {
            id,
            page,
            row,
            col,
            x_mm: self.margin_mm + col as f32 * self.cell_mm,
            y_mm: self.margin_mm + row as f32 * self.cell_mm,
            size_mm: self.cell_mm,
        }
    }

    /// All placements for `ids`, in generation order and page by page.
    pub fn placements<'a>(&self, ids: &'a [String], mode: PlacementMode) -> Vec<Placement<'a>> {
        let per_page = self.ids_per_page(mode).max(1);
        let mut placements = vec![];

        for (page, page_ids) in ids.chunks(per_page).enumerate() {
            for (slot, id) in page_ids.iter().enumerate() {
                match mode {
                    PlacementMode::Cell => {
                        let row = (slot / self.cols as usize) as u32;
                        let col = (slot % self.cols as usize) as u32;
                        placements.push(self.cell(id, page, row, col));
                    }
                    PlacementMode::ReplicateRow => {
                        for col in 0..self.cols {
                            placements.push(self.cell(id, page, slot as u32, col));
                        }
                    }
                }
            }
        }

        placements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::generate_ids;
    use crate::ErrorKind;

    fn a4() -> Grid {
        Grid {
            rows: 7,
            cols: 5,
            cell_mm: 40.0,
            margin_mm: 5.0,
            page_w_mm: 210.0,
            page_h_mm: 297.0,
        }
    }

    #[test]
    fn replicated_rows_match_legacy_output() {
        let ids = generate_ids(49).unwrap();
        let grid = a4();
        let placements = grid.placements(&ids, PlacementMode::ReplicateRow);

        assert_eq!(grid.page_count(ids.len(), PlacementMode::ReplicateRow), 7);
        assert_eq!(placements.len(), 245);
        assert_eq!(placements.last().unwrap().page, 6);

        let first_row: Vec<_> = placements.iter().take(5).collect();
        assert!(first_row.iter().all(|p| p.id == "b000001" && p.row == 0));
        assert_eq!(placements[5].id, "b000002");
        assert_eq!(placements[5].row, 1);
        assert_eq!(placements[7 * 5].id, "b000008");
        assert_eq!(placements[7 * 5].row, 0);
        assert_eq!(placements[7 * 5].page, 1);
    }

    #[test]
    fn cells_hold_one_identifier_each() {
        let ids = generate_ids(49).unwrap();
        let grid = a4();
        let placements = grid.placements(&ids, PlacementMode::Cell);

        assert_eq!(grid.page_count(ids.len(), PlacementMode::Cell), 2);
        assert_eq!(placements.len(), 49);

        for (placement, id) in placements.iter().zip(&ids) {
            assert_eq!(placement.id, id);
        }

        assert_eq!((placements[4].row, placements[4].col), (0, 4));
        assert_eq!((placements[5].row, placements[5].col), (1, 0));
        assert_eq!(placements[34].page, 0);
        assert_eq!(placements[35].page, 1);
        assert_eq!((placements[35].row, placements[35].col), (0, 0));
    }

    #[test]
    fn cells_stay_on_the_page() {
        let ids = generate_ids(35).unwrap();
        let grid = a4();

        for p in grid.placements(&ids, PlacementMode::Cell) {
            assert!(p.x_mm >= grid.margin_mm && p.y_mm >= grid.margin_mm);
            assert!(p.x_mm + p.size_mm <= grid.page_w_mm);
            assert!(p.y_mm + p.size_mm <= grid.page_h_mm);
        }

        let last = grid.placements(&ids, PlacementMode::Cell).pop().unwrap();
        assert_eq!((last.x_mm, last.y_mm), (165.0, 245.0));
    }

    #[test]
    fn cells_do_not_overlap() {
        let ids = generate_ids(35).unwrap();
        let placements = a4().placements(&ids, PlacementMode::Cell);

        for (i, a) in placements.iter().enumerate() {
            for b in &placements[i + 1..] {
                let apart = a.x_mm + a.size_mm <= b.x_mm
                    || b.x_mm + b.size_mm <= a.x_mm
                    || a.y_mm + a.size_mm <= b.y_mm
                    || b.y_mm + b.size_mm <= a.y_mm;
                assert!(apart, "{} overlaps {}", a.id, b.id);
            }
        }
    }

    #[test]
    fn oversized_grid_fails_validation() {
        a4().validate().unwrap();

        let grid = Grid { rows: 8, ..a4() };
        assert_eq!(grid.validate().unwrap_err().kind(), ErrorKind::InvalidArgument);

        let grid = Grid { cols: 0, ..a4() };
        assert_eq!(grid.validate().unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn margin_may_be_zero_but_not_negative() {
        Grid { margin_mm: 0.0, ..a4() }.validate().unwrap();

        let err = Grid { margin_mm: -1.0, ..a4() }.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("non-negative"));

        let err = Grid { cell_mm: 0.0, ..a4() }.validate().unwrap_err();
        assert!(err.to_string().contains("cell size must be positive"));
    }

    #[test]
    fn no_identifiers_no_pages() {
        let grid = a4();
        assert_eq!(grid.page_count(0, PlacementMode::Cell), 0);
        assert!(grid.placements(&[], PlacementMode::Cell).is_empty());
    }
}
