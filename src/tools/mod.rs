pub mod overwrite_cells;
