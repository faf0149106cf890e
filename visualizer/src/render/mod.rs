pub mod surface;
pub mod grid;
pub mod legend;
pub mod table;

pub use grid::{draw_grid, Grid};
pub use legend::{draw_legend, Legend};
pub use surface::Surface;
pub use table::{render_table, Cell, CellMode, Record, Table, TableSpec};
