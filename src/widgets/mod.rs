pub mod controls;
pub mod datatable;
pub mod filter_bar;
