mod confirm_dialog;
mod table;
mod text_field;

pub use confirm_dialog::{ConfirmDialog, ConfirmEvent};
pub use table::{ColumnDef, Table, TableRow};
pub use text_field::TextField;
