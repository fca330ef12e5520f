pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{banner, error, header, info, muted, section, success, summary_row, warn};
pub use progress::Spinner;
pub use table::{adapter_table, TableBuilder};
pub use theme::{theme, Theme};
