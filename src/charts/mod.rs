//! Charts module - Chart rendering

mod renderer;

pub use renderer::{
    series_color, slot_label, ChartError, ChartRenderer, ChartSettings, ADMISSIONS_FILE,
    OUTCOME_BY_AGE_FILE, PALETTE, SATISFACTION_FILE,
};
