pub mod calendar;
pub mod datesearch;
pub mod interpreter;
pub mod proposal;
pub mod slots;
