pub mod control;
pub mod event;
pub mod stage;
