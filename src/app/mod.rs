pub mod dispatch;
pub mod terminal;
