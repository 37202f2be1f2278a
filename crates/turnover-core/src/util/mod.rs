pub mod money;
pub mod week;
