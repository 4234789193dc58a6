pub mod donations;
pub mod enums;
