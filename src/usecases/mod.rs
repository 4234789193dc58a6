pub mod donations;
