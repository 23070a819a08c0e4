pub mod structuring;
