pub mod detail_formatter;
pub mod filter_builder;
pub mod hydrator;
