pub mod event_reader;
pub mod stock_writer;
