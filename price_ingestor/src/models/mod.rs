pub mod observation;
pub mod price_record;
pub mod time_series;
pub mod window;
