pub mod errors;
pub mod structs;
pub mod utils;


pub use errors::CandleDataError;
pub use structs::{Candle, TimeRange, TimestampMS};
pub use utils::{load_candles, parse_csv_to_candles, parse_json_to_candles, CandleFileFormat};
