mod search;
mod state;

pub use search::decode_greedy;
pub use state::{DecodeState, EncoderFeed};
