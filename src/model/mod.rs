pub mod character;
pub mod event_result;
pub mod game_state;
pub mod message;
