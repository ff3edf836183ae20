pub mod dispatcher;
pub mod game;
pub mod model;
pub mod ticker;
